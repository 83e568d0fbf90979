//! Shared execution helpers: sprite blitting and decimal decomposition.

use crate::api::DisplayDevice;
use crate::fault::Fault;
use crate::state::MachineState;

/// Decomposes a register value into its hundreds, tens, and ones digits
/// by floor division and modulo (never string formatting).
///
/// Register cells can hold raw unclamped results, so the domain is wider
/// than `0..=255`: negative values decompose to zero digits and a
/// hundreds count too large for a byte saturates.
#[must_use]
pub fn decimal_digits(value: i32) -> [u8; 3] {
    let value = value.max(0);
    let hundreds = u8::try_from(value / 100).unwrap_or(u8::MAX);
    let tens = u8::try_from(value / 10 % 10).unwrap_or(0);
    let ones = u8::try_from(value % 10).unwrap_or(0);
    [hundreds, tens, ones]
}

/// XORs an `height`-row sprite read from the index register onto the draw
/// target at `(origin_x, origin_y)`, most significant bit leftmost.
///
/// Returns whether any pixel collided. The collision result is cumulative
/// across the whole draw: once any pixel transitions from set to unset it
/// stays reported for the rest of the instruction.
///
/// The injected display applies its own wrap/clip policy; the internal
/// framebuffer wraps coordinates modulo the grid dimensions.
pub(crate) fn blit_sprite(
    state: &mut MachineState,
    mut display: Option<&mut (dyn DisplayDevice + '_)>,
    origin_x: u8,
    origin_y: u8,
    height: u8,
) -> Result<bool, Fault> {
    let mut collided = false;

    for row in 0..height {
        let addr = state.index_register.wrapping_add(u16::from(row));
        let pattern = state.memory.read_byte(addr)?;

        for column in 0..8u8 {
            let value = (pattern >> (7 - column)) & 1 == 1;
            let x = origin_x.wrapping_add(column);
            let y = origin_y.wrapping_add(row);

            let hit = if let Some(target) = display.as_deref_mut() {
                target.draw_pixel(x, y, value)
            } else {
                state.framebuffer.xor_pixel(x, y, value)
            };
            collided = collided || hit;
        }
    }

    Ok(collided)
}
