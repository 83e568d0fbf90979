//! Public host-facing contracts for embedding the machine core.
//!
//! The host owns rendering, randomness generation, keypad scanning, and
//! the clock; the core consumes them through the small contracts defined
//! here and must be driven one call at a time (the core is single-threaded
//! and non-reentrant).

use crate::fault::FaultClass;
use crate::state::registers::Register;

/// Number of keys on the hexadecimal input device.
pub const KEY_COUNT: u8 = 16;

/// Validated key code of the 16-key input device (`0x0..=0xF`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Key(u8);

impl Key {
    /// Validates a raw key code.
    #[must_use]
    pub const fn new(code: u8) -> Option<Self> {
        if code < KEY_COUNT {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Returns the raw key code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }
}

/// Display collaborator consumed by the draw and clear-display opcodes.
///
/// When no implementation is injected the core falls back to its internal
/// framebuffer; both paths must be observably equivalent for identical
/// sequences of draw calls.
pub trait DisplayDevice {
    /// Resets all pixels to unset.
    fn clear(&mut self);

    /// XORs `value` into the pixel at `(x, y)` and reports whether a
    /// collision occurred (the pixel transitioned from set to unset).
    /// Wrapping or clipping of out-of-range coordinates is the
    /// implementation's decision.
    fn draw_pixel(&mut self, x: u8, y: u8, value: bool) -> bool;
}

/// Randomness collaborator consumed by the masked random-store opcode.
pub trait RandomSource {
    /// Returns a uniformly distributed byte in `0..=255`.
    fn next_byte(&mut self) -> u8;
}

/// Default [`RandomSource`] backed by the thread-local generator of the
/// `rand` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_byte(&mut self) -> u8 {
        rand::random()
    }
}

/// Top-level immutable configuration for a machine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Copies the builtin glyph table into the reserved region at
    /// construction. Hosts providing their own system data below `0x200`
    /// turn this off and pre-populate memory themselves.
    pub preload_font: bool,
    /// Enables deterministic trace callback dispatch at step boundaries.
    pub tracing_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            preload_font: true,
            tracing_enabled: false,
        }
    }
}

/// Outcome of one single-step operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The fetched instruction executed and the machine can step again.
    Retired,
    /// The machine is suspended on the blocking key wait; stepping will
    /// make no progress until a key event arrives.
    AwaitingKey,
}

/// Outcome of a host keypress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypressOutcome {
    /// The key was recorded as the most recent key; no wait was pending.
    Recorded,
    /// The key additionally resolved a pending key wait into `target` and
    /// execution resumed.
    Resumed {
        /// Register the key code was stored into.
        target: Register,
    },
}

/// Deterministic trace events emitted at step boundaries when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Pre-execute event for instruction fetch/decode.
    InstructionStart {
        /// Program counter used for this fetch.
        pc: u16,
        /// Raw 16-bit instruction word.
        word: u16,
    },
    /// Post-execute event after the handler committed its effects.
    InstructionRetired {
        /// Program counter after the instruction.
        pc: u16,
    },
    /// Fault emission event.
    FaultRaised {
        /// Program counter active when the fault was observed.
        pc: u16,
        /// Diagnostics class of the raised fault.
        class: FaultClass,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Collaborator bundle handed to the stepping operation.
///
/// The display and trace sink are optional; randomness is mandatory
/// because the masked random-store opcode cannot execute without it.
pub struct Peripherals<'a> {
    /// Display collaborator; `None` selects the internal framebuffer.
    pub display: Option<&'a mut dyn DisplayDevice>,
    /// Randomness collaborator.
    pub random: &'a mut dyn RandomSource,
    /// Trace sink, consulted only when tracing is enabled.
    pub trace: Option<&'a mut dyn TraceSink>,
}

impl<'a> Peripherals<'a> {
    /// Creates a bundle with only the mandatory randomness collaborator.
    #[must_use]
    pub fn with_random(random: &'a mut dyn RandomSource) -> Self {
        Self {
            display: None,
            random,
            trace: None,
        }
    }
}
