//! CHIP-8 virtual machine core.
//!
//! The crate virtualizes the classic fixed-instruction-set machine: 16
//! general registers, 4 KiB of memory, a bounded call stack, two countdown
//! timers, a 64×32 monochrome framebuffer, and a 16-key input device. It
//! contains exactly the CPU core — instruction encoding, decode dispatch,
//! per-opcode execution semantics, and the suspend/resume protocol for
//! blocking keyboard input. Rendering, storage, the random-number
//! algorithm, and the host event loop stay behind the contracts in
//! [`api`].

/// Pure bit-field readers over instruction words.
pub mod encoding;
pub use encoding::OpcodeClass;

/// Instruction decode pipeline over the closed instruction set.
pub mod decoder;
pub use decoder::{Decoder, Instruction};

/// Fault taxonomy for decode, stack, and memory violations.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Architectural machine state model.
pub mod state;
pub use state::{
    MachineState, Register, RunState, CALL_STACK_DEPTH, FLAG_REGISTER, GENERAL_REGISTER_COUNT,
};

/// 4 KiB memory model and fixed region map.
pub mod memory;
pub use memory::{
    decode_memory_region, AddressSpace, MemoryRegion, ADDRESS_SPACE_BYTES, FONT_GLYPHS,
    FONT_GLYPH_BYTES, FONT_START, PROGRAM_END, PROGRAM_START, RESERVED_END, RESERVED_START,
};

/// Monochrome XOR framebuffer.
pub mod framebuffer;
pub use framebuffer::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_PIXELS, DISPLAY_WIDTH};

/// Countdown timer semantics.
pub mod timers;
pub use timers::SoundPulse;

/// Public host-facing API contracts.
pub mod api;
pub use api::{
    CoreConfig, DisplayDevice, Key, KeypressOutcome, Peripherals, RandomSource, StepOutcome,
    ThreadRandom, TraceEvent, TraceSink, KEY_COUNT,
};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{decimal_digits, execute_instruction, key_pressed, step_one};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
