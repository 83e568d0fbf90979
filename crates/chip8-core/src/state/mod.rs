//! Architectural machine state model.

/// Register file model and constants.
pub mod registers;
pub use registers::{Register, FLAG_REGISTER, GENERAL_REGISTER_COUNT};

/// Execution-progress state machine for the key-wait protocol.
pub mod run_state;
pub use run_state::RunState;

use crate::api::{CoreConfig, Key};
use crate::fault::Fault;
use crate::framebuffer::FrameBuffer;
use crate::memory::{AddressSpace, ADDRESS_SPACE_BYTES, PROGRAM_START};
use crate::timers::{self, SoundPulse};

/// Capacity of the bounded return-address stack.
pub const CALL_STACK_DEPTH: usize = 16;

/// Complete mutable machine state, exclusively owned by whichever
/// component embeds the core.
///
/// A `MachineState` is created once at program start, mutated only through
/// the core's own operations, and never shared; the host must serialize
/// calls into it (the core is single-threaded and non-reentrant).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineState {
    /// Flat 4 KiB memory image.
    pub memory: AddressSpace,
    /// Sixteen general-purpose registers.
    ///
    /// Cells are wider than 8 bits: the carry-producing arithmetic opcodes
    /// store their raw, unclamped results, and programs observe them.
    /// Values are masked to their low byte only where they cross an 8-bit
    /// boundary (memory cells, timers).
    pub registers: [i32; GENERAL_REGISTER_COUNT],
    /// 16-bit address register used by the memory-block and sprite opcodes.
    pub index_register: u16,
    /// Address of the next instruction to fetch; starts at `0x200`.
    pub program_counter: u16,
    /// 8-bit countdown timer decremented by the host clock.
    pub delay_timer: u8,
    /// 8-bit countdown timer decremented by the host clock; its transition
    /// through 1 is the host's tone cue.
    pub sound_timer: u8,
    /// Bounded return-address stack.
    pub stack: [u16; CALL_STACK_DEPTH],
    /// Index of the next free stack slot (`0..=16`).
    pub stack_pointer: usize,
    /// Most recently reported key, or `None` when no key has been seen.
    pub current_key: Option<Key>,
    /// Running / awaiting-key execution state.
    pub run_state: RunState,
    /// Internal framebuffer, the fallback draw target.
    pub framebuffer: FrameBuffer,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::with_config(&CoreConfig::default())
    }
}

impl MachineState {
    /// Creates a machine in its boot state: all-zero except the program
    /// counter at `0x200`, with the glyph table preloaded when the
    /// configuration asks for it.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        let mut memory = AddressSpace::new();
        if config.preload_font {
            memory.load_font();
        }

        Self {
            memory,
            registers: [0; GENERAL_REGISTER_COUNT],
            index_register: 0,
            program_counter: PROGRAM_START,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; CALL_STACK_DEPTH],
            stack_pointer: 0,
            current_key: None,
            run_state: RunState::Running,
            framebuffer: FrameBuffer::new(),
        }
    }

    /// Copies a program image into memory starting at `0x200`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ProgramTooLarge`] when the image does not fit.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), Fault> {
        self.memory.load_program(image)
    }

    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> i32 {
        self.registers[reg.index()]
    }

    /// Writes a general-purpose register.
    pub const fn set_gpr(&mut self, reg: Register, value: i32) {
        self.registers[reg.index()] = value;
    }

    /// Writes the carry/borrow/collision convention value (1 or 0) into
    /// the flag register. The flag register stays an ordinary register;
    /// this is merely the side-channel write several opcodes perform.
    pub fn set_flag_register(&mut self, raised: bool) {
        self.registers[FLAG_REGISTER.index()] = i32::from(raised);
    }

    /// Fetches the big-endian instruction word at the program counter.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::FetchOutOfBounds`] when the word would not fully
    /// fit in memory (`pc > 4094`).
    pub fn fetch_word(&self) -> Result<u16, Fault> {
        let pc = self.program_counter;
        if usize::from(pc) > ADDRESS_SPACE_BYTES - 2 {
            return Err(Fault::FetchOutOfBounds { pc });
        }
        self.memory.read_word(pc)
    }

    /// Saves a return address on the bounded stack.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::StackOverflow`] when all 16 slots are occupied.
    pub const fn push_return_address(&mut self, pc: u16) -> Result<(), Fault> {
        if self.stack_pointer >= CALL_STACK_DEPTH {
            return Err(Fault::StackOverflow {
                depth: self.stack_pointer,
            });
        }
        self.stack[self.stack_pointer] = pc;
        self.stack_pointer += 1;
        Ok(())
    }

    /// Pops the most recently saved return address.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::StackUnderflow`] when no address is saved.
    pub const fn pop_return_address(&mut self) -> Result<u16, Fault> {
        if self.stack_pointer == 0 {
            return Err(Fault::StackUnderflow);
        }
        self.stack_pointer -= 1;
        Ok(self.stack[self.stack_pointer])
    }

    /// Applies one delay-timer tick from the host clock.
    pub const fn tick_delay(&mut self) {
        self.delay_timer = timers::decremented(self.delay_timer);
    }

    /// Applies one sound-timer tick from the host clock, reporting the
    /// tone boundary.
    pub const fn tick_sound(&mut self) -> SoundPulse {
        let (value, pulse) = timers::sound_tick(self.sound_timer);
        self.sound_timer = value;
        pulse
    }
}
