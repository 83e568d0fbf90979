use thiserror::Error;

/// Fault classes used for diagnostics aggregation and host policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction encoding.
    Decode,
    /// Call stack depth violation.
    Stack,
    /// Memory or fetch bounds violation.
    Memory,
}

/// Stable fault taxonomy for the machine core.
///
/// Every fault is local-fatal: it aborts the current single-step operation
/// and is surfaced to the host, which decides whether to halt the whole
/// machine or restart. Nothing is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// A fetched word matched no entry in the documented instruction set.
    #[error("unrecognized instruction word {word:#06x}")]
    UnrecognizedInstruction {
        /// The offending 16-bit instruction word.
        word: u16,
    },
    /// A subroutine call would exceed the bounded return stack.
    #[error("call stack overflow at depth {depth}")]
    StackOverflow {
        /// Stack depth at the time of the failed push.
        depth: usize,
    },
    /// A return was executed with no saved address on the stack.
    #[error("return from subroutine with empty call stack")]
    StackUnderflow,
    /// An instruction fetch would cross the end of memory.
    #[error("instruction fetch out of bounds at {pc:#06x}")]
    FetchOutOfBounds {
        /// Program counter of the failed fetch.
        pc: u16,
    },
    /// A data access targeted an address outside the 4 KiB space.
    #[error("memory access out of bounds at {addr:#06x}")]
    MemoryOutOfBounds {
        /// The offending address.
        addr: u16,
    },
    /// A program image does not fit between 0x200 and the end of memory.
    #[error("program image of {len} bytes does not fit in memory")]
    ProgramTooLarge {
        /// Byte length of the rejected image.
        len: usize,
    },
}

impl Fault {
    /// Returns the diagnostics class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::UnrecognizedInstruction { .. } => FaultClass::Decode,
            Self::StackOverflow { .. } | Self::StackUnderflow => FaultClass::Stack,
            Self::FetchOutOfBounds { .. }
            | Self::MemoryOutOfBounds { .. }
            | Self::ProgramTooLarge { .. } => FaultClass::Memory,
        }
    }
}
