use crate::state::registers::Register;

/// Execution-progress state machine for the blocking key-wait protocol.
///
/// The key-wait opcode is the only suspension point in the core: it moves
/// the machine to [`RunState::AwaitingKey`] without advancing the program
/// counter, and only an external key event moves it back. The suspension
/// is cooperative; no thread is ever blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// Halted until a key event arrives; the key code lands in the
    /// recorded target register when the wait resolves.
    AwaitingKey(Register),
}

impl RunState {
    /// Returns `true` while the machine refuses to execute instructions.
    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Self::AwaitingKey(_))
    }

    /// Returns the register a pending key wait will resolve into, if any.
    #[must_use]
    pub const fn pending_target(self) -> Option<Register> {
        match self {
            Self::AwaitingKey(target) => Some(target),
            Self::Running => None,
        }
    }
}
