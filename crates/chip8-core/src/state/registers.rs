/// Number of architecturally visible general-purpose registers (`V0..=VF`).
pub const GENERAL_REGISTER_COUNT: usize = 16;

/// The register conventionally overwritten as the carry/borrow/collision
/// flag by several opcodes.
///
/// It stays an ordinary addressable register: programs may read and write
/// it as data between flag-producing instructions, so there is no separate
/// boolean flag anywhere in the machine state.
pub const FLAG_REGISTER: Register = Register::VF;

/// Architecturally visible general-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    V0 = 0x0,
    V1 = 0x1,
    V2 = 0x2,
    V3 = 0x3,
    V4 = 0x4,
    V5 = 0x5,
    V6 = 0x6,
    V7 = 0x7,
    V8 = 0x8,
    V9 = 0x9,
    VA = 0xA,
    VB = 0xB,
    VC = 0xC,
    VD = 0xD,
    VE = 0xE,
    VF = 0xF,
}

impl Register {
    /// Ordered list of all architectural general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::V0,
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V7,
        Self::V8,
        Self::V9,
        Self::VA,
        Self::VB,
        Self::VC,
        Self::VD,
        Self::VE,
        Self::VF,
    ];

    /// Returns the array index for this register (`0..=15`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a 4-bit register field into an architectural register.
    #[must_use]
    pub const fn from_u4(bits: u8) -> Option<Self> {
        match bits {
            0x0 => Some(Self::V0),
            0x1 => Some(Self::V1),
            0x2 => Some(Self::V2),
            0x3 => Some(Self::V3),
            0x4 => Some(Self::V4),
            0x5 => Some(Self::V5),
            0x6 => Some(Self::V6),
            0x7 => Some(Self::V7),
            0x8 => Some(Self::V8),
            0x9 => Some(Self::V9),
            0xA => Some(Self::VA),
            0xB => Some(Self::VB),
            0xC => Some(Self::VC),
            0xD => Some(Self::VD),
            0xE => Some(Self::VE),
            0xF => Some(Self::VF),
            _ => None,
        }
    }
}
