//! Fixed architectural memory-region map and decoding helpers.

/// Inclusive start address of the reserved system/font region.
pub const RESERVED_START: u16 = 0x0000;
/// Inclusive end address of the reserved system/font region.
pub const RESERVED_END: u16 = 0x01FF;
/// Inclusive start address of the program region; the program counter
/// starts here and program images are copied in from here.
pub const PROGRAM_START: u16 = 0x0200;
/// Inclusive end address of the program region.
pub const PROGRAM_END: u16 = 0x0FFF;

/// Base address of the builtin hexadecimal glyph table.
pub const FONT_START: u16 = 0x0000;
/// Bytes per glyph in the builtin hexadecimal glyph table.
pub const FONT_GLYPH_BYTES: u16 = 5;

/// Canonical fixed-region descriptor for the architectural memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u16,
    /// Inclusive end address.
    pub end: u16,
}

/// Region classification for architectural addresses.
///
/// The reserved region holds interpreter/font data a collaborator may have
/// pre-populated; it is never treated as program text, but the core must
/// not assume it is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    /// Reserved system/font region (`0x0000..=0x01FF`).
    Reserved,
    /// Program region (`0x0200..=0x0FFF`).
    Program,
}

impl MemoryRegion {
    /// Returns the inclusive bounds for this region.
    #[must_use]
    pub const fn bounds(self) -> (u16, u16) {
        match self {
            Self::Reserved => (RESERVED_START, RESERVED_END),
            Self::Program => (PROGRAM_START, PROGRAM_END),
        }
    }

    /// Returns `true` when `addr` belongs to this region.
    #[must_use]
    pub const fn contains(self, addr: u16) -> bool {
        let (start, end) = self.bounds();
        addr >= start && addr <= end
    }

    /// Returns the canonical descriptor for this region.
    #[must_use]
    pub const fn descriptor(self) -> RegionDescriptor {
        let (start, end) = self.bounds();
        RegionDescriptor {
            region: self,
            start,
            end,
        }
    }
}

/// Canonical fixed architectural region layout in ascending address order.
pub const FIXED_MEMORY_REGIONS: [RegionDescriptor; 2] = [
    MemoryRegion::Reserved.descriptor(),
    MemoryRegion::Program.descriptor(),
];

const _: () = assert_fixed_region_layout();

const fn assert_fixed_region_layout() {
    assert!(
        FIXED_MEMORY_REGIONS[0].start == RESERVED_START
            && FIXED_MEMORY_REGIONS[0].end == RESERVED_END,
        "reserved bounds must match the architectural map"
    );
    assert!(
        FIXED_MEMORY_REGIONS[1].start == PROGRAM_START && FIXED_MEMORY_REGIONS[1].end == PROGRAM_END,
        "program bounds must match the architectural map"
    );
    assert!(
        RESERVED_END.wrapping_add(1) == PROGRAM_START,
        "fixed regions must be contiguous"
    );
    assert!(
        FONT_START <= RESERVED_END,
        "glyph table must live in the reserved region"
    );
}

/// Decodes an architectural address into its fixed memory region, or
/// `None` when the address falls outside the 4 KiB space.
#[must_use]
pub const fn decode_memory_region(addr: u16) -> Option<MemoryRegion> {
    match addr {
        RESERVED_START..=RESERVED_END => Some(MemoryRegion::Reserved),
        PROGRAM_START..=PROGRAM_END => Some(MemoryRegion::Program),
        _ => None,
    }
}
