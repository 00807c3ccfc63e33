//! Flash geometry and admin-area layout
//!
//! Everything here is fixed by the camera firmware at manufacturing time.
//! The non-firmware area starts after the sectors reserved for firmware
//! images; its first bytes hold the admin pointer table.

/// Smallest addressable flash transfer unit
pub const PAGE_BYTES: usize = 256;

/// Pages per sector (the unit of redundant record storage)
pub const PAGES_PER_SECTOR: usize = 16;

/// Sector size in bytes
pub const SECTOR_BYTES: usize = PAGE_BYTES * PAGES_PER_SECTOR;

/// Total capacity of the flash part (2 MiB)
pub const TOTAL_FLASH_BYTES: u32 = 0x0020_0000;

/// Number of entries in the root admin pointer table
pub const ADMIN_ENTRY_COUNT: usize = 12;

/// Address of the root admin pointer table (first non-firmware byte,
/// 160 firmware sectors * 4096)
pub const ADMIN_TABLE_ROOT_ADDRESS: u32 = 0x000A_0000;

/// Offset of the "unused bits" word inside a redundant record sector,
/// two 32-bit words before the end of the sector
pub const UNUSED_BITS_OFFSET: u32 = (SECTOR_BYTES - 2 * 4) as u32;

/// Admin entry holding the calibration sector
pub const CALIBRATION_ENTRY: usize = 0;

/// Admin entry holding the routine descriptor table
pub const ROUTINE_TABLE_ENTRY: usize = 1;

/// Stride of one routine descriptor record copy
pub const ROUTINE_RECORD_STRIDE: u32 = 256;

/// Offset of the descriptor table within a routine record copy
pub const ROUTINE_DESCRIPTOR_OFFSET: u32 = 0;

/// Length of the erase/preserve routine descriptor table
pub const ROUTINE_DESCRIPTOR_TABLE_BYTES: usize = 52;

/// Leading device-identity block of the calibration sector
pub const IDENTITY_BLOCK_BYTES: usize = 2048;

/// Calibration parameter block following the identity block
pub const CALIBRATION_BLOCK_BYTES: usize = 2000;

/// Round an address down to its page boundary
#[inline]
pub const fn page_base(address: u32) -> u32 {
    address & !(PAGE_BYTES as u32 - 1)
}

/// Byte offset of an address within its page
#[inline]
pub const fn offset_in_page(address: u32) -> usize {
    (address & (PAGE_BYTES as u32 - 1)) as usize
}

/// Whether an address sits on a page boundary
#[inline]
pub const fn is_page_aligned(address: u32) -> bool {
    offset_in_page(address) == 0
}
