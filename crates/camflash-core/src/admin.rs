//! Admin pointer table and redundant record resolution
//!
//! The root of the non-firmware flash area is a fixed array of sector
//! addresses, one per logical admin entry. Each pointed-to sector holds
//! mirrored copies of a record, written append-only for wear leveling; a
//! 32-bit "unused bits" word near the end of the sector marks which copy
//! slots are still blank (bit set = unused). The most recently written
//! copy is the last used slot.

use crate::channel::CommandChannel;
use crate::error::{Error, Result};
use crate::flash;
use crate::geom::{
    ADMIN_ENTRY_COUNT, ADMIN_TABLE_ROOT_ADDRESS, PAGES_PER_SECTOR, SECTOR_BYTES,
    UNUSED_BITS_OFFSET,
};

/// Used-copy accounting for one redundant record sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedCopies {
    /// Number of copy slots that have been written
    pub count: u32,
    /// Raw unused-bits word as stored on flash (bit set = slot unused)
    pub unused_bits: u32,
}

impl UsedCopies {
    /// Zero-based index of the most recently written copy.
    ///
    /// A sector where no copy was ever written has no latest copy; that is
    /// an error here rather than an underflowing offset downstream.
    pub fn latest_copy_index(&self) -> Result<u32> {
        if self.count == 0 {
            return Err(Error::NoValidCopy);
        }
        Ok(self.count - 1)
    }
}

/// Read the unused-bits word of the sector at `sector_address` and derive
/// the used-copies count.
pub fn used_copies<C: CommandChannel + ?Sized>(
    channel: &mut C,
    sector_address: u32,
) -> Result<UsedCopies> {
    let address = sector_address
        .checked_add(UNUSED_BITS_OFFSET)
        .ok_or(Error::AddressOutOfBounds)?;
    let mut raw = [0u8; 4];
    flash::read_chunk(channel, address, &mut raw)?;
    let unused_bits = u32::from_le_bytes(raw);
    Ok(UsedCopies {
        count: (!unused_bits).count_ones(),
        unused_bits,
    })
}

/// The cached root admin pointer table.
///
/// Loaded once per session and read-only afterwards. Constructing separate
/// instances against separate channels is fine; there is no global state.
#[derive(Debug, Clone)]
pub struct AdminTable {
    sectors: [u32; ADMIN_ENTRY_COUNT],
}

impl AdminTable {
    /// Read the pointer table from the root address.
    pub fn load<C: CommandChannel + ?Sized>(channel: &mut C) -> Result<Self> {
        let mut raw = [0u8; ADMIN_ENTRY_COUNT * 4];
        flash::read_chunk(channel, ADMIN_TABLE_ROOT_ADDRESS, &mut raw)?;

        let mut sectors = [0u32; ADMIN_ENTRY_COUNT];
        for (i, sector) in sectors.iter_mut().enumerate() {
            let off = i * 4;
            *sector = u32::from_le_bytes([raw[off], raw[off + 1], raw[off + 2], raw[off + 3]]);
        }

        log::debug!("admin pointer table loaded from {:#08x}", ADMIN_TABLE_ROOT_ADDRESS);
        Ok(Self { sectors })
    }

    /// Sector address for an admin entry.
    pub fn sector_address(&self, entry: usize) -> Result<u32> {
        self.sectors
            .get(entry)
            .copied()
            .ok_or(Error::EntryOutOfRange)
    }

    /// Read the whole sector of an admin entry into `buf`.
    pub fn read_sector<C: CommandChannel + ?Sized>(
        &self,
        channel: &mut C,
        entry: usize,
        buf: &mut [u8; SECTOR_BYTES],
    ) -> Result<()> {
        let address = self.sector_address(entry)?;
        flash::read_pages(channel, address, buf, PAGES_PER_SECTOR as u32)
    }

    /// Read one field of the latest copy of a redundant, fixed-stride
    /// record without pulling the whole sector.
    ///
    /// `stride` is the byte distance between mirrored copies,
    /// `field_offset` the field's position within a copy; `out.len()`
    /// bytes are read.
    pub fn read_record_field<C: CommandChannel + ?Sized>(
        &self,
        channel: &mut C,
        entry: usize,
        stride: u32,
        field_offset: u32,
        out: &mut [u8],
    ) -> Result<()> {
        let sector = self.sector_address(entry)?;
        let copies = used_copies(channel, sector)?;
        let copy = copies.latest_copy_index()?;
        let address = copy
            .checked_mul(stride)
            .and_then(|off| off.checked_add(field_offset))
            .and_then(|off| off.checked_add(sector))
            .ok_or(Error::AddressOutOfBounds)?;
        log::trace!(
            "entry {} copy {}/{} field at {:#08x}",
            entry,
            copy,
            copies.count,
            address
        );
        flash::read_chunk(channel, address, out)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testutil::MemChannel;

    // Big enough to cover the root table and a couple of admin sectors.
    const IMAGE_BYTES: usize = 0xB0_000;

    fn channel_with_table(entries: &[u32]) -> MemChannel {
        let mut ch = MemChannel::with_pattern(IMAGE_BYTES);
        for (i, addr) in entries.iter().enumerate() {
            ch.write(ADMIN_TABLE_ROOT_ADDRESS + (i * 4) as u32, &addr.to_le_bytes());
        }
        ch
    }

    #[test]
    fn test_used_copies_popcount() {
        let mut ch = MemChannel::with_pattern(IMAGE_BYTES);
        for (unused, want) in [
            (0xFFFF_FFFFu32, 0u32), // nothing written
            (0xFFFF_FFF8, 3),       // 3 of the low slots used
            (0x0000_0000, 32),      // every slot used
            (0xAAAA_AAAA, 16),
        ] {
            ch.write(0x1000 + UNUSED_BITS_OFFSET, &unused.to_le_bytes());
            let copies = used_copies(&mut ch, 0x1000).unwrap();
            assert_eq!(copies.count, want, "unused bits {:#010x}", unused);
            assert_eq!(copies.unused_bits, unused);
        }
    }

    #[test]
    fn test_latest_copy_index_guards_empty_sector() {
        let empty = UsedCopies {
            count: 0,
            unused_bits: 0xFFFF_FFFF,
        };
        assert_eq!(empty.latest_copy_index(), Err(Error::NoValidCopy));

        let three = UsedCopies {
            count: 3,
            unused_bits: 0xFFFF_FFF8,
        };
        assert_eq!(three.latest_copy_index(), Ok(2));
    }

    #[test]
    fn test_sector_address_bounds() {
        let mut ch = channel_with_table(&[0x1000, 0x2000]);
        let table = AdminTable::load(&mut ch).unwrap();
        assert_eq!(table.sector_address(0), Ok(0x1000));
        assert_eq!(table.sector_address(1), Ok(0x2000));
        assert_eq!(
            table.sector_address(ADMIN_ENTRY_COUNT),
            Err(Error::EntryOutOfRange)
        );
    }

    #[test]
    fn test_read_sector_out_of_range_entry_is_silent() {
        let mut ch = channel_with_table(&[0x1000]);
        let table = AdminTable::load(&mut ch).unwrap();
        let before = ch.exchanges;
        let mut sector = [0u8; SECTOR_BYTES];
        assert_eq!(
            table.read_sector(&mut ch, ADMIN_ENTRY_COUNT + 3, &mut sector),
            Err(Error::EntryOutOfRange)
        );
        assert_eq!(ch.exchanges, before);
    }

    #[test]
    fn test_read_sector_whole_sector() {
        let mut ch = channel_with_table(&[0x2000]);
        let table = AdminTable::load(&mut ch).unwrap();
        let mut sector = [0u8; SECTOR_BYTES];
        table.read_sector(&mut ch, 0, &mut sector).unwrap();
        assert_eq!(&sector[..], &ch.image[0x2000..0x2000 + SECTOR_BYTES]);
    }

    #[test]
    fn test_read_record_field_latest_copy() {
        // 3 of 8 copies used, stride 256: latest copy is index 2, so a
        // field at offset 0 lives at sector + 0x200.
        let mut ch = channel_with_table(&[0x1000]);
        ch.write(0x1000 + UNUSED_BITS_OFFSET, &0xFFFF_FFF8u32.to_le_bytes());
        ch.write(0x1200, &[0xDE, 0xAD, 0xBE, 0xEF]);

        let table = AdminTable::load(&mut ch).unwrap();
        let mut field = [0u8; 4];
        table
            .read_record_field(&mut ch, 0, 256, 0, &mut field)
            .unwrap();
        assert_eq!(field, [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_read_record_field_fresh_sector() {
        let mut ch = channel_with_table(&[0x1000]);
        ch.write(0x1000 + UNUSED_BITS_OFFSET, &0xFFFF_FFFFu32.to_le_bytes());
        let table = AdminTable::load(&mut ch).unwrap();
        let mut field = [0u8; 4];
        assert_eq!(
            table.read_record_field(&mut ch, 0, 256, 0, &mut field),
            Err(Error::NoValidCopy)
        );
    }
}
