//! camflash-dummy - In-memory camera flash emulator for testing
//!
//! This crate provides a dummy command channel that serves flash download
//! commands from a byte image in memory. It's useful for testing and
//! development without real hardware, and for exercising the full
//! bootstrap path against a hand-built flash image.

use camflash_core::channel::{
    opcodes, CommandChannel, CommandPacket, ResponsePacket, ResponseStatus,
};
use camflash_core::error::{Error, Result};
use camflash_core::geom::{
    ADMIN_TABLE_ROOT_ADDRESS, IDENTITY_BLOCK_BYTES, PAGE_BYTES, TOTAL_FLASH_BYTES,
    UNUSED_BITS_OFFSET,
};
use camflash_core::store::DeviceIdentity;

/// Configuration for the dummy device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Flash image size in bytes
    pub size: usize,
    /// Status to answer every exchange with
    pub status: ResponseStatus,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: TOTAL_FLASH_BYTES as usize,
            status: ResponseStatus::Success,
        }
    }
}

/// Dummy command channel
///
/// Emulates the camera's flash download protocol over an in-memory image:
/// an accepted exchange arms a page stream which subsequent
/// [`CommandChannel::read_page`] calls drain sequentially.
pub struct DummyDevice {
    config: DummyConfig,
    image: Vec<u8>,
    cursor: usize,
    pages_left: u32,
    exchanges: u32,
    page_reads: u32,
}

impl DummyDevice {
    /// Create a dummy device with a blank (0xFF) image
    pub fn new(config: DummyConfig) -> Self {
        let image = vec![0xFF; config.size];
        Self {
            config,
            image,
            cursor: 0,
            pages_left: 0,
            exchanges: 0,
            page_reads: 0,
        }
    }

    /// Create a dummy device with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy device with a pre-filled image
    pub fn with_image(config: DummyConfig, initial: &[u8]) -> Self {
        let mut dev = Self::new(config);
        let len = initial.len().min(dev.image.len());
        dev.image[..len].copy_from_slice(&initial[..len]);
        dev
    }

    /// Get a reference to the flash image
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Get a mutable reference to the flash image
    pub fn image_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Number of exchanges performed so far
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// Number of page transfers served so far
    pub fn page_reads(&self) -> u32 {
        self.page_reads
    }

    /// Make every following exchange fail with `status`
    pub fn reject_with(&mut self, status: ResponseStatus) {
        self.config.status = status;
    }
}

impl CommandChannel for DummyDevice {
    fn exchange(&mut self, cmd: &CommandPacket) -> Result<ResponsePacket> {
        self.exchanges += 1;

        if !self.config.status.is_success() {
            return Ok(ResponsePacket::new(cmd.tag, self.config.status));
        }

        if cmd.opcode != opcodes::DOWNLOAD_SPI_FLASH {
            log::debug!("dummy: unhandled opcode {:#x}", cmd.opcode);
            return Ok(ResponsePacket::new(cmd.tag, ResponseStatus::InvalidCommand));
        }

        let end = cmd.address as usize + cmd.value as usize;
        if cmd.value as usize % PAGE_BYTES != 0 || end > self.image.len() {
            return Ok(ResponsePacket::new(cmd.tag, ResponseStatus::InvalidAddress));
        }

        self.cursor = cmd.address as usize;
        self.pages_left = cmd.value / PAGE_BYTES as u32;
        log::trace!(
            "dummy: armed {} page stream at {:#08x}",
            self.pages_left,
            cmd.address
        );
        Ok(ResponsePacket::new(cmd.tag, ResponseStatus::Success))
    }

    fn read_page(&mut self, buf: &mut [u8; PAGE_BYTES]) -> Result<()> {
        self.page_reads += 1;
        if self.pages_left == 0 {
            return Err(Error::ShortPageRead);
        }
        buf.copy_from_slice(&self.image[self.cursor..self.cursor + PAGE_BYTES]);
        self.cursor += PAGE_BYTES;
        self.pages_left -= 1;
        Ok(())
    }
}

/// Builder that lays out admin structures in a blank flash image.
///
/// Only writes the parts the reader cares about; everything else stays in
/// the erased (0xFF) state like real wear-leveled flash.
pub struct ImageBuilder {
    image: Vec<u8>,
    next_entry: usize,
}

impl ImageBuilder {
    /// Start from a blank full-size image
    pub fn new() -> Self {
        Self {
            image: vec![0xFF; TOTAL_FLASH_BYTES as usize],
            next_entry: 0,
        }
    }

    /// Write raw bytes at an address
    pub fn write(&mut self, address: u32, data: &[u8]) -> &mut Self {
        let address = address as usize;
        self.image[address..address + data.len()].copy_from_slice(data);
        self
    }

    /// Point the next admin entry at `sector_address` and return the
    /// entry index
    pub fn admin_entry(&mut self, sector_address: u32) -> usize {
        let entry = self.next_entry;
        self.next_entry += 1;
        let slot = ADMIN_TABLE_ROOT_ADDRESS + (entry * 4) as u32;
        self.write(slot, &sector_address.to_le_bytes());
        entry
    }

    /// Mark `used` copy slots of the sector as written
    pub fn used_copies(&mut self, sector_address: u32, used: u32) -> &mut Self {
        let unused_bits = if used >= 32 { 0 } else { !0u32 << used };
        self.write(
            sector_address + UNUSED_BITS_OFFSET,
            &unused_bits.to_le_bytes(),
        )
    }

    /// Write a record copy at the given slot of a fixed-stride table
    pub fn record_copy(&mut self, sector_address: u32, stride: u32, slot: u32, data: &[u8]) -> &mut Self {
        self.write(sector_address + slot * stride, data)
    }

    /// Write a calibration sector: identity fields at the head, the
    /// calibration block right after the identity block
    pub fn calibration_sector(
        &mut self,
        sector_address: u32,
        identity: &DeviceIdentity,
        calibration: &[u8],
    ) -> &mut Self {
        self.write(sector_address, &identity.serial_number.to_le_bytes());
        self.write(sector_address + 4, &identity.model_number.to_le_bytes());
        self.write(sector_address + 8, &identity.revision_number.to_le_bytes());
        self.write(sector_address + 12, &identity.calibration_date.to_le_bytes());
        self.write(sector_address + IDENTITY_BLOCK_BYTES as u32, calibration)
    }

    /// Finish into a dummy device serving this image
    pub fn build(self) -> DummyDevice {
        DummyDevice::with_image(DummyConfig::default(), &self.image)
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
