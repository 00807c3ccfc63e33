//! camflash-core - Core library for retrieving factory-programmed
//! configuration from the serial flash of an attached imaging device.
//!
//! The flash is not memory mapped; everything goes through a narrow
//! request/response command channel (one fixed-layout command packet out,
//! one response packet back, then a stream of fixed-size page transfers).
//! This crate owns the paging and chunking logic on top of that channel,
//! the redundant-record resolution for the admin sectors, and the
//! bootstrap that loads the calibration sector.
//!
//! # Features
//!
//! - `std` - Enable standard library support (`std::error::Error` impls,
//!   boxed channel trait objects)
//!
//! # Example
//!
//! ```ignore
//! use camflash_core::channel::CommandChannel;
//! use camflash_core::store::ConfigStore;
//!
//! fn dump_identity<C: CommandChannel, P: camflash_core::store::CalibrationParser>(
//!     channel: &mut C,
//!     parser: &mut P,
//! ) {
//!     match ConfigStore::initialize(channel, parser) {
//!         Ok(store) => {
//!             let id = store.identity();
//!             println!("serial {} model {}", id.serial_number, id.model_number);
//!         }
//!         Err(e) => println!("init failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod admin;
pub mod channel;
pub mod error;
pub mod flash;
pub mod geom;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) mod testutil {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use crate::channel::{
        opcodes, CommandChannel, CommandPacket, ResponsePacket, ResponseStatus,
    };
    use crate::error::{Error, Result};
    use crate::geom::PAGE_BYTES;

    /// Simulated channel backed by a flash image, with transaction counters.
    pub struct MemChannel {
        pub image: Vec<u8>,
        /// Start of the page stream set up by the last accepted exchange.
        cursor: usize,
        pages_left: u32,
        pub exchanges: u32,
        pub page_reads: u32,
        /// When set, every exchange is rejected with this status.
        pub reject_with: Option<ResponseStatus>,
    }

    impl MemChannel {
        pub fn new(size: usize) -> Self {
            Self {
                image: vec![0xFF; size],
                cursor: 0,
                pages_left: 0,
                exchanges: 0,
                page_reads: 0,
                reject_with: None,
            }
        }

        /// Image large enough to hold the admin root table and a few sectors.
        pub fn with_pattern(size: usize) -> Self {
            let mut ch = Self::new(size);
            for (i, b) in ch.image.iter_mut().enumerate() {
                *b = (i % 251) as u8;
            }
            ch
        }

        pub fn write(&mut self, addr: u32, data: &[u8]) {
            let addr = addr as usize;
            self.image[addr..addr + data.len()].copy_from_slice(data);
        }
    }

    impl CommandChannel for MemChannel {
        fn exchange(&mut self, cmd: &CommandPacket) -> Result<ResponsePacket> {
            self.exchanges += 1;
            if let Some(status) = self.reject_with {
                return Ok(ResponsePacket::new(cmd.tag, status));
            }
            assert_eq!(cmd.opcode, opcodes::DOWNLOAD_SPI_FLASH);
            assert_eq!(cmd.value as usize % PAGE_BYTES, 0);
            self.cursor = cmd.address as usize;
            self.pages_left = cmd.value / PAGE_BYTES as u32;
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
}
