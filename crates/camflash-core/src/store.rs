//! Calibration bootstrap
//!
//! Pulls everything together at session start: load the admin pointer
//! table, fetch the routine descriptor table, then read the calibration
//! sector and split it into the device identity block and the calibration
//! parameter block. The parameter block's internal layout belongs to an
//! external parser behind [`CalibrationParser`].

use core::fmt;

use crate::admin::AdminTable;
use crate::channel::CommandChannel;
use crate::error::{Error, Result};
use crate::geom::{
    CALIBRATION_BLOCK_BYTES, CALIBRATION_ENTRY, IDENTITY_BLOCK_BYTES,
    ROUTINE_DESCRIPTOR_OFFSET, ROUTINE_DESCRIPTOR_TABLE_BYTES, ROUTINE_RECORD_STRIDE,
    ROUTINE_TABLE_ENTRY, SECTOR_BYTES,
};

/// Deserializer for the opaque calibration parameter block.
///
/// Implemented outside this crate; parse failures are the parser's own
/// error kind and never fold into the flash error type.
pub trait CalibrationParser {
    /// Structured calibration object the parser produces
    type Output;
    /// Parser-specific error kind
    type Error;

    /// Parse the raw calibration parameter block.
    fn parse(&mut self, raw: &[u8]) -> core::result::Result<Self::Output, Self::Error>;
}

/// Initialization error: either the flash side or the external parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError<E> {
    /// Flash or channel failure
    Flash(Error),
    /// Calibration parser failure
    Parse(E),
}

impl<E> From<Error> for InitError<E> {
    fn from(e: Error) -> Self {
        InitError::Flash(e)
    }
}

impl<E: fmt::Display> fmt::Display for InitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Flash(e) => write!(f, "flash read failed: {}", e),
            InitError::Parse(e) => write!(f, "calibration parse failed: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Display + fmt::Debug> std::error::Error for InitError<E> {}

/// Factory-programmed device identity.
///
/// Stored at the head of the calibration sector as fixed-width
/// little-endian fields:
///
/// | offset | field            |
/// |--------|------------------|
/// | 0      | serial number    |
/// | 4      | model number     |
/// | 8      | revision number  |
/// | 12     | calibration date (unix seconds) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Unit serial number
    pub serial_number: u32,
    /// Model number
    pub model_number: u32,
    /// Hardware revision
    pub revision_number: u32,
    /// Factory calibration date, unix seconds
    pub calibration_date: u32,
}

impl DeviceIdentity {
    /// Deserialize from the leading identity block of the calibration
    /// sector.
    pub fn parse(block: &[u8]) -> Result<Self> {
        if block.len() < 16 {
            return Err(Error::BufferTooSmall);
        }
        Ok(Self {
            serial_number: u32::from_le_bytes([block[0], block[1], block[2], block[3]]),
            model_number: u32::from_le_bytes([block[4], block[5], block[6], block[7]]),
            revision_number: u32::from_le_bytes([block[8], block[9], block[10], block[11]]),
            calibration_date: u32::from_le_bytes([block[12], block[13], block[14], block[15]]),
        })
    }
}

/// Erase/preserve routine descriptors read from the routine admin entry.
#[derive(Debug, Clone, Copy)]
pub struct RoutineState {
    descriptors: [u8; ROUTINE_DESCRIPTOR_TABLE_BYTES],
    loaded: bool,
}

impl Default for RoutineState {
    fn default() -> Self {
        Self {
            descriptors: [0u8; ROUTINE_DESCRIPTOR_TABLE_BYTES],
            loaded: false,
        }
    }
}

impl RoutineState {
    /// Raw descriptor table bytes (zeroed when never loaded)
    pub fn descriptors(&self) -> &[u8] {
        &self.descriptors
    }

    /// Whether the descriptor table was actually read from flash
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Session-lifetime snapshot of the factory configuration.
///
/// Everything is read exactly once during [`ConfigStore::initialize`] and
/// immutable afterwards.
#[derive(Debug)]
pub struct ConfigStore<T> {
    admin: AdminTable,
    routine_state: RoutineState,
    identity: DeviceIdentity,
    calibration: T,
}

impl<T> ConfigStore<T> {
    /// Read the admin table, routine descriptors and calibration sector.
    ///
    /// A missing routine descriptor table is tolerated (warned, left
    /// zeroed); a calibration sector that cannot be read or split is fatal.
    pub fn initialize<C, P>(
        channel: &mut C,
        parser: &mut P,
    ) -> core::result::Result<Self, InitError<P::Error>>
    where
        C: CommandChannel + ?Sized,
        P: CalibrationParser<Output = T>,
    {
        let admin = AdminTable::load(channel)?;

        let mut routine_state = RoutineState::default();
        match admin.read_record_field(
            channel,
            ROUTINE_TABLE_ENTRY,
            ROUTINE_RECORD_STRIDE,
            ROUTINE_DESCRIPTOR_OFFSET,
            &mut routine_state.descriptors,
        ) {
            Ok(()) => routine_state.loaded = true,
            Err(e) => log::warn!("routine descriptor table unavailable: {}", e),
        }

        let (identity, calibration) = read_calibration_sector(channel, &admin, parser)?;

        Ok(Self {
            admin,
            routine_state,
            identity,
            calibration,
        })
    }

    /// Device identity block
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Parsed calibration object
    pub fn calibration(&self) -> &T {
        &self.calibration
    }

    /// Routine descriptor state
    pub fn routine_state(&self) -> &RoutineState {
        &self.routine_state
    }

    /// The cached admin pointer table
    pub fn admin(&self) -> &AdminTable {
        &self.admin
    }
}

/// Read and split the calibration sector.
///
/// Any flash-level failure surfaces as [`Error::SectorReadFailed`]; the
/// session cannot come up without calibration data.
pub fn read_calibration_sector<C, P>(
    channel: &mut C,
    admin: &AdminTable,
    parser: &mut P,
) -> core::result::Result<(DeviceIdentity, P::Output), InitError<P::Error>>
where
    C: CommandChannel + ?Sized,
    P: CalibrationParser,
{
    let mut sector = [0u8; SECTOR_BYTES];
    admin
        .read_sector(channel, CALIBRATION_ENTRY, &mut sector)
        .map_err(|e| {
            log::error!("calibration sector read failed: {}", e);
            InitError::Flash(Error::SectorReadFailed)
        })?;

    let identity = DeviceIdentity::parse(&sector[..IDENTITY_BLOCK_BYTES])?;
    let raw = &sector[IDENTITY_BLOCK_BYTES..IDENTITY_BLOCK_BYTES + CALIBRATION_BLOCK_BYTES];
    let calibration = parser.parse(raw).map_err(InitError::Parse)?;

    Ok((identity, calibration))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;
    use crate::channel::ResponseStatus;
    use crate::geom::{ADMIN_TABLE_ROOT_ADDRESS, UNUSED_BITS_OFFSET};
    use crate::testutil::MemChannel;

    const IMAGE_BYTES: usize = 0xB0_000;
    const CALIB_SECTOR: u32 = 0x1000;
    const ROUTINE_SECTOR: u32 = 0x3000;

    struct RawParser;

    impl CalibrationParser for RawParser {
        type Output = Vec<u8>;
        type Error = core::convert::Infallible;

        fn parse(&mut self, raw: &[u8]) -> core::result::Result<Vec<u8>, Self::Error> {
            Ok(raw.to_vec())
        }
    }

    struct RefusingParser;

    impl CalibrationParser for RefusingParser {
        type Output = ();
        type Error = &'static str;

        fn parse(&mut self, _raw: &[u8]) -> core::result::Result<(), &'static str> {
            Err("bad block")
        }
    }

    fn populated_channel() -> MemChannel {
        let mut ch = MemChannel::with_pattern(IMAGE_BYTES);
        ch.write(ADMIN_TABLE_ROOT_ADDRESS, &CALIB_SECTOR.to_le_bytes());
        ch.write(ADMIN_TABLE_ROOT_ADDRESS + 4, &ROUTINE_SECTOR.to_le_bytes());

        // identity block
        ch.write(CALIB_SECTOR, &1234u32.to_le_bytes());
        ch.write(CALIB_SECTOR + 4, &200u32.to_le_bytes());
        ch.write(CALIB_SECTOR + 8, &3u32.to_le_bytes());
        ch.write(CALIB_SECTOR + 12, &1_400_000_000u32.to_le_bytes());

        // routine sector: two copies used, descriptor table in copy 1
        ch.write(
            ROUTINE_SECTOR + UNUSED_BITS_OFFSET,
            &0xFFFF_FFFCu32.to_le_bytes(),
        );
        let mut table = [0u8; ROUTINE_DESCRIPTOR_TABLE_BYTES];
        for (i, b) in table.iter_mut().enumerate() {
            *b = i as u8;
        }
        ch.write(ROUTINE_SECTOR + ROUTINE_RECORD_STRIDE, &table);
        ch
    }

    #[test]
    fn test_identity_parse() {
        let mut block = [0u8; 32];
        block[0..4].copy_from_slice(&77u32.to_le_bytes());
        block[4..8].copy_from_slice(&88u32.to_le_bytes());
        block[8..12].copy_from_slice(&2u32.to_le_bytes());
        block[12..16].copy_from_slice(&1_500_000_000u32.to_le_bytes());
        let id = DeviceIdentity::parse(&block).unwrap();
        assert_eq!(id.serial_number, 77);
        assert_eq!(id.model_number, 88);
        assert_eq!(id.revision_number, 2);
        assert_eq!(id.calibration_date, 1_500_000_000);

        assert_eq!(DeviceIdentity::parse(&block[..8]), Err(Error::BufferTooSmall));
    }

    #[test]
    fn test_initialize_full_session() {
        let mut ch = populated_channel();
        let store = ConfigStore::initialize(&mut ch, &mut RawParser).unwrap();

        assert_eq!(store.identity().serial_number, 1234);
        assert_eq!(store.identity().model_number, 200);
        assert!(store.routine_state().is_loaded());
        assert_eq!(store.routine_state().descriptors()[5], 5);
        assert_eq!(store.calibration().len(), CALIBRATION_BLOCK_BYTES);
        // Calibration block starts right after the identity block.
        assert_eq!(
            store.calibration()[0],
            ch.image[(CALIB_SECTOR as usize) + IDENTITY_BLOCK_BYTES]
        );
    }

    #[test]
    fn test_initialize_tolerates_blank_routine_sector() {
        let mut ch = populated_channel();
        // Routine sector never written: every slot unused.
        ch.write(
            ROUTINE_SECTOR + UNUSED_BITS_OFFSET,
            &0xFFFF_FFFFu32.to_le_bytes(),
        );
        let store = ConfigStore::initialize(&mut ch, &mut RawParser).unwrap();
        assert!(!store.routine_state().is_loaded());
        assert!(store.routine_state().descriptors().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_initialize_fails_without_calibration_sector() {
        let mut ch = populated_channel();
        ch.reject_with = Some(ResponseStatus::InvalidAddress);
        let err = ConfigStore::initialize(&mut ch, &mut RawParser).unwrap_err();
        // The admin table load itself fails once the channel rejects
        // everything; either way initialization must not come up.
        assert!(matches!(err, InitError::Flash(_)));
    }

    #[test]
    fn test_parser_error_is_distinct() {
        let mut ch = populated_channel();
        let err = ConfigStore::initialize(&mut ch, &mut RefusingParser).unwrap_err();
        assert_eq!(err, InitError::Parse("bad block"));
    }
}
