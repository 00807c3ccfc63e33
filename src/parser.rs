//! Minimal calibration block parser
//!
//! The calibration parameter block's full internal layout (per-mode
//! rectified intrinsics and extrinsics) belongs to a dedicated parser
//! library. For the CLI we only decode the leading metadata version word
//! and keep the block raw.

use std::fmt;

use camflash_core::store::CalibrationParser;

/// Calibration block with only the metadata header decoded
#[derive(Debug, Clone)]
pub struct VersionedCalibration {
    /// Calibration format version (first metadata word)
    pub version: u32,
    /// The raw parameter block
    pub raw: Vec<u8>,
}

/// Error from the header-only parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedBlock {
    /// Bytes the block actually had
    pub len: usize,
}

impl fmt::Display for TruncatedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "calibration block truncated at {} bytes", self.len)
    }
}

impl std::error::Error for TruncatedBlock {}

/// Header-only calibration parser
pub struct VersionedParser;

impl CalibrationParser for VersionedParser {
    type Output = VersionedCalibration;
    type Error = TruncatedBlock;

    fn parse(&mut self, raw: &[u8]) -> Result<VersionedCalibration, TruncatedBlock> {
        if raw.len() < 4 {
            return Err(TruncatedBlock { len: raw.len() });
        }
        Ok(VersionedCalibration {
            version: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            raw: raw.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_word() {
        let mut block = vec![0u8; 64];
        block[0..4].copy_from_slice(&3u32.to_le_bytes());
        let calib = VersionedParser.parse(&block).unwrap();
        assert_eq!(calib.version, 3);
        assert_eq!(calib.raw.len(), 64);
    }

    #[test]
    fn test_truncated_block() {
        let err = VersionedParser.parse(&[1, 2]).unwrap_err();
        assert_eq!(err, TruncatedBlock { len: 2 });
    }
}
