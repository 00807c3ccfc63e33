//! Error types for camflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bounds errors - detected before any channel traffic
    /// Requested address range falls outside total flash capacity
    AddressOutOfBounds,
    /// Requested length is zero where a transfer is required
    InvalidLength,
    /// Provided buffer is too small for the operation
    BufferTooSmall,
    /// Admin entry index outside the pointer table
    EntryOutOfRange,

    // Channel errors
    /// The device rejected the command (non-success response status)
    CommandFailed,
    /// Fewer page transfers completed than the exchange promised
    ShortPageRead,

    // Storage errors
    /// A higher-level sector read could not be completed
    SectorReadFailed,
    /// No redundant copy of the record has ever been written
    NoValidCopy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidLength => write!(f, "invalid transfer length"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::EntryOutOfRange => write!(f, "admin entry index out of range"),
            Self::CommandFailed => write!(f, "device rejected the command"),
            Self::ShortPageRead => write!(f, "page stream ended early"),
            Self::SectorReadFailed => write!(f, "sector read failed"),
            Self::NoValidCopy => write!(f, "no valid record copy in sector"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
