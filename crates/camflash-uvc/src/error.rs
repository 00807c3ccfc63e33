//! Error types for the UVC command channel

use thiserror::Error;

/// Result type for UVC channel operations
pub type Result<T> = std::result::Result<T, UvcError>;

/// Errors that can occur when talking to the camera over UVC
#[derive(Debug, Error)]
pub enum UvcError {
    /// No matching camera on the bus
    #[error("camera not found (VID:8086 PID:0A80)")]
    DeviceNotFound,

    /// Failed to open device
    #[error("failed to open camera: {0}")]
    OpenFailed(String),

    /// Failed to claim the video control interface
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// Device answered with fewer bytes than the packet layout requires
    #[error("short response: got {got} bytes, need {need}")]
    ShortResponse {
        /// Bytes actually returned
        got: usize,
        /// Bytes the fixed layout requires
        need: usize,
    },

    /// Parameter parsing error
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] camflash_core::Error),
}

impl From<nusb::Error> for UvcError {
    fn from(e: nusb::Error) -> Self {
        UvcError::TransferFailed(e.to_string())
    }
}
