//! Fixed-layout command and response packets
//!
//! Both packets travel over the control channel as little-endian byte
//! records with documented offsets; nothing here depends on native struct
//! layout.

use core::fmt;

use super::opcodes;

/// Wire size of an encoded command packet
pub const COMMAND_PACKET_BYTES: usize = 20;

/// Wire size of an encoded response packet
pub const RESPONSE_PACKET_BYTES: usize = 8;

/// One outbound command descriptor.
///
/// Wire layout (all fields little-endian u32):
///
/// | offset | field    |
/// |--------|----------|
/// | 0      | opcode   |
/// | 4      | modifier |
/// | 8      | tag      |
/// | 12     | address  |
/// | 16     | value    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPacket {
    /// Operation code
    pub opcode: u32,
    /// Execution modifier
    pub modifier: u32,
    /// Caller-chosen tag echoed back in the response
    pub tag: u32,
    /// Flash byte address the command operates on
    pub address: u32,
    /// Operation argument (byte count for flash downloads)
    pub value: u32,
}

impl CommandPacket {
    /// Command requesting `n_bytes` of flash starting at `address`.
    ///
    /// `n_bytes` must be a whole number of pages; the page reader is the
    /// only caller and guarantees that.
    pub fn download_flash(address: u32, n_bytes: u32) -> Self {
        Self {
            opcode: opcodes::DOWNLOAD_SPI_FLASH,
            modifier: opcodes::MODIFIER_DIRECT,
            tag: opcodes::FLASH_READ_TAG,
            address,
            value: n_bytes,
        }
    }

    /// Encode into the fixed wire layout
    pub fn encode(&self) -> [u8; COMMAND_PACKET_BYTES] {
        let mut buf = [0u8; COMMAND_PACKET_BYTES];
        buf[0..4].copy_from_slice(&self.opcode.to_le_bytes());
        buf[4..8].copy_from_slice(&self.modifier.to_le_bytes());
        buf[8..12].copy_from_slice(&self.tag.to_le_bytes());
        buf[12..16].copy_from_slice(&self.address.to_le_bytes());
        buf[16..20].copy_from_slice(&self.value.to_le_bytes());
        buf
    }

    /// Decode from the fixed wire layout
    pub fn decode(buf: &[u8; COMMAND_PACKET_BYTES]) -> Self {
        Self {
            opcode: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            modifier: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            tag: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            address: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            value: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
        }
    }
}

/// Status word reported by the device for an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Command accepted, any promised page stream will follow
    Success,
    /// Device busy with a previous operation
    Busy,
    /// Opcode or modifier not understood
    InvalidCommand,
    /// Address rejected by the firmware
    InvalidAddress,
    /// Status word outside the known set
    Other(u32),
}

impl ResponseStatus {
    /// Decode from the wire status word
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Busy,
            2 => Self::InvalidCommand,
            3 => Self::InvalidAddress,
            other => Self::Other(other),
        }
    }

    /// Wire status word for this status
    pub fn code(&self) -> u32 {
        match self {
            Self::Success => 0,
            Self::Busy => 1,
            Self::InvalidCommand => 2,
            Self::InvalidAddress => 3,
            Self::Other(code) => *code,
        }
    }

    /// Whether the exchange was accepted
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Busy => write!(f, "device busy"),
            Self::InvalidCommand => write!(f, "invalid command"),
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::Other(code) => write!(f, "unknown status {:#x}", code),
        }
    }
}

/// One inbound response descriptor.
///
/// Wire layout: tag u32 @0, status u32 @4, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePacket {
    /// Tag echoed from the command
    pub tag: u32,
    status: u32,
}

impl ResponsePacket {
    /// Build a response (used by simulated channels)
    pub fn new(tag: u32, status: ResponseStatus) -> Self {
        Self {
            tag,
            status: status.code(),
        }
    }

    /// Decode from the fixed wire layout
    pub fn decode(buf: &[u8; RESPONSE_PACKET_BYTES]) -> Self {
        Self {
            tag: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            status: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }

    /// Encode into the fixed wire layout
    pub fn encode(&self) -> [u8; RESPONSE_PACKET_BYTES] {
        let mut buf = [0u8; RESPONSE_PACKET_BYTES];
        buf[0..4].copy_from_slice(&self.tag.to_le_bytes());
        buf[4..8].copy_from_slice(&self.status.to_le_bytes());
        buf
    }

    /// Decoded status word
    pub fn status(&self) -> ResponseStatus {
        ResponseStatus::from_code(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_roundtrip() {
        let cmd = CommandPacket::download_flash(0x000A_0000, 4096);
        let wire = cmd.encode();
        assert_eq!(wire[0], opcodes::DOWNLOAD_SPI_FLASH as u8);
        // address at offset 12, little-endian
        assert_eq!(&wire[12..16], &[0x00, 0x00, 0x0A, 0x00]);
        assert_eq!(CommandPacket::decode(&wire), cmd);
    }

    #[test]
    fn test_response_status_codes() {
        for code in [0u32, 1, 2, 3, 0xDEAD] {
            assert_eq!(ResponseStatus::from_code(code).code(), code);
        }
        assert!(ResponseStatus::Success.is_success());
        assert!(!ResponseStatus::Busy.is_success());
    }

    #[test]
    fn test_response_roundtrip() {
        let resp = ResponsePacket::new(12, ResponseStatus::InvalidAddress);
        let wire = resp.encode();
        let back = ResponsePacket::decode(&wire);
        assert_eq!(back.tag, 12);
        assert_eq!(back.status(), ResponseStatus::InvalidAddress);
    }
}
