//! Command opcodes and modifiers understood by the camera firmware

/// Stream a range of the serial flash back over the channel
pub const DOWNLOAD_SPI_FLASH: u32 = 0x1A;

/// Direct (unbuffered) execution modifier
pub const MODIFIER_DIRECT: u32 = 0x10;

/// Tag used for flash download commands
pub const FLASH_READ_TAG: u32 = 12;
