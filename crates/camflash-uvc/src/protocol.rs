//! UVC extension-unit protocol constants
//!
//! The camera exposes its command/response channel as one control on a
//! vendor extension unit of the video control interface. Commands go out
//! with SET_CUR, the response descriptor and the streamed flash pages come
//! back with GET_CUR on the same control.

// USB device identifiers
pub const CAMERA_USB_VENDOR: u16 = 0x8086;
pub const CAMERA_USB_PRODUCT: u16 = 0x0A80;

// Video control interface hosting the extension unit
pub const VIDEO_CONTROL_INTERFACE: u8 = 0;

// Vendor extension unit id within the video control interface
pub const CAMERA_XU_UNIT_ID: u8 = 2;

// Extension unit control selector for the command/response channel
pub const CONTROL_COMMAND_RESPONSE: u8 = 1;

// UVC class-specific request codes
pub const SET_CUR: u8 = 0x01;
pub const GET_CUR: u8 = 0x81;

// Protocol timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// wValue for a control selector (selector in the high byte)
#[inline]
pub const fn control_value(selector: u8) -> u16 {
    (selector as u16) << 8
}

/// wIndex for an entity on an interface (entity id in the high byte)
#[inline]
pub const fn entity_index(unit_id: u8, interface: u8) -> u16 {
    ((unit_id as u16) << 8) | interface as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        assert_eq!(control_value(CONTROL_COMMAND_RESPONSE), 0x0100);
        assert_eq!(entity_index(CAMERA_XU_UNIT_ID, VIDEO_CONTROL_INTERFACE), 0x0200);
    }
}
