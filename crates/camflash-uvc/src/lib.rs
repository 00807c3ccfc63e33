//! camflash-uvc - UVC extension-unit command channel
//!
//! Talks to the camera over class-specific control transfers on its video
//! control interface. The vendor extension unit exposes one
//! command/response control: a SET_CUR carries the encoded command packet,
//! GET_CURs return the response packet and then the streamed flash pages.

mod device;
mod error;
mod protocol;

pub use device::{parse_options, UvcChannel, UvcConfig, UvcDeviceInfo};
pub use error::{Result, UvcError};
pub use protocol::{CAMERA_USB_PRODUCT, CAMERA_USB_VENDOR};
