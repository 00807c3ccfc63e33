//! UVC device implementation
//!
//! This module provides the `UvcChannel` struct that carries the camera's
//! command/response protocol over class-specific control transfers against
//! the vendor extension unit.

use std::time::Duration;

use camflash_core::channel::{CommandChannel, CommandPacket, ResponsePacket};
use camflash_core::channel::{COMMAND_PACKET_BYTES, RESPONSE_PACKET_BYTES};
use camflash_core::error::{Error as CoreError, Result as CoreResult};
use camflash_core::geom::PAGE_BYTES;
use nusb::{Interface, MaybeFuture};

use crate::error::{Result, UvcError};
use crate::protocol::*;

/// Configuration options for opening a camera
#[derive(Debug, Clone, Default)]
pub struct UvcConfig {
    /// Device index (when multiple cameras are connected)
    pub device_index: usize,
}

/// Parse options from key=value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<UvcConfig> {
    let mut config = UvcConfig::default();

    for (key, value) in options {
        match *key {
            "device" | "index" => {
                config.device_index = value
                    .parse()
                    .map_err(|_| UvcError::InvalidParameter(format!("device: {}", value)))?;
            }
            _ => {
                return Err(UvcError::InvalidParameter(format!(
                    "unknown option: {}",
                    key
                )));
            }
        }
    }

    Ok(config)
}

/// Info about one connected camera
#[derive(Debug, Clone)]
pub struct UvcDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
}

/// Command channel over a camera's UVC extension unit
pub struct UvcChannel {
    interface: Interface,
    timeout: Duration,
}

impl UvcChannel {
    /// Open the first available camera
    pub fn open() -> Result<Self> {
        Self::open_with_config(UvcConfig::default())
    }

    /// Open a camera with the specified configuration
    pub fn open_with_config(config: UvcConfig) -> Result<Self> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| UvcError::OpenFailed(e.to_string()))?
            .filter(|d| {
                d.vendor_id() == CAMERA_USB_VENDOR && d.product_id() == CAMERA_USB_PRODUCT
            })
            .collect();

        if devices.is_empty() {
            return Err(UvcError::DeviceNotFound);
        }

        let device_info = devices
            .get(config.device_index)
            .ok_or(UvcError::DeviceNotFound)?;

        log::info!(
            "opening camera at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| UvcError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(VIDEO_CONTROL_INTERFACE)
            .wait()
            .map_err(|e| UvcError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            interface,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    /// List all connected cameras
    pub fn list_devices() -> Result<Vec<UvcDeviceInfo>> {
        let devices = nusb::list_devices()
            .wait()
            .map_err(|e| UvcError::OpenFailed(e.to_string()))?
            .filter(|d| {
                d.vendor_id() == CAMERA_USB_VENDOR && d.product_id() == CAMERA_USB_PRODUCT
            })
            .map(|d| UvcDeviceInfo {
                bus: d.busnum(),
                address: d.device_address(),
            })
            .collect();

        Ok(devices)
    }

    /// SET_CUR on the command/response control
    fn control_write(&mut self, data: &[u8]) -> Result<()> {
        self.interface
            .control_out(
                nusb::transfer::ControlOut {
                    control_type: nusb::transfer::ControlType::Class,
                    recipient: nusb::transfer::Recipient::Interface,
                    request: SET_CUR,
                    value: control_value(CONTROL_COMMAND_RESPONSE),
                    index: entity_index(CAMERA_XU_UNIT_ID, VIDEO_CONTROL_INTERFACE),
                    data,
                },
                self.timeout,
            )
            .wait()
            .map_err(|e| UvcError::TransferFailed(e.to_string()))?;

        Ok(())
    }

    /// GET_CUR on the command/response control
    fn control_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let data = self
            .interface
            .control_in(
                nusb::transfer::ControlIn {
                    control_type: nusb::transfer::ControlType::Class,
                    recipient: nusb::transfer::Recipient::Interface,
                    request: GET_CUR,
                    value: control_value(CONTROL_COMMAND_RESPONSE),
                    index: entity_index(CAMERA_XU_UNIT_ID, VIDEO_CONTROL_INTERFACE),
                    length: buf.len() as u16,
                },
                self.timeout,
            )
            .wait()
            .map_err(|e| UvcError::TransferFailed(e.to_string()))?;

        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    /// One command/response exchange, surfacing the crate's own error type
    fn exchange_inner(&mut self, cmd: &CommandPacket) -> Result<ResponsePacket> {
        self.control_write(&cmd.encode())?;

        let mut raw = [0u8; RESPONSE_PACKET_BYTES];
        let got = self.control_read(&mut raw)?;
        if got < RESPONSE_PACKET_BYTES {
            return Err(UvcError::ShortResponse {
                got,
                need: RESPONSE_PACKET_BYTES,
            });
        }

        let resp = ResponsePacket::decode(&raw);
        log::trace!(
            "exchange opcode {:#x} at {:#08x}: {}",
            cmd.opcode,
            cmd.address,
            resp.status()
        );
        Ok(resp)
    }
}

impl CommandChannel for UvcChannel {
    fn exchange(&mut self, cmd: &CommandPacket) -> CoreResult<ResponsePacket> {
        self.exchange_inner(cmd).map_err(|e| {
            log::warn!("exchange failed: {}", e);
            CoreError::CommandFailed
        })
    }

    fn read_page(&mut self, buf: &mut [u8; PAGE_BYTES]) -> CoreResult<()> {
        let got = self.control_read(buf).map_err(|e| {
            log::warn!("page transfer failed: {}", e);
            CoreError::ShortPageRead
        })?;
        if got < PAGE_BYTES {
            log::warn!("page transfer returned {} of {} bytes", got, PAGE_BYTES);
            return Err(CoreError::ShortPageRead);
        }
        Ok(())
    }
}

// Wire-size sanity; the control transfer carries the whole packet.
const _: () = assert!(COMMAND_PACKET_BYTES < u16::MAX as usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("index", "2")]).unwrap();
        assert_eq!(config.device_index, 2);

        assert!(parse_options(&[("index", "two")]).is_err());
        assert!(parse_options(&[("frobnicate", "1")]).is_err());
    }
}
