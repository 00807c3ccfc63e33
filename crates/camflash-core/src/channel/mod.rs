//! Command channel abstraction
//!
//! The flash is only reachable through a request/response control channel:
//! one fixed-layout command packet out, one response packet back, then a
//! stream of fixed-size page transfers for reads. The transport itself
//! (UVC extension unit, test double, ...) lives behind [`CommandChannel`].

mod packet;

pub mod opcodes;

pub use packet::{
    CommandPacket, ResponsePacket, ResponseStatus, COMMAND_PACKET_BYTES, RESPONSE_PACKET_BYTES,
};

use crate::error::Result;
use crate::geom::PAGE_BYTES;

/// One device session's command/response transport.
///
/// The model is strictly synchronous: every call blocks until the device
/// answers, and there is exactly one outstanding exchange at a time.
/// Implementations that want timeouts apply them internally.
pub trait CommandChannel {
    /// Perform one command/response exchange.
    ///
    /// Returns the decoded response packet; transport failures are errors,
    /// a device-side rejection is a non-success [`ResponseStatus`] in the
    /// returned packet.
    fn exchange(&mut self, cmd: &CommandPacket) -> Result<ResponsePacket>;

    /// Read one streamed page following an accepted exchange.
    ///
    /// Only valid after [`CommandChannel::exchange`] reported
    /// [`ResponseStatus::Success`] for a flash download command, and at most
    /// as many times as that command requested pages.
    fn read_page(&mut self, buf: &mut [u8; PAGE_BYTES]) -> Result<()>;
}

// Blanket impl for boxed channels to allow trait objects
#[cfg(feature = "std")]
impl CommandChannel for std::boxed::Box<dyn CommandChannel + Send> {
    fn exchange(&mut self, cmd: &CommandPacket) -> Result<ResponsePacket> {
        (**self).exchange(cmd)
    }

    fn read_page(&mut self, buf: &mut [u8; PAGE_BYTES]) -> Result<()> {
        (**self).read_page(buf)
    }
}
