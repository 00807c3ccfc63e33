//! Page and chunk readers
//!
//! Every flash transaction moves whole pages. [`read_pages`] issues one
//! download command and drains the promised page stream; [`read_chunk`]
//! resolves an arbitrary byte range into whole-page transactions, going
//! through a scratch page for any partial head or tail so the caller's
//! buffer is never written past the requested range.

use crate::channel::{CommandChannel, CommandPacket};
use crate::error::{Error, Result};
use crate::geom::{offset_in_page, page_base, PAGE_BYTES, TOTAL_FLASH_BYTES};

/// Read `n_pages` whole pages starting at the page-aligned `address`.
///
/// The first `n_pages * PAGE_BYTES` bytes of `buf` are filled. Bounds are
/// checked before any channel traffic. On error the buffer may hold
/// partial data from pages that completed before the failure; the
/// operation as a whole must be treated as failed.
pub fn read_pages<C: CommandChannel + ?Sized>(
    channel: &mut C,
    address: u32,
    buf: &mut [u8],
    n_pages: u32,
) -> Result<()> {
    if n_pages == 0 {
        return Err(Error::InvalidLength);
    }
    let n_bytes = n_pages as u64 * PAGE_BYTES as u64;
    if address as u64 + n_bytes > TOTAL_FLASH_BYTES as u64 {
        return Err(Error::AddressOutOfBounds);
    }
    let n_bytes = n_bytes as usize;
    if buf.len() < n_bytes {
        return Err(Error::BufferTooSmall);
    }

    let cmd = CommandPacket::download_flash(address, n_bytes as u32);
    let resp = channel.exchange(&cmd)?;
    let status = resp.status();
    if !status.is_success() {
        // Do not start draining the page stream on anything but an
        // explicit acknowledgement.
        log::warn!(
            "flash download of {} pages at {:#08x} rejected: {}",
            n_pages,
            address,
            status
        );
        return Err(Error::CommandFailed);
    }

    for chunk in buf[..n_bytes].chunks_exact_mut(PAGE_BYTES) {
        let page: &mut [u8; PAGE_BYTES] =
            chunk.try_into().map_err(|_| Error::BufferTooSmall)?;
        channel.read_page(page)?;
    }

    log::trace!("read {} pages at {:#08x}", n_pages, address);
    Ok(())
}

/// Read an arbitrary byte range into `buf` (length = `buf.len()`).
///
/// A partial head page and a partial tail page each cost one scratch-page
/// transaction; all whole pages in between move in a single transaction
/// straight into `buf`. An empty buffer is a no-op.
pub fn read_chunk<C: CommandChannel + ?Sized>(
    channel: &mut C,
    address: u32,
    buf: &mut [u8],
) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }
    if address as u64 + buf.len() as u64 > TOTAL_FLASH_BYTES as u64 {
        return Err(Error::AddressOutOfBounds);
    }

    let mut page = [0u8; PAGE_BYTES];
    let mut addr = address;
    let mut filled = 0usize;

    let in_page = offset_in_page(addr);
    if in_page != 0 {
        let base = page_base(addr);
        let take = (PAGE_BYTES - in_page).min(buf.len());
        read_pages(channel, base, &mut page, 1)?;
        buf[..take].copy_from_slice(&page[in_page..in_page + take]);
        filled = take;
        addr = base + PAGE_BYTES as u32;
    }

    let whole_pages = (buf.len() - filled) / PAGE_BYTES;
    if whole_pages > 0 {
        let n_bytes = whole_pages * PAGE_BYTES;
        read_pages(
            channel,
            addr,
            &mut buf[filled..filled + n_bytes],
            whole_pages as u32,
        )?;
        filled += n_bytes;
        addr += n_bytes as u32;
    }

    if filled < buf.len() {
        read_pages(channel, addr, &mut page, 1)?;
        let rest = buf.len() - filled;
        buf[filled..].copy_from_slice(&page[..rest]);
    }

    Ok(())
}
