//! Bounds-safe pixel copy with canary-based overrun detection.
//!
//! The buffer is allocated with a sentinel-filled guard band past the
//! requested copy size. After the decoder's copy returns, the guard band is
//! scanned for sentinel deviation; the canary is the authority, not the
//! decoder's return code. Buffer release on every exit path — normal, early
//! return, or error — is guaranteed by ownership.

use crate::error::{AppResult, ProbeError};
use crate::frame::PixelSource;
use crate::geometry::{FrameGeometry, GUARD_BYTES, SENTINEL_BYTE};

/// Copy the full frame through `source` into a freshly allocated buffer.
///
/// On success the returned buffer holds exactly
/// [`buffer_bytes`](FrameGeometry::buffer_bytes) bytes of pixel data. Any
/// decoder-reported failure propagates unchanged; any write detected past the
/// requested size fails with [`ProbeError::BufferOverrun`] even when the
/// decoder itself signalled success. Failures are terminal — a malformed file
/// or oversized geometry fails identically on retry.
pub fn safe_copy_pixels(source: &dyn PixelSource, geometry: &FrameGeometry) -> AppResult<Vec<u8>> {
    let capacity = geometry
        .buffer_bytes
        .checked_add(GUARD_BYTES)
        .ok_or(ProbeError::SizeOverflow {
            context: "guarded buffer capacity",
        })?;

    let mut buffer = vec![SENTINEL_BYTE; capacity];

    tracing::debug!(
        width = geometry.width,
        height = geometry.height,
        stride = geometry.stride,
        buffer_bytes = geometry.buffer_bytes,
        "invoking decoder pixel copy"
    );
    source.copy_pixels(geometry.stride, &mut buffer)?;

    let tainted = buffer[geometry.buffer_bytes..]
        .iter()
        .filter(|&&b| b != SENTINEL_BYTE)
        .count();
    if tainted > 0 {
        tracing::warn!(tainted, "guard bytes modified past the requested copy size");
        return Err(ProbeError::BufferOverrun { tainted });
    }

    buffer.truncate(geometry.buffer_bytes);
    Ok(buffer)
}
