//! Decoded-frame abstraction and the `image`-backed decoder.
//!
//! Decoder-agnostic interface for the probe's pixel copy. The probe core only
//! sees [`PixelSource`]; the concrete decoder behind it is the `image` crate,
//! and test doubles implement the same trait to simulate hostile decoders.
//!
//! Loading runs in stages so bad input fails as early and as cheaply as
//! possible: file signature sniff, header-only dimension inspection against
//! the hard ceiling, then the full decode.

use std::io::Cursor;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};

use crate::error::{AppResult, ProbeError};
use crate::geometry::{PixelFormat, MAX_FRAME_DIMENSION};

/// One decoded image plane, as the probe core consumes it.
///
/// Implementations must write at most `stride * height` bytes into the
/// buffer handed to [`copy_pixels`](PixelSource::copy_pixels); the caller
/// verifies that with a sentinel canary rather than trusting the return
/// code.
pub trait PixelSource {
    /// Declared pixel dimensions `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Declared pixel layout.
    fn pixel_format(&self) -> PixelFormat;

    /// Copy the full frame into `buf` at the given row stride.
    fn copy_pixels(&self, stride: usize, buf: &mut [u8]) -> AppResult<()>;
}

/// Frame decoded from a file, with the decoder metadata the report shows.
pub struct DecodedFrame {
    image: DynamicImage,
    format: ImageFormat,
}

impl DecodedFrame {
    /// Container format name, e.g. `Png`.
    pub fn format_name(&self) -> String {
        format!("{:?}", self.format)
    }

    /// MIME type of the container format.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// The decoder's native color type, before any mapping.
    pub fn color_type(&self) -> ColorType {
        self.image.color()
    }
}

impl PixelSource for DecodedFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    fn pixel_format(&self) -> PixelFormat {
        map_color_type(self.image.color())
    }

    fn copy_pixels(&self, stride: usize, buf: &mut [u8]) -> AppResult<()> {
        let (width, height) = self.dimensions();
        match self.pixel_format() {
            PixelFormat::Rgba32 => {
                copy_rows(self.image.to_rgba8().as_raw(), width as usize * 4, height, stride, buf)
            }
            PixelFormat::Bgra32 => {
                let mut raw = self.image.to_rgba8().into_raw();
                for px in raw.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                copy_rows(&raw, width as usize * 4, height, stride, buf)
            }
            PixelFormat::Rgb24 => {
                copy_rows(self.image.to_rgb8().as_raw(), width as usize * 3, height, stride, buf)
            }
            PixelFormat::Gray8 => {
                copy_rows(self.image.to_luma8().as_raw(), width as usize, height, stride, buf)
            }
            // Unrecognized layouts are normalized to 32 bpp RGBA, matching
            // the 32 bpp assumption the geometry made for them.
            PixelFormat::Unknown => {
                copy_rows(self.image.to_rgba8().as_raw(), width as usize * 4, height, stride, buf)
            }
        }
    }
}

/// Map the decoder's color type onto the recognized format set.
pub fn map_color_type(color: ColorType) -> PixelFormat {
    match color {
        ColorType::Rgba8 => PixelFormat::Rgba32,
        ColorType::Rgb8 => PixelFormat::Rgb24,
        ColorType::L8 => PixelFormat::Gray8,
        _ => PixelFormat::Unknown,
    }
}

fn copy_rows(
    src: &[u8],
    row_bytes: usize,
    height: u32,
    stride: usize,
    buf: &mut [u8],
) -> AppResult<()> {
    if stride < row_bytes {
        return Err(ProbeError::Decode(format!(
            "stride {stride} smaller than row length {row_bytes}"
        )));
    }
    for y in 0..height as usize {
        let src_row = src
            .get(y * row_bytes..(y + 1) * row_bytes)
            .ok_or_else(|| ProbeError::Decode("decoded pixel data shorter than declared".into()))?;
        let dst_row = buf
            .get_mut(y * stride..y * stride + row_bytes)
            .ok_or_else(|| ProbeError::Decode("copy buffer shorter than requested".into()))?;
        dst_row.copy_from_slice(src_row);
    }
    Ok(())
}

/// Open and decode frame 0 of an image file.
///
/// Stages: read the raw bytes, verify the file signature is an image type,
/// read dimensions from the header and reject anything past the hard
/// dimension ceiling without decoding, then decode.
pub fn open_frame(path: &Path) -> AppResult<DecodedFrame> {
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read image file");

    validate_signature(&bytes)?;

    let reader = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(ProbeError::Io)?;
    let format = reader
        .format()
        .ok_or_else(|| ProbeError::Decode("unrecognized image format".into()))?;

    let (width, height) = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(ProbeError::Io)?
        .into_dimensions()
        .map_err(|e| ProbeError::Decode(format!("failed to read image header: {e}")))?;
    tracing::debug!(?format, width, height, "image header inspected");

    if width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION {
        return Err(ProbeError::DimensionsTooLarge {
            width,
            height,
            max_dimension: MAX_FRAME_DIMENSION,
        });
    }

    let image = reader
        .decode()
        .map_err(|e| ProbeError::Decode(format!("decode failed: {e}")))?;
    tracing::debug!(color = ?image.color(), "frame decoded");

    Ok(DecodedFrame { image, format })
}

/// Verify the file signature (magic bytes) belongs to an image type.
fn validate_signature(bytes: &[u8]) -> AppResult<()> {
    if bytes.is_empty() {
        return Err(ProbeError::NotAnImage("file is empty".into()));
    }
    let kind = infer::get(bytes)
        .ok_or_else(|| ProbeError::NotAnImage("unrecognized file signature".into()))?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ProbeError::NotAnImage(kind.mime_type().to_string()));
    }
    Ok(())
}
