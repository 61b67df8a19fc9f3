//! The probe pipeline.
//!
//! One linear, fully synchronous sequence per invocation: telemetry
//! checkpoint, decode, telemetry checkpoint, geometry validation, guarded
//! copy, classification, report, optional verdict persistence. Every step's
//! outcome is checked before the next runs, and decoder/buffer resources are
//! scoped to this call — release on every exit path is by ownership.

use crate::classify::classify_frame_safety;
use crate::copy::safe_copy_pixels;
use crate::error::{AppResult, ProbeError};
use crate::frame::{open_frame, PixelSource};
use crate::geometry::validate_frame_geometry;
use crate::report::{write_result, ProbeConfig, Reporter};

/// Execute one probe run.
///
/// Returns the safety verdict. Decode failures, geometry rejections, and
/// overruns all collapse to a `false` verdict and a clean exit; the only
/// error returned to the caller is the initialization-class failure of the
/// result file itself.
pub fn run(config: &ProbeConfig) -> AppResult<bool> {
    let reporter = Reporter::new(config.verbose);

    reporter.header(&config.image);
    reporter.modules("before decode");
    reporter.memory("before decode");
    reporter.security(&config.image);

    let safe = match probe_image(config, &reporter) {
        Ok(safe) => safe,
        Err(err) => {
            match &err {
                ProbeError::BufferOverrun { .. } => {
                    tracing::warn!(error = %err, "overrun detected");
                    reporter.failure("Overrun check", &err);
                }
                _ => {
                    tracing::warn!(error = %err, "probe failed");
                    reporter.failure("Probe", &err);
                }
            }
            false
        }
    };

    reporter.memory("after probe");
    reporter.advisory();
    reporter.verdict(safe);

    if let Some(path) = &config.result_file {
        write_result(path, safe)?;
    }

    Ok(safe)
}

/// Decode, validate, copy, and classify one image.
fn probe_image(config: &ProbeConfig, reporter: &Reporter) -> AppResult<bool> {
    let frame = open_frame(&config.image)?;
    reporter.decoder_info(&frame);
    reporter.modules("after decode");
    reporter.memory("after decode");

    let (width, height) = frame.dimensions();
    let format = frame.pixel_format();

    let geometry = validate_frame_geometry(width, height, format)?;
    reporter.geometry(&geometry);

    let copied = safe_copy_pixels(&frame, &geometry);
    let copy_ok = copied.is_ok();
    match copied {
        Ok(pixels) => reporter.pixel_preview(&pixels),
        Err(err) => reporter.failure("CopyPixels", &err),
    }

    Ok(classify_frame_safety(
        width,
        height,
        geometry.buffer_bytes,
        copy_ok,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::path::PathBuf;

    fn quiet_config(image: PathBuf) -> ProbeConfig {
        ProbeConfig {
            image,
            verbose: false,
            result_file: None,
        }
    }

    #[test]
    fn test_run_on_valid_image_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        RgbaImage::from_pixel(100, 100, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        assert!(run(&quiet_config(path)).unwrap());
    }

    #[test]
    fn test_run_on_missing_file_is_unsafe_but_not_fatal() {
        let config = quiet_config(PathBuf::from("/nonexistent/missing.png"));
        assert!(!run(&config).unwrap());
    }

    #[test]
    fn test_run_on_non_image_payload_is_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"<html>not an image</html>").unwrap();

        assert!(!run(&quiet_config(path)).unwrap());
    }

    #[test]
    fn test_unwritable_result_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let config = ProbeConfig {
            image: path,
            verbose: false,
            result_file: Some(PathBuf::from("/nonexistent/dir/out.txt")),
        };
        let err = run(&config);
        assert!(matches!(err, Err(ProbeError::ResultFile(_))));
    }
}
