//! Custom error types for the application.
//!
//! This module defines the primary error type, `ProbeError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of failures a probe run can
//! hit, from I/O and decode problems to geometry-policy rejections.
//!
//! ## Error Hierarchy
//!
//! `ProbeError` consolidates the failure classes of a run:
//!
//! - **`Io`**: Wraps standard `std::io::Error`, covering file reads of the
//!   probed image.
//! - **`NotAnImage` / `Decode`**: The input failed the signature sniff, or the
//!   decoder rejected it (bad path already surfaces as `Io`). Fatal for the
//!   run but reported as a failure verdict, not a crash.
//! - **`DimensionsTooLarge` / `BufferSizeInvalid` / `SizeOverflow`**: The
//!   geometry policy rejected the frame before any copy buffer was allocated.
//! - **`BufferOverrun`**: The canary scan found bytes written past the
//!   requested copy size. Kept distinct from `Decode` so the two are logged
//!   differently.
//! - **`ResultFile`**: The verdict file could not be written. This is the one
//!   initialization-class error that aborts with a nonzero exit code.
//!
//! Every external call's outcome is checked at the call site with `?`; no
//! error passes silently into a later step, and nothing is retried — all
//! failure causes are deterministic for a given input file.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File signature is not an image: {0}")]
    NotAnImage(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Image dimensions too large, possible overflow: {width}x{height} (max {max_dimension})")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },

    #[error("Buffer size too large or zero: {bytes} bytes (max {max_bytes})")]
    BufferSizeInvalid { bytes: usize, max_bytes: usize },

    #[error("Arithmetic overflow computing {context}")]
    SizeOverflow { context: &'static str },

    #[error("Buffer overrun detected after pixel copy: {tainted} guard byte(s) modified")]
    BufferOverrun { tainted: usize },

    #[error("Failed to write result file: {0}")]
    ResultFile(std::io::Error),
}

impl ProbeError {
    /// True for failures that abort the process with a nonzero exit code.
    ///
    /// Everything else collapses to a `failure` verdict with exit code 0.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProbeError::ResultFile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::DimensionsTooLarge {
            width: 20000,
            height: 100,
            max_dimension: 16384,
        };
        assert_eq!(
            err.to_string(),
            "Image dimensions too large, possible overflow: 20000x100 (max 16384)"
        );
    }

    #[test]
    fn test_overrun_is_not_fatal() {
        let err = ProbeError::BufferOverrun { tainted: 1 };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("overrun"));
    }

    #[test]
    fn test_result_file_error_is_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(ProbeError::ResultFile(io).is_fatal());
    }
}
