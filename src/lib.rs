//! Core library for the imgprobe diagnostic tool.
//!
//! imgprobe opens a single image file through the decoder, reports decoder
//! metadata, performs a bounds-checked pixel copy with canary-based overrun
//! detection, and instruments the surrounding process (memory counters,
//! loaded modules, security attributes). One file per invocation; nothing
//! persists across runs except the optional single-word result file.

pub mod classify;
pub mod copy;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod probe;
pub mod report;
pub mod telemetry;
