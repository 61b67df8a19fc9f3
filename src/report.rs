//! Console reporting and verdict persistence.
//!
//! All output policy lives here: the run configuration built once from the
//! parsed arguments, the labeled telemetry sections verbose mode prints, and
//! the single-word result file. Nothing in this module mutates process-wide
//! state.

use std::path::{Path, PathBuf};

use crate::error::{AppResult, ProbeError};
use crate::frame::{DecodedFrame, PixelSource};
use crate::geometry::FrameGeometry;
use crate::telemetry;

/// Run configuration, constructed once from the command line.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Image file to probe.
    pub image: PathBuf,
    /// Print the full telemetry report instead of verdict-only output.
    pub verbose: bool,
    /// Persist the verdict (`success`/`failure`) to this file.
    pub result_file: Option<PathBuf>,
}

/// Formats the report sections for one run.
pub struct Reporter {
    verbose: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Opening lines: target file, timestamp, process identity.
    pub fn header(&self, image: &Path) {
        if !self.verbose {
            return;
        }
        println!("[+] Opening image: {}", image.display());
        println!("Run started        : {}", chrono::Utc::now().to_rfc3339());
        println!("Process ID         : {}", std::process::id());
        println!("Thread ID          : {:?}", std::thread::current().id());
    }

    /// Memory-counter section, skipped silently when unavailable.
    pub fn memory(&self, label: &str) {
        if !self.verbose {
            return;
        }
        let Some(counters) = telemetry::memory_counters() else {
            return;
        };
        println!("\n--- Memory usage: {label} ---");
        println!("Working set        : {} KB", counters.resident_bytes / 1024);
        println!("Virtual size       : {} KB", counters.virtual_bytes / 1024);
        if let Some(peak) = counters.peak_resident_bytes {
            println!("Peak working set   : {} KB", peak / 1024);
        }
        if let Some(peak) = counters.peak_virtual_bytes {
            println!("Peak virtual size  : {} KB", peak / 1024);
        }
        println!("---------------------------");
    }

    /// Loaded-module section, skipped silently when enumeration yields nothing.
    pub fn modules(&self, label: &str) {
        if !self.verbose {
            return;
        }
        let modules = telemetry::loaded_modules();
        if modules.is_empty() {
            return;
        }
        println!("\n=== Loaded modules: {label} ===");
        for module in modules {
            println!(
                "  {:#014x}  {:>8} KB  {}",
                module.base_address,
                module.mapped_bytes / 1024,
                module.path
            );
        }
        println!("============================");
    }

    /// Process security attributes and ownership of the probed file.
    pub fn security(&self, image: &Path) {
        if !self.verbose {
            return;
        }
        if let Some(attrs) = telemetry::process_security() {
            println!("\n--- Process security ---");
            println!("Effective uid/gid  : {}/{}", attrs.effective_uid, attrs.effective_gid);
            if let Some(caps) = attrs.effective_caps {
                println!("Effective caps     : {caps:#018x}");
            }
            if let Some(nnp) = attrs.no_new_privs {
                println!("NoNewPrivs         : {}", if nnp { "yes" } else { "no" });
            }
            if let Some(mode) = attrs.seccomp_mode {
                println!("Seccomp mode       : {mode}");
            }
            println!("Trust tier         : {}", attrs.trust_tier());
        }
        if let Some(ownership) = telemetry::file_ownership(image) {
            println!("\n--- File ownership ---");
            match &ownership.owner {
                Some(name) => println!("Owner              : {} (uid {})", name, ownership.uid),
                None => println!("Owner uid          : {}", ownership.uid),
            }
            println!("Group gid          : {}", ownership.gid);
            println!("Permissions        : {:04o}", ownership.mode);
        }
    }

    /// Decoder metadata for the opened frame.
    pub fn decoder_info(&self, frame: &DecodedFrame) {
        if !self.verbose {
            return;
        }
        let (width, height) = frame.dimensions();
        println!("\n[+] Decoder: {} ({})", frame.format_name(), frame.mime_type());
        println!("[+] Image dimensions: {width}x{height}");
        println!(
            "[+] Pixel format: {:?} -> {}",
            frame.color_type(),
            frame.pixel_format().label()
        );
    }

    /// Geometry line printed before the copy runs.
    pub fn geometry(&self, geometry: &FrameGeometry) {
        if !self.verbose {
            return;
        }
        println!(
            "[+] Copy geometry: stride {} bytes, buffer {} bytes ({} bpp)",
            geometry.stride, geometry.buffer_bytes, geometry.bits_per_pixel
        );
    }

    /// Byte-level preview of the head of the copied buffer.
    pub fn pixel_preview(&self, pixels: &[u8]) {
        if !self.verbose {
            return;
        }
        println!("[+] Buffer head: {}", hex_preview(pixels, 32));
    }

    /// One labeled diagnostic line per failure, verbose mode only.
    pub fn failure(&self, step: &str, err: &ProbeError) {
        if self.verbose {
            eprintln!("[!] {step} failed: {err}");
        }
    }

    /// Hardening notes the verbose report closes with.
    pub fn advisory(&self) {
        if !self.verbose {
            return;
        }
        println!("\n=== Decoder hardening notes ===");
        println!("- Never trust decoder-reported dimensions for buffer allocation.");
        println!("- Validate dimensions and buffer sizes against fixed ceilings before copying.");
        println!("- Check every decoder call's outcome; silent failures hide corruption.");
        println!("===============================");
    }

    /// Final verdict line, printed in every mode.
    pub fn verdict(&self, safe: bool) {
        if safe {
            println!("[+] Pixel copy completed safely.");
        } else {
            println!("[!] Image judged unsafe.");
        }
    }
}

/// Render the first `max` bytes as space-separated hex.
pub fn hex_preview(bytes: &[u8], max: usize) -> String {
    let shown = &bytes[..bytes.len().min(max)];
    let mut out = String::with_capacity(shown.len() * 3);
    for (i, byte) in shown.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    if bytes.len() > max {
        out.push_str(" ..");
    }
    out
}

/// Truncate and rewrite the result file with the single-word verdict.
pub fn write_result(path: &Path, safe: bool) -> AppResult<()> {
    let verdict = if safe { "success" } else { "failure" };
    std::fs::write(path, verdict).map_err(ProbeError::ResultFile)?;
    tracing::debug!(path = %path.display(), verdict, "result file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_preview_formats_and_truncates() {
        assert_eq!(hex_preview(&[0xCD, 0x00, 0xFF], 8), "cd 00 ff");
        assert_eq!(hex_preview(&[1, 2, 3, 4], 2), "01 02 ..");
        assert_eq!(hex_preview(&[], 8), "");
    }

    #[test]
    fn test_write_result_exact_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        write_result(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "success");

        // Rewritten, not appended, on the next run.
        write_result(&path, false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "failure");
    }

    #[test]
    fn test_write_result_unwritable_path_is_result_file_error() {
        let err = write_result(Path::new("/nonexistent/dir/out.txt"), true);
        assert!(matches!(err, Err(ProbeError::ResultFile(_))));
    }
}
