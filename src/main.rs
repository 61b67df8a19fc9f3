//! imgprobe - single-shot image decode safety probe.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use imgprobe::probe;
use imgprobe::report::ProbeConfig;

/// Probe one image file: decode it, perform a bounds-checked pixel copy,
/// and report whether it is safe to hand onward.
#[derive(Parser, Debug)]
#[command(name = "imgprobe", version, about)]
struct Cli {
    /// Image file to probe.
    image: PathBuf,

    /// Suppress verbose telemetry; print only the verdict.
    #[arg(long)]
    basic: bool,

    /// Write the single-word verdict (success/failure) to this file.
    /// Implies quiet output.
    #[arg(long, value_name = "FILE")]
    resultfile: Option<PathBuf>,
}

impl From<Cli> for ProbeConfig {
    fn from(cli: Cli) -> Self {
        ProbeConfig {
            verbose: !cli.basic && cli.resultfile.is_none(),
            image: cli.image,
            result_file: cli.resultfile,
        }
    }
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ProbeConfig::from(Cli::parse());

    // An unsafe verdict still exits 0; only initialization-class failures
    // (e.g. an unwritable result file) abort with a nonzero code.
    match probe::run(&config) {
        Ok(_safe) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "probe aborted");
            ExitCode::FAILURE
        }
    }
}
