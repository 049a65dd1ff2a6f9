//! Leyline Audio Driver endpoint tester.
//!
//! Validates that the driver's endpoints are visible to the Windows audio
//! engine. The report goes to stdout; logs (`RUST_LOG`) go to stderr.

use anyhow::Result;
use leyline_endpoint_tester::audio::UnavailableEndpoints;
use leyline_endpoint_tester::report;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()?;
    Ok(())
}

#[cfg(windows)]
fn report_endpoints<W: Write>(args: &[String], out: &mut W) -> u8 {
    use leyline_endpoint_tester::audio::WasapiEndpoints;

    match WasapiEndpoints::new() {
        Ok(source) => {
            let status = report::run(args, &source, out);
            // Release the enumerator and COM before exiting
            drop(source);
            status
        }
        Err(e) => {
            tracing::warn!(error = %e, "Core Audio is unavailable");
            report::run(args, &UnavailableEndpoints::new(e.to_string()), out)
        }
    }
}

#[cfg(not(windows))]
fn report_endpoints<W: Write>(args: &[String], out: &mut W) -> u8 {
    report::run(args, &UnavailableEndpoints::unsupported_platform(), out)
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Logging disabled: {e:#}");
    }

    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    ExitCode::from(report_endpoints(&args, &mut out))
}
