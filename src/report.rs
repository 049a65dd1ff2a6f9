//! Endpoint report.
//!
//! Walks both endpoint directions, prints every Leyline endpoint (or every
//! endpoint with `-all`), and turns subsystem failures into report lines.
//! Nothing in here fails the process.

use crate::audio::{Direction, Endpoint, EndpointSource, StateMask};
use chrono::{DateTime, Local};
use std::io::{self, Write};
use tracing::{debug, error, info, warn};

pub const BANNER: &str = "=== Leyline Audio Driver Endpoint Tester (C++) ===";

/// Substring identifying Leyline endpoints by friendly name.
pub const LEYLINE_MARKER: &str = "Leyline";

/// Flag that disables the Leyline name filter.
pub const ALL_FLAG: &str = "-all";

/// The only exit status the reporter produces.
pub const EXIT_SUCCESS: u8 = 0;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NOT_FOUND_HINT: &str =
    "Device might be hidden, failed to bind Category, or KS topology is disjoint.";

/// True if the friendly name marks a Leyline endpoint.
pub fn is_leyline(friendly_name: &str) -> bool {
    friendly_name.contains(LEYLINE_MARKER)
}

/// Options taken from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Print every endpoint, not only Leyline ones
    pub show_all: bool,
}

impl ReportOptions {
    /// Parse the full argument list. `-all` must match an argument exactly
    /// and may appear anywhere.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self {
            show_all: args.iter().any(|arg| arg.as_ref() == ALL_FLAG),
        }
    }

    /// Whether an endpoint with this name gets printed.
    pub fn includes(&self, friendly_name: &str) -> bool {
        self.show_all || is_leyline(friendly_name)
    }
}

/// What happened for one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectionOutcome {
    /// Enumeration succeeded; `printed` of `total` endpoints were shown.
    Listed { total: usize, printed: usize },

    /// Enumeration failed with `message`.
    Failed { message: String },
}

/// Totals across all directions of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Endpoint blocks printed
    pub printed: usize,

    /// Directions whose enumeration failed
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[DirectionOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome {
                    DirectionOutcome::Listed { printed, .. } => summary.printed += printed,
                    DirectionOutcome::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }
}

/// Prints the endpoint report for a source.
pub struct Reporter<'a, S> {
    source: &'a S,
    options: ReportOptions,
}

impl<'a, S: EndpointSource> Reporter<'a, S> {
    pub fn new(source: &'a S, options: ReportOptions) -> Self {
        Self { source, options }
    }

    /// Print the report stamped with the current local time.
    pub fn run<W: Write>(&self, out: &mut W) -> u8 {
        self.run_at(Local::now(), out)
    }

    /// Print the report stamped with `started`.
    ///
    /// Always returns [`EXIT_SUCCESS`]; a broken output sink is only logged.
    pub fn run_at<W: Write>(&self, started: DateTime<Local>, out: &mut W) -> u8 {
        match self.write_report(started, out) {
            Ok(outcomes) => {
                let summary = RunSummary::from_outcomes(&outcomes);
                info!(
                    printed = summary.printed,
                    failed_directions = summary.failed,
                    "Endpoint report finished"
                );
            }
            Err(e) => error!(error = %e, "Failed to write endpoint report"),
        }
        EXIT_SUCCESS
    }

    /// Write the whole report, returning one outcome per direction.
    pub fn write_report<W: Write>(
        &self,
        started: DateTime<Local>,
        out: &mut W,
    ) -> io::Result<Vec<DirectionOutcome>> {
        writeln!(out, "{BANNER}")?;
        writeln!(
            out,
            "Starting enumeration at {}...",
            started.format(TIMESTAMP_FORMAT)
        )?;

        let mut outcomes = Vec::with_capacity(Direction::ALL.len());
        for direction in Direction::ALL {
            writeln!(out)?;
            writeln!(out, "--- {direction} Endpoints ---")?;
            outcomes.push(self.report_direction(direction, out)?);
        }

        writeln!(out)?;
        writeln!(out, "Enumeration complete.")?;
        out.flush()?;

        Ok(outcomes)
    }

    fn report_direction<W: Write>(
        &self,
        direction: Direction,
        out: &mut W,
    ) -> io::Result<DirectionOutcome> {
        let endpoints = match self.source.enumerate_endpoints(direction, StateMask::ALL) {
            Ok(endpoints) => endpoints,
            Err(err) => {
                let message = single_line(&err.to_string());
                warn!(%direction, error = %message, "Endpoint enumeration failed");
                writeln!(out, "Failed to enumerate {direction}: {message}")?;
                return Ok(DirectionOutcome::Failed { message });
            }
        };

        let mut printed = 0;
        for endpoint in &endpoints {
            if !self.options.includes(endpoint.friendly_name()) {
                debug!(name = endpoint.friendly_name(), "Skipping endpoint");
                continue;
            }
            write_endpoint(endpoint, out)?;
            printed += 1;
        }

        if printed == 0 {
            writeln!(
                out,
                "No {LEYLINE_MARKER} {direction} endpoints found. {NOT_FOUND_HINT}"
            )?;
        }

        info!(%direction, total = endpoints.len(), printed, "Reported endpoints");
        Ok(DirectionOutcome::Listed {
            total: endpoints.len(),
            printed,
        })
    }
}

fn write_endpoint<E: Endpoint, W: Write>(endpoint: &E, out: &mut W) -> io::Result<()> {
    writeln!(out, "[{}] {}", endpoint.state(), endpoint.friendly_name())?;
    writeln!(out, "  ID: {}", endpoint.id())?;

    match endpoint.mix_format() {
        Ok(format) => writeln!(out, "  Format: {format}"),
        Err(err) => {
            let message = single_line(&err.to_string());
            warn!(id = endpoint.id(), error = %message, "Mix format query failed");
            writeln!(out, "  Format Error: {message}")
        }
    }
}

/// Collapse line breaks so an error always prints on one line.
fn single_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse `args`, print the report for `source` to `out`, and return the
/// exit status (always [`EXIT_SUCCESS`]).
pub fn run<S: EndpointSource, W: Write>(args: &[String], source: &S, out: &mut W) -> u8 {
    let options = ReportOptions::from_args(args);
    debug!(show_all = options.show_all, "Parsed options");
    Reporter::new(source, options).run(out)
}
