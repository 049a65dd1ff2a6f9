//! Leyline Endpoint Tester - Library
//!
//! A diagnostic utility that checks whether the Leyline virtual audio
//! driver's endpoints are visible to the Windows audio engine.
//!
//! ## Features
//!
//! - Enumerates render and capture endpoints in every device state
//! - Reports state, friendly name, device ID and shared-mode mix format
//! - Filters to Leyline endpoints unless `-all` is given
//! - Never fails the process for audio subsystem errors

pub mod audio;
pub mod report;

pub use audio::{AudioError, AudioFormat, DeviceState, Direction, Endpoint, EndpointSource};
pub use report::{run, DirectionOutcome, ReportOptions, Reporter, RunSummary};
