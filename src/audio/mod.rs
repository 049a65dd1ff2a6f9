//! Audio module for Windows Core Audio endpoint enumeration.
//!
//! This module provides the endpoint data model, the source traits the
//! reporter is written against, and the MMDevice-backed implementation.

pub mod device;
#[cfg(windows)]
pub mod enumerator;
pub mod source;

pub use device::{AudioError, AudioFormat, DeviceState, Direction, SampleEncoding, StateMask};
#[cfg(windows)]
pub use enumerator::{ComGuard, WasapiEndpoint, WasapiEndpoints};
pub use source::{Endpoint, EndpointSource, UnavailableEndpoints};
