//! Endpoint source abstraction.
//!
//! The reporter only sees these traits, so the Windows backend and
//! in-memory test sources are interchangeable.

use super::device::{AudioError, AudioFormat, DeviceState, Direction, StateMask};

/// A single audio endpoint as returned by an enumeration.
pub trait Endpoint {
    /// Human-readable device label.
    fn friendly_name(&self) -> &str;

    /// Opaque device identifier.
    fn id(&self) -> &str;

    fn state(&self) -> DeviceState;

    /// Query the shared-mode mix format.
    ///
    /// This can fail on its own (device busy, not present, no client
    /// available) even though the endpoint itself was enumerated.
    fn mix_format(&self) -> Result<AudioFormat, AudioError>;
}

/// Something that can list audio endpoints.
pub trait EndpointSource {
    type Endpoint: Endpoint;

    /// List endpoints of `direction` whose state is in `states`, in the
    /// order the subsystem reports them.
    fn enumerate_endpoints(
        &self,
        direction: Direction,
        states: StateMask,
    ) -> Result<Vec<Self::Endpoint>, AudioError>;
}

/// Source used when no audio subsystem could be reached.
///
/// Every enumeration fails with the stored reason.
#[derive(Debug, Clone)]
pub struct UnavailableEndpoints {
    reason: String,
}

impl UnavailableEndpoints {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Source for targets without Windows Core Audio.
    pub fn unsupported_platform() -> Self {
        Self::new("Windows Core Audio is not available on this platform")
    }
}

/// Endpoint type of [`UnavailableEndpoints`]; never constructed.
#[derive(Debug)]
pub enum NoEndpoint {}

impl Endpoint for NoEndpoint {
    fn friendly_name(&self) -> &str {
        match *self {}
    }

    fn id(&self) -> &str {
        match *self {}
    }

    fn state(&self) -> DeviceState {
        match *self {}
    }

    fn mix_format(&self) -> Result<AudioFormat, AudioError> {
        match *self {}
    }
}

impl EndpointSource for UnavailableEndpoints {
    type Endpoint = NoEndpoint;

    fn enumerate_endpoints(
        &self,
        _direction: Direction,
        _states: StateMask,
    ) -> Result<Vec<NoEndpoint>, AudioError> {
        Err(AudioError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_fails_every_direction() {
        let source = UnavailableEndpoints::new("audio service stopped");
        for direction in Direction::ALL {
            let err = source
                .enumerate_endpoints(direction, StateMask::ALL)
                .unwrap_err();
            assert_eq!(err.to_string(), "audio service stopped");
        }
    }
}
