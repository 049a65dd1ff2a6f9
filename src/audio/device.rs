//! Audio endpoint data models.
//!
//! Defines the core data structures for describing audio endpoints:
//! their direction, state, mix format, and the errors raised while
//! querying them.

use std::fmt;
use thiserror::Error;

/// Direction of an audio endpoint (maps to Windows EDataFlow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Playback devices (speakers, headphones, virtual outputs)
    Render,

    /// Recording devices (microphones, line-in, virtual inputs)
    Capture,
}

impl Direction {
    /// Both directions, in reporting order.
    pub const ALL: [Direction; 2] = [Direction::Render, Direction::Capture];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Render => f.write_str("Render"),
            Direction::Capture => f.write_str("Capture"),
        }
    }
}

/// Windows device state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Device is active and available for use
    Active,

    /// Device is disabled in Windows Sound settings
    Disabled,

    /// Device is not present (driver issue)
    NotPresent,

    /// Device is unplugged (for pluggable devices)
    Unplugged,
}

impl DeviceState {
    /// Map a raw DEVICE_STATE value. Unknown values count as not present.
    pub fn from_raw(value: u32) -> Self {
        match value {
            1 => DeviceState::Active,
            2 => DeviceState::Disabled,
            4 => DeviceState::NotPresent,
            8 => DeviceState::Unplugged,
            _ => DeviceState::NotPresent,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceState::Active => "Active",
            DeviceState::Disabled => "Disabled",
            DeviceState::NotPresent => "NotPresent",
            DeviceState::Unplugged => "Unplugged",
        };
        f.write_str(name)
    }
}

/// Set of device states to include in an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMask(u32);

impl StateMask {
    /// Every state: active, disabled, not present and unplugged.
    pub const ALL: StateMask = StateMask(0x0F);

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Sample encoding of a mix format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Integer PCM
    Pcm,

    /// 32/64-bit IEEE floating point
    IeeeFloat,

    /// WAVE_FORMAT_EXTENSIBLE with an unrecognised sub-format GUID
    /// (stored as its 128-bit value)
    Extensible(u128),

    /// Any other format tag, kept raw
    Other(u16),
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleEncoding::Pcm => f.write_str("PCM"),
            SampleEncoding::IeeeFloat => f.write_str("IEEE float"),
            SampleEncoding::Extensible(sub_format) => write!(
                f,
                "extensible {{{:08X}-{:04X}-{:04X}-{:04X}-{:012X}}}",
                sub_format >> 96,
                (sub_format >> 80) & 0xFFFF,
                (sub_format >> 64) & 0xFFFF,
                (sub_format >> 48) & 0xFFFF,
                sub_format & 0xFFFF_FFFF_FFFF,
            ),
            SampleEncoding::Other(tag) => write!(f, "format 0x{tag:04X}"),
        }
    }
}

/// Audio format (sample rate, bit depth, channels, encoding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Bits per sample container (e.g., 16, 24, 32)
    pub bit_depth: u16,

    /// Number of audio channels
    pub channels: u16,

    /// How samples are encoded
    pub encoding: SampleEncoding,
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rate_khz = self.sample_rate as f64 / 1000.0;
        if rate_khz.fract() == 0.0 {
            write!(f, "{}kHz", rate_khz as u32)?;
        } else {
            write!(f, "{:.1}kHz", rate_khz)?;
        }
        write!(
            f,
            "/{}-bit/{}ch {}",
            self.bit_depth, self.channels, self.encoding
        )
    }
}

/// Audio service error types.
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("COM initialization failed: {0}")]
    ComInitFailed(String),

    /// The endpoint list for a direction could not be read.
    #[error("{0}")]
    EnumerationFailed(String),

    /// The shared-mode mix format of an endpoint could not be read.
    #[error("{0}")]
    FormatQueryFailed(String),

    #[error("String conversion error: {0}")]
    StringConversion(String),

    /// No audio subsystem is reachable at all.
    #[error("{0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_display_whole_khz() {
        let format = AudioFormat {
            sample_rate: 48_000,
            bit_depth: 32,
            channels: 2,
            encoding: SampleEncoding::IeeeFloat,
        };
        assert_eq!(format.to_string(), "48kHz/32-bit/2ch IEEE float");
    }

    #[test]
    fn test_format_display_fractional_khz() {
        let format = AudioFormat {
            sample_rate: 44_100,
            bit_depth: 16,
            channels: 1,
            encoding: SampleEncoding::Pcm,
        };
        assert_eq!(format.to_string(), "44.1kHz/16-bit/1ch PCM");
    }

    #[test]
    fn test_format_display_unknown_tag() {
        let format = AudioFormat {
            sample_rate: 96_000,
            bit_depth: 24,
            channels: 8,
            encoding: SampleEncoding::Other(0x92),
        };
        assert_eq!(format.to_string(), "96kHz/24-bit/8ch format 0x0092");
    }

    #[test]
    fn test_state_from_raw() {
        assert_eq!(DeviceState::from_raw(1), DeviceState::Active);
        assert_eq!(DeviceState::from_raw(2), DeviceState::Disabled);
        assert_eq!(DeviceState::from_raw(4), DeviceState::NotPresent);
        assert_eq!(DeviceState::from_raw(8), DeviceState::Unplugged);
        assert_eq!(DeviceState::from_raw(0x10), DeviceState::NotPresent);
    }

    #[test]
    fn test_format_display_unknown_extensible_sub_format() {
        let format = AudioFormat {
            sample_rate: 48_000,
            bit_depth: 16,
            channels: 6,
            encoding: SampleEncoding::Extensible(0x00000092_0000_0010_8000_00aa00389b71),
        };
        assert_eq!(
            format.to_string(),
            "48kHz/16-bit/6ch extensible {00000092-0000-0010-8000-00AA00389B71}"
        );
    }

    #[test]
    fn test_state_mask_all_covers_every_state() {
        assert_eq!(StateMask::ALL.bits(), 0x1 | 0x2 | 0x4 | 0x8);
    }

    #[test]
    fn test_direction_order_and_names() {
        assert_eq!(Direction::ALL, [Direction::Render, Direction::Capture]);
        assert_eq!(Direction::Render.to_string(), "Render");
        assert_eq!(Direction::Capture.to_string(), "Capture");
    }

    #[test]
    fn test_enumeration_error_displays_bare_message() {
        let err = AudioError::EnumerationFailed("service unavailable".to_string());
        assert_eq!(err.to_string(), "service unavailable");
    }
}
