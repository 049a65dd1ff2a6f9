//! Endpoint enumeration using the Windows MMDevice API.
//!
//! Provides COM initialization and the Core Audio implementation of
//! [`EndpointSource`].

use super::device::{AudioError, AudioFormat, DeviceState, Direction, SampleEncoding, StateMask};
use super::source::{Endpoint, EndpointSource};
use tracing::debug;
use windows::core::GUID;
use windows::Win32::Media::Audio::{
    eCapture, eRender, EDataFlow, IAudioClient, IMMDevice, IMMDeviceEnumerator,
    MMDeviceEnumerator, DEVICE_STATE, WAVEFORMATEX, WAVEFORMATEXTENSIBLE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED, STGM,
};
use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;

// Property key for device friendly name
const PKEY_DEVICE_FRIENDLY_NAME: PROPERTYKEY = PROPERTYKEY {
    fmtid: GUID::from_u128(0xa45c254e_df1c_4efd_8020_67d146a850e0),
    pid: 14,
};

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

// Bytes following WAVEFORMATEX in a WAVEFORMATEXTENSIBLE
const EXTENSIBLE_EXTRA_BYTES: u16 = 22;

const KSDATAFORMAT_SUBTYPE_PCM: GUID = GUID::from_u128(0x00000001_0000_0010_8000_00aa00389b71);
const KSDATAFORMAT_SUBTYPE_IEEE_FLOAT: GUID =
    GUID::from_u128(0x00000003_0000_0010_8000_00aa00389b71);

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM for the current thread.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(|e| AudioError::ComInitFailed(describe(&e)))?;
        }
        Ok(Self { initialized: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// Render a Windows error as `<message> (0xHHHHHHHH)`.
///
/// Many audio HRESULTs carry no system message, in which case only the
/// code is shown.
pub fn describe(err: &windows_core::Error) -> String {
    render_hresult(err.code().0 as u32, &err.message().to_string())
}

fn render_hresult(code: u32, message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        format!("HRESULT 0x{code:08X}")
    } else {
        format!("{message} (0x{code:08X})")
    }
}

fn enumeration_failed(err: windows_core::Error) -> AudioError {
    AudioError::EnumerationFailed(describe(&err))
}

fn format_query_failed(err: windows_core::Error) -> AudioError {
    AudioError::FormatQueryFailed(describe(&err))
}

fn data_flow(direction: Direction) -> EDataFlow {
    match direction {
        Direction::Render => eRender,
        Direction::Capture => eCapture,
    }
}

/// Core Audio endpoint source.
///
/// Owns the COM apartment for its lifetime. Fields drop in declaration
/// order, so the enumerator is released before COM is uninitialized.
pub struct WasapiEndpoints {
    enumerator: IMMDeviceEnumerator,
    _com: ComGuard,
}

impl WasapiEndpoints {
    /// Initialize COM and create the device enumerator.
    pub fn new() -> Result<Self, AudioError> {
        let com = ComGuard::new()?;
        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
                .map_err(enumeration_failed)?;

        Ok(Self {
            enumerator,
            _com: com,
        })
    }
}

impl EndpointSource for WasapiEndpoints {
    type Endpoint = WasapiEndpoint;

    fn enumerate_endpoints(
        &self,
        direction: Direction,
        states: StateMask,
    ) -> Result<Vec<WasapiEndpoint>, AudioError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(data_flow(direction), DEVICE_STATE(states.bits()))
                .map_err(enumeration_failed)?;

            let count = collection.GetCount().map_err(enumeration_failed)?;
            let mut endpoints = Vec::with_capacity(count as usize);

            for i in 0..count {
                let device = collection.Item(i).map_err(enumeration_failed)?;
                endpoints.push(WasapiEndpoint::from_device(device)?);
            }

            debug!(%direction, count, "Enumerated endpoints");
            Ok(endpoints)
        }
    }
}

/// An IMMDevice with its identity read up front.
pub struct WasapiEndpoint {
    device: IMMDevice,
    id: String,
    name: String,
    state: DeviceState,
}

impl WasapiEndpoint {
    fn from_device(device: IMMDevice) -> Result<Self, AudioError> {
        unsafe {
            let id_ptr = device.GetId().map_err(enumeration_failed)?;
            let id = id_ptr.to_string();
            CoTaskMemFree(Some(id_ptr.0 as *const _));
            let id = id.map_err(|e| AudioError::StringConversion(e.to_string()))?;

            let state = device.GetState().map_err(enumeration_failed)?;
            let name = friendly_name(&device).unwrap_or_else(|| "Unknown".to_string());

            Ok(Self {
                device,
                id,
                name,
                state: DeviceState::from_raw(state.0),
            })
        }
    }
}

impl Endpoint for WasapiEndpoint {
    fn friendly_name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn mix_format(&self) -> Result<AudioFormat, AudioError> {
        unsafe {
            let audio_client: IAudioClient = self
                .device
                .Activate(CLSCTX_ALL, None)
                .map_err(format_query_failed)?;

            let format_ptr = audio_client.GetMixFormat().map_err(format_query_failed)?;
            if format_ptr.is_null() {
                return Err(AudioError::FormatQueryFailed(
                    "audio client returned no mix format".to_string(),
                ));
            }

            let format = read_format(format_ptr);
            CoTaskMemFree(Some(format_ptr as *const _));

            Ok(format)
        }
    }
}

/// Get the friendly name of a device from its property store.
fn friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM(0)).ok()?; // STGM_READ = 0
        let prop = store.GetValue(&PKEY_DEVICE_FRIENDLY_NAME).ok()?;

        let name = prop.to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// Decode a WAVEFORMATEX (or WAVEFORMATEXTENSIBLE) returned by GetMixFormat.
///
/// # Safety
/// `ptr` must point to a valid WAVEFORMATEX whose `cbSize` extra bytes
/// are readable.
unsafe fn read_format(ptr: *const WAVEFORMATEX) -> AudioFormat {
    let format = ptr.read_unaligned();
    let tag = format.wFormatTag;
    let extra = format.cbSize;

    let encoding = match tag {
        WAVE_FORMAT_PCM => SampleEncoding::Pcm,
        WAVE_FORMAT_IEEE_FLOAT => SampleEncoding::IeeeFloat,
        WAVE_FORMAT_EXTENSIBLE if extra >= EXTENSIBLE_EXTRA_BYTES => {
            let extensible = (ptr as *const WAVEFORMATEXTENSIBLE).read_unaligned();
            let sub_format = extensible.SubFormat;
            if sub_format == KSDATAFORMAT_SUBTYPE_PCM {
                SampleEncoding::Pcm
            } else if sub_format == KSDATAFORMAT_SUBTYPE_IEEE_FLOAT {
                SampleEncoding::IeeeFloat
            } else {
                SampleEncoding::Extensible(sub_format.to_u128())
            }
        }
        other => SampleEncoding::Other(other),
    };

    AudioFormat {
        sample_rate: format.nSamplesPerSec,
        bit_depth: format.wBitsPerSample,
        channels: format.nChannels,
        encoding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::core::HRESULT;

    fn header(tag: u16, extra: u16) -> WAVEFORMATEX {
        WAVEFORMATEX {
            wFormatTag: tag,
            nChannels: 2,
            nSamplesPerSec: 48_000,
            nAvgBytesPerSec: 48_000 * 8,
            nBlockAlign: 8,
            wBitsPerSample: 32,
            cbSize: extra,
        }
    }

    fn extensible(extra: u16, sub_format: GUID) -> WAVEFORMATEXTENSIBLE {
        // Zeroed first so the Samples union needs no initializer
        let mut format: WAVEFORMATEXTENSIBLE = unsafe { std::mem::zeroed() };
        format.Format = header(WAVE_FORMAT_EXTENSIBLE, extra);
        format.dwChannelMask = 0x3;
        format.SubFormat = sub_format;
        format
    }

    fn decode(format: &WAVEFORMATEXTENSIBLE) -> AudioFormat {
        unsafe { read_format(format as *const WAVEFORMATEXTENSIBLE as *const WAVEFORMATEX) }
    }

    #[test]
    fn test_extensible_float_sub_format() {
        let format = decode(&extensible(22, KSDATAFORMAT_SUBTYPE_IEEE_FLOAT));
        assert_eq!(format.encoding, SampleEncoding::IeeeFloat);
        assert_eq!(format.sample_rate, 48_000);
        assert_eq!(format.bit_depth, 32);
        assert_eq!(format.channels, 2);
    }

    #[test]
    fn test_extensible_pcm_sub_format() {
        let format = decode(&extensible(22, KSDATAFORMAT_SUBTYPE_PCM));
        assert_eq!(format.encoding, SampleEncoding::Pcm);
    }

    #[test]
    fn test_extensible_unknown_sub_format_keeps_guid() {
        let sub_format = GUID::from_u128(0x00000092_0000_0010_8000_00aa00389b71);
        let format = decode(&extensible(22, sub_format));
        assert_eq!(
            format.encoding,
            SampleEncoding::Extensible(0x00000092_0000_0010_8000_00aa00389b71)
        );
    }

    #[test]
    fn test_extensible_tag_without_extension_bytes() {
        let format = decode(&extensible(0, KSDATAFORMAT_SUBTYPE_PCM));
        assert_eq!(format.encoding, SampleEncoding::Other(WAVE_FORMAT_EXTENSIBLE));
    }

    #[test]
    fn test_plain_pcm_and_float_headers() {
        let pcm = header(WAVE_FORMAT_PCM, 0);
        let float = header(WAVE_FORMAT_IEEE_FLOAT, 0);
        unsafe {
            assert_eq!(read_format(&pcm).encoding, SampleEncoding::Pcm);
            assert_eq!(read_format(&float).encoding, SampleEncoding::IeeeFloat);
        }
    }

    #[test]
    fn test_render_hresult_without_message() {
        assert_eq!(render_hresult(0x8889000A, ""), "HRESULT 0x8889000A");
        assert_eq!(render_hresult(0x8889000A, " \r\n"), "HRESULT 0x8889000A");
    }

    #[test]
    fn test_render_hresult_with_message() {
        assert_eq!(
            render_hresult(0x80070490, "Element not found.\r\n"),
            "Element not found. (0x80070490)"
        );
    }

    #[test]
    fn test_describe_includes_code() {
        let err = windows_core::Error::from(HRESULT(0x8889000A_u32 as i32));
        let text = describe(&err);
        assert!(text == "HRESULT 0x8889000A" || text.ends_with(" (0x8889000A)"));
    }
}
