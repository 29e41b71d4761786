//! Windows input device enumeration via the MMDevice API.
//!
//! Wraps `IMMDeviceEnumerator` to list active capture endpoints with their
//! friendly names and shared-mode mix format.

use windows::core::*;
use windows::Win32::Devices::FunctionDiscovery::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::StructuredStorage::PropVariantClear;
use windows::Win32::System::Com::*;
use windows::Win32::System::Variant::*;

use audio_stream_core::{AudioDeviceDescriptor, StreamError};

/// Label used when the default endpoint has no readable friendly name.
pub const DEFAULT_DEVICE_LABEL: &str = "Default Microphone";

/// RAII guard pairing `CoInitializeEx` with `CoUninitialize`.
pub(crate) struct ComGuard;

impl ComGuard {
    pub(crate) fn init() -> std::result::Result<Self, StreamError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| StreamError::Device(format!("CoInitializeEx failed: {}", e)))?;
        }
        Ok(Self)
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}

/// Channels and rate of an endpoint that can actually deliver input.
///
/// Endpoints without a readable mix format, or with zero channels, are
/// skipped by the listing.
fn input_format(mix_format: Option<(u16, u32)>) -> Option<(u16, u32)> {
    mix_format.filter(|&(channels, _)| channels > 0)
}

/// Input device enumerator using the Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Create a new device enumerator.
    ///
    /// Requires COM to be initialized on the calling thread.
    pub fn new() -> std::result::Result<Self, StreamError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|e| {
                    StreamError::Device(format!("failed to create enumerator: {}", e))
                })?;
            Ok(Self { enumerator })
        }
    }

    /// List active capture (microphone) endpoints.
    pub fn list_capture_devices(&self) -> std::result::Result<Vec<AudioDeviceDescriptor>, StreamError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eCapture, DEVICE_STATE_ACTIVE)
                .map_err(|e| StreamError::Device(format!("EnumAudioEndpoints failed: {}", e)))?;

            let count = collection
                .GetCount()
                .map_err(|e| StreamError::Device(format!("GetCount failed: {}", e)))?;

            let mut devices = Vec::new();

            for i in 0..count {
                let device = match collection.Item(i) {
                    Ok(d) => d,
                    Err(_) => continue,
                };

                let id = match device.GetId() {
                    Ok(id) => id.to_string().unwrap_or_default(),
                    Err(_) => continue,
                };

                let name = Self::friendly_name(&device).unwrap_or_else(|| format!("Device {}", i));

                let Some((channel_count, sample_rate)) = input_format(Self::mix_format(&device))
                else {
                    continue;
                };

                devices.push(AudioDeviceDescriptor {
                    name,
                    id,
                    channel_count,
                    sample_rate,
                });
            }

            Ok(devices)
        }
    }

    /// ID and friendly name of the default capture endpoint.
    pub fn default_capture_device(&self) -> std::result::Result<(String, String), StreamError> {
        unsafe {
            let device = self
                .enumerator
                .GetDefaultAudioEndpoint(eCapture, eConsole)
                .map_err(|_| StreamError::Device("no default input device".into()))?;

            let id = device
                .GetId()
                .map_err(|e| StreamError::Device(format!("GetId failed: {}", e)))?
                .to_string()
                .unwrap_or_default();

            let name = Self::friendly_name(&device).unwrap_or_else(|| DEFAULT_DEVICE_LABEL.into());
            Ok((id, name))
        }
    }

    /// Look up an endpoint by ID.
    pub fn device(&self, id: &str) -> std::result::Result<IMMDevice, StreamError> {
        let wide_id: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe {
            self.enumerator
                .GetDevice(PCWSTR(wide_id.as_ptr()))
                .map_err(|e| StreamError::Device(format!("device {} unavailable: {}", id, e)))
        }
    }

    /// Check that the endpoint can be opened for capture.
    pub fn probe(&self, id: &str) -> std::result::Result<(), StreamError> {
        let device = self.device(id)?;
        unsafe {
            let _client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| StreamError::Device(format!("cannot open device: {}", e)))?;
        }
        Ok(())
    }

    /// Shared-mode mix format (channels, sample rate) of an endpoint.
    fn mix_format(device: &IMMDevice) -> Option<(u16, u32)> {
        unsafe {
            let client: IAudioClient = device.Activate(CLSCTX_ALL, None).ok()?;
            let format_ptr = client.GetMixFormat().ok()?;
            let format = &*format_ptr;
            let result = (format.nChannels, format.nSamplesPerSec);
            CoTaskMemFree(Some(format_ptr as *const _ as *const _));
            Some(result)
        }
    }

    /// Read the PKEY_Device_FriendlyName property from a device.
    fn friendly_name(device: &IMMDevice) -> Option<String> {
        unsafe {
            let store = device.OpenPropertyStore(STGM_READ).ok()?;

            let mut prop_variant = store.GetValue(&PKEY_Device_FriendlyName).ok()?;

            let name = if prop_variant.Anonymous.Anonymous.vt == VT_LPWSTR {
                let pwsz = prop_variant.Anonymous.Anonymous.Anonymous.pwszVal;
                if !pwsz.is_null() {
                    let len = (0..).take_while(|&i| *pwsz.offset(i) != 0).count();
                    Some(String::from_utf16_lossy(std::slice::from_raw_parts(pwsz, len)))
                } else {
                    None
                }
            } else {
                None
            };

            PropVariantClear(&mut prop_variant).ok();
            name
        }
    }
}
