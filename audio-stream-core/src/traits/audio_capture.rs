use std::sync::Arc;

use crate::models::audio_models::AudioDeviceDescriptor;
use crate::models::config::CaptureConfig;
use crate::models::error::StreamError;
use crate::models::state::CaptureState;

/// Callback invoked once per completed capture period.
///
/// Receives exactly `buffer_size × channel_count` interleaved f32 samples.
/// The slice is only valid for the duration of the call: backends reuse or
/// free the storage as soon as the callback returns.
///
/// Runs on the platform's audio thread. Keep it short and never block on
/// anything the controlling thread might hold.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// Interface for platform-specific microphone capture.
///
/// Implemented by:
/// - `SilentCapture` (no backend compiled in)
/// - `WasapiMicCapture` (Windows)
/// - `CpalCapture` (other hosts, `cpal` feature)
pub trait AudioCapture: Send + Sync {
    /// Input devices reported by the host audio subsystem.
    ///
    /// Never fails; returns an empty list when nothing can be enumerated.
    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor>;

    /// Bind the requested format to a device. Transitions: idle → ready.
    fn initialize(&mut self, config: &CaptureConfig) -> Result<(), StreamError>;

    /// Register `callback` and begin producing periods. Transitions: ready → capturing.
    fn start_capture(&mut self, callback: AudioBufferCallback) -> Result<(), StreamError>;

    /// Halt production, detach the callback, release device resources.
    ///
    /// Idempotent. Once this returns, the callback will not be invoked again.
    fn stop_capture(&mut self) -> Result<(), StreamError>;

    /// Name of the bound device, or a generic label.
    fn current_device_name(&self) -> String;

    fn state(&self) -> CaptureState;
}

impl<C: AudioCapture + ?Sized> AudioCapture for Box<C> {
    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor> {
        (**self).list_input_devices()
    }

    fn initialize(&mut self, config: &CaptureConfig) -> Result<(), StreamError> {
        (**self).initialize(config)
    }

    fn start_capture(&mut self, callback: AudioBufferCallback) -> Result<(), StreamError> {
        (**self).start_capture(callback)
    }

    fn stop_capture(&mut self) -> Result<(), StreamError> {
        (**self).stop_capture()
    }

    fn current_device_name(&self) -> String {
        (**self).current_device_name()
    }

    fn state(&self) -> CaptureState {
        (**self).state()
    }
}
