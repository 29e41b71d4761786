//! Fallback capture used when no platform backend is compiled in.
//!
//! Not a real-time source: each `start_capture` delivers exactly one period
//! of silence on the calling thread and then goes quiet. It keeps the
//! pipeline exercisable on hosts without audio hardware.

use crate::models::audio_models::AudioDeviceDescriptor;
use crate::models::config::CaptureConfig;
use crate::models::error::StreamError;
use crate::models::state::CaptureState;
use crate::traits::audio_capture::{AudioBufferCallback, AudioCapture};

/// Label reported by `current_device_name`.
pub const SILENT_DEVICE_NAME: &str = "Silent Audio Device";

#[derive(Debug, Default)]
pub struct SilentCapture {
    config: Option<CaptureConfig>,
    state: CaptureState,
}

impl SilentCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioCapture for SilentCapture {
    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor> {
        Vec::new()
    }

    fn initialize(&mut self, config: &CaptureConfig) -> Result<(), StreamError> {
        if !self.state.is_idle() {
            return Err(StreamError::Device(
                "capture already initialized; stop it first".into(),
            ));
        }
        config.validate()?;

        self.config = Some(config.clone());
        self.state = CaptureState::Ready;
        log::debug!("{} initialized", SILENT_DEVICE_NAME);
        Ok(())
    }

    fn start_capture(&mut self, callback: AudioBufferCallback) -> Result<(), StreamError> {
        let config = match (&self.config, self.state) {
            (Some(config), CaptureState::Ready) => config,
            _ => return Err(StreamError::Device("capture not initialized".into())),
        };

        self.state = CaptureState::Capturing;

        // One period, then the callback is dropped
        let silence = vec![0.0f32; config.samples_per_buffer()];
        callback(&silence);
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), StreamError> {
        self.config = None;
        self.state = CaptureState::Idle;
        Ok(())
    }

    fn current_device_name(&self) -> String {
        SILENT_DEVICE_NAME.into()
    }

    fn state(&self) -> CaptureState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording_callback() -> (AudioBufferCallback, Arc<Mutex<Vec<Vec<f32>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: AudioBufferCallback = Arc::new(move |samples: &[f32]| {
            sink.lock().push(samples.to_vec());
        });
        (callback, seen)
    }

    #[test]
    fn delivers_one_silent_period() {
        let config = CaptureConfig {
            sample_rate: 16000,
            channel_count: 1,
            buffer_size: 4,
            ..Default::default()
        };
        let mut capture = SilentCapture::new();
        let (callback, seen) = recording_callback();

        capture.initialize(&config).unwrap();
        capture.start_capture(callback).unwrap();

        assert_eq!(*seen.lock(), vec![vec![0.0f32; 4]]);
        assert!(capture.state().is_capturing());
    }

    #[test]
    fn period_covers_all_channels() {
        let config = CaptureConfig {
            channel_count: 2,
            buffer_size: 8,
            ..Default::default()
        };
        let mut capture = SilentCapture::new();
        let (callback, seen) = recording_callback();

        capture.initialize(&config).unwrap();
        capture.start_capture(callback).unwrap();

        assert_eq!(seen.lock()[0].len(), 16);
    }

    #[test]
    fn start_requires_initialize() {
        let mut capture = SilentCapture::new();
        let (callback, seen) = recording_callback();

        assert!(matches!(
            capture.start_capture(callback),
            Err(StreamError::Device(_))
        ));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn double_initialize_is_rejected() {
        let mut capture = SilentCapture::new();
        capture.initialize(&CaptureConfig::default()).unwrap();
        assert!(capture.initialize(&CaptureConfig::default()).is_err());

        capture.stop_capture().unwrap();
        assert!(capture.initialize(&CaptureConfig::default()).is_ok());
    }

    #[test]
    fn initialize_validates_config() {
        let mut capture = SilentCapture::new();
        let bad = CaptureConfig {
            buffer_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            capture.initialize(&bad),
            Err(StreamError::Configuration(_))
        ));
        assert!(capture.state().is_idle());
    }

    #[test]
    fn oversized_buffer_never_reaches_start() {
        let mut capture = SilentCapture::new();
        let huge = CaptureConfig {
            buffer_size: u32::MAX,
            channel_count: u16::MAX,
            ..Default::default()
        };
        let (callback, seen) = recording_callback();

        assert!(matches!(
            capture.initialize(&huge),
            Err(StreamError::Configuration(_))
        ));
        assert!(capture.start_capture(callback).is_err());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn stop_is_idempotent_and_silent() {
        let mut capture = SilentCapture::new();
        let (callback, seen) = recording_callback();

        // Stop before anything started
        capture.stop_capture().unwrap();

        capture.initialize(&CaptureConfig::default()).unwrap();
        capture.start_capture(callback).unwrap();
        capture.stop_capture().unwrap();
        capture.stop_capture().unwrap();

        assert_eq!(seen.lock().len(), 1);
        assert!(capture.state().is_idle());
    }

    #[test]
    fn no_devices_and_generic_name() {
        let capture = SilentCapture::new();
        assert!(capture.list_input_devices().is_empty());
        assert_eq!(capture.current_device_name(), SILENT_DEVICE_NAME);
    }
}
