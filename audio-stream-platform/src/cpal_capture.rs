//! Cross-platform microphone capture through cpal.
//!
//! A cpal `Stream` cannot move between threads, so it is built, played and
//! dropped on a dedicated capture thread, the same way the WASAPI backend
//! keeps its COM objects on one thread. Native packets (f32, i16 or u16)
//! are converted to f32 and regrouped into exact periods before reaching
//! the delivery callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, SampleRate, Stream, StreamConfig};
use parking_lot::Mutex;

use audio_stream_core::processing::sample_format::{i16_to_f32, u16_to_f32};
use audio_stream_core::{
    AudioBufferCallback, AudioCapture, AudioDeviceDescriptor, CaptureConfig, CaptureState,
    PeriodBuffer, StreamError,
};

/// Label used when the bound device reports no name.
pub const DEFAULT_DEVICE_LABEL: &str = "Default Input Device";

/// How often the capture thread checks the run flag.
const PARK_INTERVAL: Duration = Duration::from_millis(10);

/// Native formats accepted, most preferred first.
const PREFERRED_FORMATS: [SampleFormat; 3] = [SampleFormat::F32, SampleFormat::I16, SampleFormat::U16];

/// Device and format bound by `initialize`.
#[derive(Debug, Clone)]
struct BoundDevice {
    name: String,
    format: SampleFormat,
    config: CaptureConfig,
}

/// Microphone capture on the default cpal host.
pub struct CpalCapture {
    bound: Option<BoundDevice>,
    state: CaptureState,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self {
            bound: None,
            state: CaptureState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        }
    }

    fn join_capture_thread(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            if handle.join().is_err() {
                log::error!("cpal capture thread panicked");
            }
        }
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the device for `query` (substring match) or the host default.
fn select_device(host: &Host, query: Option<&str>) -> Result<Device, StreamError> {
    match query {
        Some(query) => host
            .input_devices()
            .map_err(|e| StreamError::Device(format!("cannot enumerate input devices: {}", e)))?
            .find(|d| d.name().map(|n| n.contains(query)).unwrap_or(false))
            .ok_or_else(|| StreamError::Device(format!("no input device matching '{}'", query))),
        None => host
            .default_input_device()
            .ok_or_else(|| StreamError::Device("no default input device".into())),
    }
}

/// Pick a native sample format that supports the requested channels and rate.
fn negotiate_format(device: &Device, config: &CaptureConfig) -> Result<SampleFormat, StreamError> {
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| StreamError::Device(format!("cannot query device formats: {}", e)))?
        .filter(|range| {
            range.channels() == config.channel_count
                && range.min_sample_rate().0 <= config.sample_rate
                && config.sample_rate <= range.max_sample_rate().0
        })
        .collect();

    PREFERRED_FORMATS
        .iter()
        .copied()
        .find(|format| ranges.iter().any(|r| r.sample_format() == *format))
        .ok_or_else(|| {
            StreamError::Device(format!(
                "device cannot capture {} Hz x {} ch",
                config.sample_rate, config.channel_count
            ))
        })
}

fn build_stream(
    device: &Device,
    bound: &BoundDevice,
    running: Arc<AtomicBool>,
    callback: AudioBufferCallback,
) -> Result<Stream, StreamError> {
    let stream_config = StreamConfig {
        channels: bound.config.channel_count,
        sample_rate: SampleRate(bound.config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut periods = PeriodBuffer::new(bound.config.samples_per_buffer());
    let mut deliver = move |samples: &[f32]| {
        periods.push(samples, |period| {
            if running.load(Ordering::SeqCst) {
                callback(period);
            }
        });
    };
    let on_error = |err: cpal::StreamError| {
        log::error!("cpal stream error: {}", err);
    };

    let stream = match bound.format {
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| deliver(&i16_to_f32(data)),
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| deliver(&u16_to_f32(data)),
            on_error,
            None,
        ),
        _ => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| deliver(data),
            on_error,
            None,
        ),
    };

    stream.map_err(|e| StreamError::Device(format!("cannot open input stream: {}", e)))
}

/// Capture thread body: open, play, park until stopped, then drop the stream.
fn capture_thread(
    running: Arc<AtomicBool>,
    bound: BoundDevice,
    callback: AudioBufferCallback,
    ready: mpsc::Sender<Result<(), StreamError>>,
) {
    let host = cpal::default_host();
    let opened = select_device(&host, bound.config.requested_device())
        .and_then(|device| build_stream(&device, &bound, Arc::clone(&running), callback))
        .and_then(|stream| {
            stream
                .play()
                .map_err(|e| StreamError::Device(format!("cannot start input stream: {}", e)))?;
            Ok(stream)
        });

    let stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(PARK_INTERVAL);
    }

    if let Err(e) = stream.pause() {
        log::debug!("cpal pause failed: {}", e);
    }
    drop(stream);
}

impl AudioCapture for CpalCapture {
    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor> {
        let host = cpal::default_host();
        let host_name = host.id().name();

        let devices = match host.input_devices() {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("Input device enumeration failed: {}", e);
                return Vec::new();
            }
        };

        devices
            .enumerate()
            .filter_map(|(index, device)| {
                let name = device.name().ok()?;
                let default = device.default_input_config().ok()?;
                if default.channels() == 0 {
                    return None;
                }
                Some(AudioDeviceDescriptor {
                    name,
                    id: format!("{}:{}", host_name, index),
                    channel_count: default.channels(),
                    sample_rate: default.sample_rate().0,
                })
            })
            .collect()
    }

    fn initialize(&mut self, config: &CaptureConfig) -> Result<(), StreamError> {
        if !self.state.is_idle() {
            return Err(StreamError::Device(
                "capture already initialized; stop it first".into(),
            ));
        }
        config.validate()?;

        let host = cpal::default_host();
        let device = select_device(&host, config.requested_device())?;
        let format = negotiate_format(&device, config)?;
        let name = device.name().unwrap_or_else(|_| DEFAULT_DEVICE_LABEL.into());

        log::info!(
            "Bound input device '{}' ({} Hz, {} ch, {:?}, {} frames/buffer)",
            name,
            config.sample_rate,
            config.channel_count,
            format,
            config.buffer_size
        );

        self.bound = Some(BoundDevice {
            name,
            format,
            config: config.clone(),
        });
        self.state = CaptureState::Ready;
        Ok(())
    }

    fn start_capture(&mut self, callback: AudioBufferCallback) -> Result<(), StreamError> {
        let bound = match (&self.bound, self.state) {
            (Some(bound), CaptureState::Ready) => bound.clone(),
            _ => return Err(StreamError::Device("capture not initialized".into())),
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || capture_thread(running, bound, callback, ready_tx))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                StreamError::Device(format!("failed to spawn capture thread: {}", e))
            })?;

        *self.capture_handle.lock() = Some(handle);

        let started = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(StreamError::Device("capture thread exited early".into())));
        if let Err(e) = started {
            self.join_capture_thread();
            return Err(e);
        }

        self.state = CaptureState::Capturing;
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<(), StreamError> {
        self.join_capture_thread();
        if self.bound.take().is_some() {
            log::debug!("cpal capture stopped");
        }
        self.state = CaptureState::Idle;
        Ok(())
    }

    fn current_device_name(&self) -> String {
        self.bound
            .as_ref()
            .map(|b| b.name.clone())
            .unwrap_or_else(|| DEFAULT_DEVICE_LABEL.into())
    }

    fn state(&self) -> CaptureState {
        self.state
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.join_capture_thread();
    }
}
