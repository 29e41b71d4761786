//! WASAPI microphone capture backend.
//!
//! Captures from a WASAPI capture endpoint in shared mode. The engine is
//! asked for IEEE float at the configured rate and channel count, with
//! automatic format conversion enabled, so every packet is already f32
//! interleaved. Packets are regrouped into exact periods before they reach
//! the delivery callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use windows::core::*;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Threading::*;

use audio_stream_core::{
    find_device, AudioBufferCallback, AudioCapture, AudioDeviceDescriptor, CaptureConfig,
    CaptureState, PeriodBuffer, StreamError,
};

use crate::device_enumerator::{ComGuard, DeviceEnumerator, DEFAULT_DEVICE_LABEL};

/// `WAVE_FORMAT_IEEE_FLOAT`
const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;

/// Engine buffer duration in 100-nanosecond units (100 ms).
const BUFFER_DURATION: i64 = 1_000_000;

/// Sleep between packet polls on the capture thread.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Device bound by `initialize`.
#[derive(Debug, Clone)]
struct BoundDevice {
    id: String,
    name: String,
    config: CaptureConfig,
}

/// WASAPI microphone capture.
///
/// COM objects never leave the capture thread; this struct only holds the
/// bound device ID, the run flag, and the thread handle.
pub struct WasapiMicCapture {
    bound: Option<BoundDevice>,
    state: CaptureState,
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl WasapiMicCapture {
    pub fn new() -> Self {
        Self {
            bound: None,
            state: CaptureState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
        }
    }

    /// Resolve the requested device (substring match) or the system default.
    fn resolve_device(config: &CaptureConfig) -> std::result::Result<(String, String), StreamError> {
        let _com = ComGuard::init()?;
        let enumerator = DeviceEnumerator::new()?;

        let (id, name) = match config.requested_device() {
            Some(query) => {
                let devices = enumerator.list_capture_devices()?;
                let device = find_device(&devices, query).ok_or_else(|| {
                    StreamError::Device(format!("no input device matching '{}'", query))
                })?;
                (device.id.clone(), device.name.clone())
            }
            None => enumerator.default_capture_device()?,
        };

        enumerator.probe(&id)?;
        Ok((id, name))
    }

    fn join_capture_thread(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            if handle.join().is_err() {
                log::error!("Mic capture thread panicked");
            }
        }
    }
}

impl Default for WasapiMicCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCapture for WasapiMicCapture {
    fn list_input_devices(&self) -> Vec<AudioDeviceDescriptor> {
        let listed = ComGuard::init()
            .and_then(|_com| DeviceEnumerator::new()?.list_capture_devices());
        match listed {
            Ok(devices) => devices,
            Err(e) => {
                log::warn!("Input device enumeration failed: {}", e);
                Vec::new()
            }
        }
    }

    fn initialize(&mut self, config: &CaptureConfig) -> std::result::Result<(), StreamError> {
        if !self.state.is_idle() {
            return Err(StreamError::Device(
                "capture already initialized; stop it first".into(),
            ));
        }
        config.validate()?;

        let (id, name) = Self::resolve_device(config)?;
        log::info!(
            "Bound input device '{}' ({} Hz, {} ch, {} frames/buffer)",
            name,
            config.sample_rate,
            config.channel_count,
            config.buffer_size
        );

        self.bound = Some(BoundDevice {
            id,
            name,
            config: config.clone(),
        });
        self.state = CaptureState::Ready;
        Ok(())
    }

    fn start_capture(&mut self, callback: AudioBufferCallback) -> std::result::Result<(), StreamError> {
        let bound = match (&self.bound, self.state) {
            (Some(bound), CaptureState::Ready) => bound.clone(),
            _ => return Err(StreamError::Device("capture not initialized".into())),
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("wasapi-mic-capture".into())
            .spawn(move || {
                if let Err(e) = mic_capture_loop(&running, &bound, callback, &ready_tx) {
                    log::error!("Mic capture error: {}", e);
                    // Only lands if start_capture is still waiting
                    let _ = ready_tx.send(Err(e));
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                StreamError::Device(format!("failed to spawn mic thread: {}", e))
            })?;

        *self.capture_handle.lock() = Some(handle);

        // Wait for the engine to start (or fail) before reporting success
        let started = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(StreamError::Device("mic thread exited early".into())));
        if let Err(e) = started {
            self.join_capture_thread();
            return Err(e);
        }

        self.state = CaptureState::Capturing;
        Ok(())
    }

    fn stop_capture(&mut self) -> std::result::Result<(), StreamError> {
        self.join_capture_thread();
        if self.bound.take().is_some() {
            log::debug!("Mic capture stopped");
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

impl Drop for WasapiMicCapture {
    fn drop(&mut self) {
        self.join_capture_thread();
    }
}

/// Shared-mode IEEE float format for `channels` at `sample_rate`.
fn float_format(channels: u16, sample_rate: u32) -> std::result::Result<WAVEFORMATEX, StreamError> {
    let block_align = channels.checked_mul(4);
    let bytes_per_sec = block_align.and_then(|align| sample_rate.checked_mul(align as u32));

    match (block_align, bytes_per_sec) {
        (Some(block_align), Some(bytes_per_sec)) => Ok(WAVEFORMATEX {
            wFormatTag: WAVE_FORMAT_IEEE_FLOAT,
            nChannels: channels,
            nSamplesPerSec: sample_rate,
            nAvgBytesPerSec: bytes_per_sec,
            nBlockAlign: block_align,
            wBitsPerSample: 32,
            cbSize: 0,
        }),
        _ => Err(StreamError::Device(format!(
            "{} Hz x {} ch cannot be described as a wave format",
            sample_rate, channels
        ))),
    }
}

fn device_error(call: &str, e: Error) -> StreamError {
    StreamError::Device(format!("{} failed: {}", call, e))
}

/// Capture loop running on a dedicated thread.
///
/// Sequence:
/// 1. CoInitializeEx (MTA)
/// 2. Open the bound device and activate IAudioClient
/// 3. Initialize in shared mode with an f32 format and auto-conversion
/// 4. Get IAudioCaptureClient service
/// 5. Register with MMCSS for real-time priority
/// 6. Start, signal readiness, poll for packets until `running` clears
fn mic_capture_loop(
    running: &AtomicBool,
    bound: &BoundDevice,
    callback: AudioBufferCallback,
    ready: &mpsc::Sender<std::result::Result<(), StreamError>>,
) -> std::result::Result<(), StreamError> {
    let _com = ComGuard::init()?;
    let enumerator = DeviceEnumerator::new()?;
    let device = enumerator.device(&bound.id)?;

    let channels = bound.config.channel_count;
    let sample_rate = bound.config.sample_rate;
    let format = float_format(channels, sample_rate)?;

    let mut periods = PeriodBuffer::new(bound.config.samples_per_buffer());

    unsafe {
        let audio_client: IAudioClient = device
            .Activate(CLSCTX_ALL, None)
            .map_err(|e| device_error("Activate", e))?;

        audio_client
            .Initialize(
                AUDCLNT_SHAREMODE_SHARED,
                AUDCLNT_STREAMFLAGS_AUTOCONVERTPCM | AUDCLNT_STREAMFLAGS_SRC_DEFAULT_QUALITY,
                BUFFER_DURATION,
                0,
                &format,
                None,
            )
            .map_err(|e| {
                StreamError::Device(format!(
                    "device cannot capture {} Hz x {} ch: {}",
                    sample_rate, channels, e
                ))
            })?;

        let capture_client: IAudioCaptureClient = audio_client
            .GetService()
            .map_err(|e| device_error("GetService", e))?;

        let mut task_index: u32 = 0;
        let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
        let _mmcss_handle =
            AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index);

        audio_client
            .Start()
            .map_err(|e| device_error("IAudioClient::Start", e))?;

        let _ = ready.send(Ok(()));
        let mut silence = Vec::new();

        while running.load(Ordering::SeqCst) {
            thread::sleep(POLL_INTERVAL);

            let mut packet_length = capture_client
                .GetNextPacketSize()
                .map_err(|e| device_error("GetNextPacketSize", e))?;

            while packet_length > 0 && running.load(Ordering::SeqCst) {
                let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
                let mut num_frames: u32 = 0;
                let mut flags: u32 = 0;

                capture_client
                    .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                    .map_err(|e| device_error("GetBuffer", e))?;

                if num_frames > 0 && !buffer_ptr.is_null() {
                    let total_samples = num_frames as usize * channels as usize;

                    let samples = if flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 {
                        silence.clear();
                        silence.resize(total_samples, 0.0f32);
                        &silence[..]
                    } else {
                        std::slice::from_raw_parts(buffer_ptr as *const f32, total_samples)
                    };

                    periods.push(samples, |period| {
                        if running.load(Ordering::SeqCst) {
                            callback(period);
                        }
                    });
                }

                capture_client
                    .ReleaseBuffer(num_frames)
                    .map_err(|e| device_error("ReleaseBuffer", e))?;

                packet_length = capture_client
                    .GetNextPacketSize()
                    .map_err(|e| device_error("GetNextPacketSize", e))?;
            }
        }

        let _ = audio_client.Stop();
    }

    Ok(())
}
