use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::stats::{SessionCounters, SessionStats, SessionSummary};
use super::stop_signal::StopSignal;
use crate::models::config::SessionConfig;
use crate::models::error::StreamError;
use crate::models::state::ConnectionState;
use crate::processing::frame_codec;
use crate::traits::audio_capture::{AudioBufferCallback, AudioCapture};
use crate::traits::transport::Transport;

/// Progress is logged every this many polls of the stop signal.
const PROGRESS_EVERY_POLLS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Streaming,
    Finished,
}

/// Capture-to-wire session driver.
///
/// Generic over the capture backend and the transport. Data flow:
/// ```text
/// [AudioCapture] → callback(&[f32]) → encode_frame → [Transport::send]
///    audio thread ─────────────────────────────────────────────┘
/// ```
///
/// The transport sits behind a mutex shared with the delivery callback.
/// After `start_capture` only the audio thread touches it; the controlling
/// thread takes the lock again only after `stop_capture` has returned, so
/// the lock is never contended while audio is flowing.
pub struct StreamingSession<C: AudioCapture, T: Transport + 'static> {
    capture: C,
    transport: Arc<Mutex<T>>,
    config: SessionConfig,
    stop: StopSignal,
    counters: Arc<SessionCounters>,
    phase: Phase,
    session_id: uuid::Uuid,
    started_at: Option<(DateTime<Utc>, Instant)>,
}

impl<C: AudioCapture, T: Transport + 'static> StreamingSession<C, T> {
    pub fn new(capture: C, transport: T, config: SessionConfig) -> Self {
        Self {
            capture,
            transport: Arc::new(Mutex::new(transport)),
            config,
            stop: StopSignal::new(),
            counters: Arc::new(SessionCounters::default()),
            phase: Phase::Idle,
            session_id: uuid::Uuid::new_v4(),
            started_at: None,
        }
    }

    /// Use an externally created stop signal (e.g. one already wired to Ctrl+C).
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for stopping the session from another thread.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn transport_state(&self) -> ConnectionState {
        self.transport.lock().state()
    }

    /// Initialize capture, connect, and start streaming.
    ///
    /// On failure everything acquired so far is released before returning.
    pub fn start(&mut self) -> Result<(), StreamError> {
        if self.phase != Phase::Idle {
            return Err(StreamError::Configuration(
                "session can only be started once".into(),
            ));
        }
        self.config.validate()?;

        if let Err(e) = self.capture.initialize(&self.config.capture) {
            self.release_capture();
            return Err(e);
        }
        log::info!("Using device: {}", self.capture.current_device_name());

        let connected = self
            .transport
            .lock()
            .connect(&self.config.host, self.config.port);
        if let Err(e) = connected {
            self.release_capture();
            return Err(e);
        }
        log::info!(
            "Connected to {} over {}",
            self.config.target(),
            self.config.protocol
        );

        self.started_at = Some((Utc::now(), Instant::now()));
        self.phase = Phase::Streaming;

        let callback = self.delivery_callback();
        if let Err(e) = self.capture.start_capture(callback) {
            self.teardown();
            return Err(e);
        }

        log::info!(
            "Streaming {} Hz, {} ch, {} frames per buffer ({} bytes per frame)",
            self.config.capture.sample_rate,
            self.config.capture.channel_count,
            self.config.capture.buffer_size,
            self.config.capture.frame_bytes()
        );
        Ok(())
    }

    /// Block until the stop signal fires.
    ///
    /// Does no audio work; the platform's audio thread drives the callback.
    pub fn run_until_stopped(&self) {
        let mut polls: u64 = 0;
        while !self.stop.is_triggered() {
            thread::sleep(self.config.poll_interval);
            polls += 1;

            if polls % PROGRESS_EVERY_POLLS == 0 {
                let stats = self.counters.snapshot();
                log::info!(
                    "Audio streaming... ({} frames sent, {} dropped, {} bytes)",
                    stats.frames_sent,
                    stats.frames_dropped,
                    stats.bytes_sent
                );
            }
        }
        log::info!("Stop requested");
    }

    /// Stop capture, then disconnect. Safe to call more than once.
    pub fn shutdown(&mut self) -> SessionSummary {
        self.stop.trigger();
        self.teardown();
        self.summary()
    }

    /// Full lifecycle: start, wait for the stop signal, tear down.
    pub fn run(&mut self) -> Result<SessionSummary, StreamError> {
        self.start()?;
        self.run_until_stopped();
        Ok(self.shutdown())
    }

    // --- Internal helpers ---

    /// Build the callback that encodes each period and pushes it downstream.
    ///
    /// Send failures are counted and logged, never propagated.
    fn delivery_callback(&self) -> AudioBufferCallback {
        let transport = Arc::clone(&self.transport);
        let counters = Arc::clone(&self.counters);
        let stop = self.stop.clone();

        Arc::new(move |samples: &[f32]| {
            if stop.is_triggered() {
                return;
            }

            let frame = frame_codec::encode_frame(samples);
            let result = transport.lock().send(&frame);

            match result {
                Ok(()) => {
                    if counters.record_sent(frame.len()) == 1 {
                        log::info!("First frame sent: {} bytes", frame.len());
                    }
                }
                Err(e) => {
                    let dropped = counters.record_dropped();
                    if dropped == 1 {
                        log::warn!("Frame dropped: {}", e);
                    } else {
                        log::debug!("Frame dropped ({} total): {}", dropped, e);
                    }
                }
            }
        })
    }

    /// Ordered, best-effort cleanup: capture first, then transport.
    fn teardown(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        self.release_capture();
        self.transport.lock().disconnect();
        if self.phase == Phase::Streaming {
            self.phase = Phase::Finished;
        }
    }

    fn release_capture(&mut self) {
        if let Err(e) = self.capture.stop_capture() {
            log::error!("Failed to stop capture: {}", e);
        }
    }

    fn summary(&self) -> SessionSummary {
        let (started_at, duration_secs) = match self.started_at {
            Some((wall, mono)) => (wall.to_rfc3339(), mono.elapsed().as_secs_f64()),
            None => (String::new(), 0.0),
        };

        SessionSummary {
            session_id: self.session_id.to_string(),
            started_at,
            duration_secs,
            device_name: self.capture.current_device_name(),
            protocol: self.config.protocol.to_string(),
            target: self.config.target(),
            stats: self.counters.snapshot(),
        }
    }
}
