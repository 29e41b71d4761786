//! # audio-stream-core
//!
//! Platform-agnostic capture-to-wire core.
//!
//! Platform backends (Windows WASAPI, cpal) implement the `AudioCapture`
//! trait and plug into the generic `StreamingSession`, which encodes every
//! delivered period and pushes it through a `Transport`.
//!
//! ## Architecture
//!
//! ```text
//! audio-stream-core (this crate)
//! ├── traits/       ← AudioCapture, Transport
//! ├── models/       ← StreamError, CaptureState, CaptureConfig, SessionConfig, descriptors
//! ├── processing/   ← frame codec, PeriodBuffer, sample format conversion
//! ├── transport/    ← TcpTransport, UdpTransport, name resolution
//! ├── capture/      ← SilentCapture (no-backend fallback)
//! └── session/      ← StreamingSession, StopSignal, statistics
//! ```
//!
//! ## Wire format
//!
//! Each period becomes `buffer_size × channel_count × 4` bytes of
//! interleaved little-endian f32. No header, no length prefix. Over TCP the
//! frames are concatenated; over UDP each frame is one datagram.

pub mod capture;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;
pub mod transport;

// Re-export key types at crate root for convenience.
pub use capture::SilentCapture;
pub use models::audio_models::{find_device, AudioDeviceDescriptor};
pub use models::config::{
    CaptureConfig, Protocol, SessionConfig, MAX_CHANNEL_COUNT, MAX_FRAME_BYTES, MAX_SAMPLE_RATE,
};
pub use models::error::StreamError;
pub use models::state::{CaptureState, ConnectionState};
pub use processing::frame_codec::{decode_frame, encode_frame};
pub use processing::period_buffer::PeriodBuffer;
pub use session::stats::{SessionStats, SessionSummary};
pub use session::stop_signal::StopSignal;
pub use session::streaming::StreamingSession;
pub use traits::audio_capture::{AudioBufferCallback, AudioCapture};
pub use traits::transport::Transport;
pub use transport::{new_transport, TcpTransport, UdpTransport};
