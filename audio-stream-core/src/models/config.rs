use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::error::StreamError;
use crate::processing::frame_codec::BYTES_PER_SAMPLE;
use crate::transport::udp::MAX_IPV4_DATAGRAM_PAYLOAD;

/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Highest accepted interleaved channel count.
pub const MAX_CHANNEL_COUNT: u16 = 64;

/// Largest encoded buffer accepted (16 MiB).
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Capture parameters, fixed for the lifetime of a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Input device name (substring match), or None for the system default.
    pub device_name: Option<String>,

    /// Sample rate in Hz (default: 16000).
    pub sample_rate: u32,

    /// Interleaved channel count (default: 1).
    pub channel_count: u16,

    /// Frames per delivered buffer (default: 4096).
    pub buffer_size: u32,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.sample_rate == 0 {
            return Err(StreamError::Configuration(
                "sample rate must be positive".into(),
            ));
        }
        if self.channel_count == 0 {
            return Err(StreamError::Configuration(
                "channel count must be at least 1".into(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(StreamError::Configuration(
                "buffer size must be positive".into(),
            ));
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(StreamError::Configuration(format!(
                "sample rate {} Hz is above the {} Hz limit",
                self.sample_rate, MAX_SAMPLE_RATE
            )));
        }
        if self.channel_count > MAX_CHANNEL_COUNT {
            return Err(StreamError::Configuration(format!(
                "{} channels is above the {} channel limit",
                self.channel_count, MAX_CHANNEL_COUNT
            )));
        }

        // Checked so a huge buffer cannot wrap on 32-bit targets
        let frame_bytes = (self.buffer_size as usize)
            .checked_mul(self.channel_count as usize)
            .and_then(|samples| samples.checked_mul(BYTES_PER_SAMPLE));
        match frame_bytes {
            Some(bytes) if bytes <= MAX_FRAME_BYTES => Ok(()),
            _ => Err(StreamError::Configuration(format!(
                "{} frames x {} channels is over the {} byte buffer limit",
                self.buffer_size, self.channel_count, MAX_FRAME_BYTES
            ))),
        }
    }

    /// Requested device name, with an empty string treated as "default".
    pub fn requested_device(&self) -> Option<&str> {
        self.device_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Samples in one delivered buffer (`buffer_size × channel_count`).
    pub fn samples_per_buffer(&self) -> usize {
        self.buffer_size as usize * self.channel_count as usize
    }

    /// Encoded size of one buffer on the wire.
    pub fn frame_bytes(&self) -> usize {
        self.samples_per_buffer() * BYTES_PER_SAMPLE
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_name: None,
            sample_rate: 16000,
            channel_count: 1,
            buffer_size: 4096,
        }
    }
}

/// Wire transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Reliable, ordered byte stream.
    #[default]
    Tcp,
    /// Best-effort datagrams, one frame per datagram.
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(StreamError::Configuration(format!(
                "invalid protocol '{}', expected tcp or udp",
                other
            ))),
        }
    }
}

/// Everything a streaming session needs before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Remote host name or address (default: "localhost").
    pub host: String,

    /// Remote port (default: 8080).
    pub port: u16,

    pub protocol: Protocol,

    pub capture: CaptureConfig,

    /// How often the controlling thread checks the stop signal (default: 100ms).
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        self.capture.validate()?;

        if self.host.trim().is_empty() {
            return Err(StreamError::Configuration("server host is empty".into()));
        }
        if self.port == 0 {
            return Err(StreamError::Configuration("server port must be non-zero".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(StreamError::Configuration(
                "poll interval must be positive".into(),
            ));
        }

        // Datagrams are never fragmented: a frame must fit in one.
        if self.protocol == Protocol::Udp {
            let frame_bytes = self.capture.frame_bytes();
            if frame_bytes > MAX_IPV4_DATAGRAM_PAYLOAD {
                return Err(StreamError::Configuration(format!(
                    "{} frames x {} channels encodes to {} bytes, over the {} byte UDP limit; \
                     lower the buffer size or use tcp",
                    self.capture.buffer_size,
                    self.capture.channel_count,
                    frame_bytes,
                    MAX_IPV4_DATAGRAM_PAYLOAD
                )));
            }
        }
        Ok(())
    }

    /// `host:port` for log lines and diagnostics.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8080,
            protocol: Protocol::Tcp,
            capture: CaptureConfig::default(),
            poll_interval: Duration::from_millis(100),
        }
    }
}
