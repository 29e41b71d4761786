//! # audio-stream-platform
//!
//! Host microphone backends for audio-stream.
//!
//! Provides:
//! - `WasapiMicCapture`: microphone capture via a WASAPI capture endpoint (Windows)
//! - `DeviceEnumerator`: input device enumeration via the MMDevice API (Windows)
//! - `CpalCapture`: microphone capture through cpal (`cpal` feature)
//! - `Backend`: picks one of the above at startup, falling back to the
//!   core's `SilentCapture` when nothing is compiled in
//!
//! ## Usage
//! ```ignore
//! use audio_stream_platform::Backend;
//!
//! let mut capture = Backend::detect().create();
//! for device in capture.list_input_devices() {
//!     println!("{}", device.name);
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use audio_stream_core::{AudioCapture, SilentCapture, StreamError};

#[cfg(feature = "cpal")]
pub mod cpal_capture;
#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod wasapi_mic;

#[cfg(feature = "cpal")]
pub use cpal_capture::CpalCapture;
#[cfg(target_os = "windows")]
pub use device_enumerator::DeviceEnumerator;
#[cfg(target_os = "windows")]
pub use wasapi_mic::WasapiMicCapture;

/// Capture backends compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    #[cfg(target_os = "windows")]
    Wasapi,
    #[cfg(feature = "cpal")]
    Cpal,
    Silent,
}

impl Backend {
    /// Preferred backend for this host.
    #[allow(unreachable_code)]
    pub fn detect() -> Self {
        #[cfg(target_os = "windows")]
        return Self::Wasapi;

        #[cfg(feature = "cpal")]
        return Self::Cpal;

        Self::Silent
    }

    /// Every backend available in this build, preferred first.
    pub fn available() -> Vec<Self> {
        vec![
            #[cfg(target_os = "windows")]
            Self::Wasapi,
            #[cfg(feature = "cpal")]
            Self::Cpal,
            Self::Silent,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(target_os = "windows")]
            Self::Wasapi => "wasapi",
            #[cfg(feature = "cpal")]
            Self::Cpal => "cpal",
            Self::Silent => "silent",
        }
    }

    /// Build a fresh, idle capture for this backend.
    pub fn create(&self) -> Box<dyn AudioCapture> {
        match self {
            #[cfg(target_os = "windows")]
            Self::Wasapi => Box::new(WasapiMicCapture::new()),
            #[cfg(feature = "cpal")]
            Self::Cpal => Box::new(CpalCapture::new()),
            Self::Silent => Box::new(SilentCapture::new()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Self::available()
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::available().iter().map(Backend::name).collect();
                StreamError::Configuration(format!(
                    "audio backend '{}' is not available in this build (available: {})",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Capture for the preferred backend of this host.
pub fn default_capture() -> Box<dyn AudioCapture> {
    Backend::detect().create()
}
