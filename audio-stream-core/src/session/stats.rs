use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters updated from the audio thread without locking.
#[derive(Debug, Default)]
pub struct SessionCounters {
    frames_sent: AtomicU64,
    frames_dropped: AtomicU64,
    bytes_sent: AtomicU64,
}

impl SessionCounters {
    /// Record a delivered frame. Returns the new sent-frame count.
    pub fn record_sent(&self, bytes: usize) -> u64 {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.frames_sent.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a frame lost to a send failure. Returns the new drop count.
    pub fn record_dropped(&self) -> u64 {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames_sent: u64,
    pub frames_dropped: u64,
    pub bytes_sent: u64,
}

/// Returned by a session after teardown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: String,
    pub duration_secs: f64,
    pub device_name: String,
    pub protocol: String,
    pub target: String,
    pub stats: SessionStats,
}
