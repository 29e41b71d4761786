/// Capture lifecycle.
///
/// ```text
/// idle → (initialize) → ready → (start_capture) → capturing
///   ↑                                                  │
///   └────────────────── stop_capture ──────────────────┘
/// ```
///
/// `stop_capture` is legal from every state and always lands in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Ready,
    Capturing,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }
}

/// Transport connection state.
///
/// A failed `connect` leaves the transport `Disconnected`; `disconnect` is
/// legal from both states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}
