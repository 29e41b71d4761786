use thiserror::Error;

/// Errors that can occur anywhere between the microphone and the wire.
///
/// Startup classes (`Configuration`, `Device`, `Resolution`, `Connection`)
/// abort a session. Send-path classes (`Send`, `NotConnected`,
/// `PayloadTooLarge`) are reported per frame and never end a running stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("audio device error: {0}")]
    Device(String),

    #[error("failed to resolve host '{host}': {reason}")]
    Resolution { host: String, reason: String },

    #[error("failed to connect to {target}: {reason}")]
    Connection { target: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("transport is not connected")]
    NotConnected,

    #[error("payload of {size} bytes exceeds the datagram limit of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },
}

impl StreamError {
    /// Whether this error aborts a session before it reaches steady state.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Device(_)
                | Self::Resolution { .. }
                | Self::Connection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_classes_are_fatal() {
        assert!(StreamError::Configuration("bad rate".into()).is_startup_failure());
        assert!(StreamError::Device("no mic".into()).is_startup_failure());
        assert!(StreamError::Resolution {
            host: "nowhere".into(),
            reason: "lookup failed".into(),
        }
        .is_startup_failure());
        assert!(StreamError::Connection {
            target: "127.0.0.1:1".into(),
            reason: "refused".into(),
        }
        .is_startup_failure());
    }

    #[test]
    fn send_classes_are_not_fatal() {
        assert!(!StreamError::Send("broken pipe".into()).is_startup_failure());
        assert!(!StreamError::NotConnected.is_startup_failure());
        assert!(!StreamError::PayloadTooLarge { size: 70_000, max: 65_507 }.is_startup_failure());
    }

    #[test]
    fn display_messages() {
        let err = StreamError::Resolution {
            host: "mic.invalid".into(),
            reason: "no such host".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to resolve host 'mic.invalid': no such host"
        );
        assert_eq!(StreamError::NotConnected.to_string(), "transport is not connected");
    }
}
