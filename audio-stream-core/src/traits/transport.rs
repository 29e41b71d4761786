use crate::models::config::Protocol;
use crate::models::error::StreamError;
use crate::models::state::ConnectionState;

/// Interface for the wire side of the pipeline.
///
/// Implemented by `TcpTransport` (reliable stream) and `UdpTransport`
/// (best-effort datagrams).
pub trait Transport: Send {
    /// Resolve `host` and get ready to send. Transitions: disconnected → connected.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), StreamError>;

    /// Push one encoded frame. Fails immediately when disconnected.
    fn send(&mut self, frame: &[u8]) -> Result<(), StreamError>;

    /// Release the socket. Idempotent.
    fn disconnect(&mut self);

    fn state(&self) -> ConnectionState;

    fn protocol(&self) -> Protocol;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), StreamError> {
        (**self).connect(host, port)
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), StreamError> {
        (**self).send(frame)
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }

    fn state(&self) -> ConnectionState {
        (**self).state()
    }

    fn protocol(&self) -> Protocol {
        (**self).protocol()
    }
}
