//! Reliable-stream transport.
//!
//! Frames are written back to back with no delimiter; the receiver tracks
//! byte offsets itself.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use super::resolve;
use crate::models::config::Protocol;
use crate::models::error::StreamError;
use crate::models::state::ConnectionState;
use crate::traits::transport::Transport;

/// TCP sender. `send` blocks until the whole frame is handed to the kernel.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    peer: Option<SocketAddr>,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), StreamError> {
        let target = format!("{}:{}", host, port);
        if self.stream.is_some() {
            return Err(StreamError::Connection {
                target,
                reason: "already connected".into(),
            });
        }

        let addrs = resolve(host, port)?;

        // Try each resolved address in order; keep the last failure.
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    log::info!("TCP connection established to {}", addr);
                    self.stream = Some(stream);
                    self.peer = Some(addr);
                    return Ok(());
                }
                Err(e) => {
                    log::debug!("TCP connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(StreamError::Connection {
            target,
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no address accepted the connection".into()),
        })
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), StreamError> {
        let stream = self.stream.as_mut().ok_or(StreamError::NotConnected)?;
        write_frame(stream, frame).map_err(|e| StreamError::Send(e.to_string()))
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                log::debug!("TCP shutdown: {}", e);
            }
            log::info!("TCP connection closed");
        }
        self.peer = None;
    }

    fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Tcp
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Write all of `frame`, advancing past partial writes.
///
/// A write interrupted by a signal is retried; any other error, or a write
/// that accepts zero bytes, fails the whole frame.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    let mut offset = 0;
    while offset < frame.len() {
        match writer.write(&frame[offset..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("peer accepted 0 of {} remaining bytes", frame.len() - offset),
                ))
            }
            Ok(n) => offset += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    /// Accepts at most `max_chunk` bytes per write, interrupting every third call.
    struct ChunkedWriter {
        received: Vec<u8>,
        max_chunk: usize,
        calls: usize,
    }

    impl ChunkedWriter {
        fn new(max_chunk: usize) -> Self {
            Self {
                received: Vec::new(),
                max_chunk,
                calls: 0,
            }
        }
    }

    impl Write for ChunkedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % 3 == 0 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.max_chunk);
            self.received.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Accepts `budget` bytes, then fails.
    struct BrokenPipeWriter {
        budget: usize,
    }

    impl Write for BrokenPipeWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn partial_writes_are_drained() {
        let frame: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut writer = ChunkedWriter::new(7);

        write_frame(&mut writer, &frame).unwrap();

        assert_eq!(writer.received, frame);
        assert!(writer.calls > frame.len() / 7);
    }

    #[test]
    fn write_error_fails_frame() {
        let mut writer = BrokenPipeWriter { budget: 10 };
        let err = write_frame(&mut writer, &[0u8; 64]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn zero_length_write_fails_frame() {
        let err = write_frame(&mut ZeroWriter, &[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn empty_frame_needs_no_write() {
        write_frame(&mut ZeroWriter, &[]).unwrap();
    }

    #[test]
    fn send_while_disconnected_fails() {
        let mut transport = TcpTransport::new();
        assert_eq!(transport.send(&[0u8; 16]), Err(StreamError::NotConnected));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut transport = TcpTransport::new();
        transport.disconnect();
        transport.disconnect();
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn unresolvable_host_leaves_disconnected() {
        let mut transport = TcpTransport::new();
        let err = transport.connect("audio-sink.invalid", 8080).unwrap_err();

        assert!(matches!(err, StreamError::Resolution { .. }));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert!(transport.peer_addr().is_none());
    }

    #[test]
    fn refused_connection_leaves_disconnected() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut transport = TcpTransport::new();
        let err = transport.connect("127.0.0.1", port).unwrap_err();

        assert!(matches!(err, StreamError::Connection { .. }));
        assert_eq!(transport.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn frames_arrive_concatenated_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let receiver = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).unwrap();
            received
        });

        // Larger than a typical socket send buffer, so the kernel takes it in pieces.
        let frames: Vec<Vec<u8>> = (0..3u8).map(|i| vec![i; 512 * 1024]).collect();

        let mut transport = TcpTransport::new();
        transport.connect("127.0.0.1", port).unwrap();
        assert_eq!(transport.state(), ConnectionState::Connected);
        for frame in &frames {
            transport.send(frame).unwrap();
        }
        transport.disconnect();

        let received = receiver.join().unwrap();
        assert_eq!(received, frames.concat());
    }

    #[test]
    fn second_connect_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut transport = TcpTransport::new();
        transport.connect("127.0.0.1", port).unwrap();

        let err = transport.connect("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, StreamError::Connection { .. }));
        assert_eq!(transport.state(), ConnectionState::Connected);
    }
}
