//! Unreliable-datagram transport.
//!
//! Each frame is exactly one datagram payload. Nothing is fragmented or
//! retried; a frame over the datagram limit is rejected before it reaches
//! the socket.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use super::resolve;
use crate::models::config::Protocol;
use crate::models::error::StreamError;
use crate::models::state::ConnectionState;
use crate::traits::transport::Transport;

/// Largest UDP payload over IPv4 (65535 − 8 byte UDP header − 20 byte IP header).
pub const MAX_IPV4_DATAGRAM_PAYLOAD: usize = 65_507;

/// Largest UDP payload over IPv6 without jumbograms (65535 − 8 byte UDP header).
pub const MAX_IPV6_DATAGRAM_PAYLOAD: usize = 65_527;

/// Datagram payload limit for the address family of `target`.
pub fn max_datagram_payload(target: &SocketAddr) -> usize {
    match target {
        SocketAddr::V4(_) => MAX_IPV4_DATAGRAM_PAYLOAD,
        SocketAddr::V6(_) => MAX_IPV6_DATAGRAM_PAYLOAD,
    }
}

/// UDP sender.
///
/// `connect` only resolves the target and binds a local socket; no packet
/// leaves the host until the first `send`.
#[derive(Debug, Default)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    target: Option<SocketAddr>,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved destination address.
    pub fn target_addr(&self) -> Option<SocketAddr> {
        self.target
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl Transport for UdpTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), StreamError> {
        if self.socket.is_some() {
            return Err(StreamError::Connection {
                target: format!("{}:{}", host, port),
                reason: "already connected".into(),
            });
        }

        // First IPv4 address, else whatever resolved first
        let addrs = resolve(host, port)?;
        let target = addrs
            .iter()
            .copied()
            .find(SocketAddr::is_ipv4)
            .unwrap_or(addrs[0]);

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).map_err(|e| StreamError::Connection {
            target: target.to_string(),
            reason: format!("failed to bind UDP socket: {}", e),
        })?;

        log::info!("UDP socket ready, sending to {}", target);
        self.socket = Some(socket);
        self.target = Some(target);
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), StreamError> {
        let (Some(socket), Some(target)) = (self.socket.as_ref(), self.target) else {
            return Err(StreamError::NotConnected);
        };

        let max = max_datagram_payload(&target);
        if frame.len() > max {
            return Err(StreamError::PayloadTooLarge {
                size: frame.len(),
                max,
            });
        }

        let sent = socket
            .send_to(frame, target)
            .map_err(|e| StreamError::Send(format!("{} (packet size: {}B)", e, frame.len())))?;

        if sent != frame.len() {
            return Err(StreamError::Send(format!(
                "datagram truncated: sent {} of {} bytes",
                sent,
                frame.len()
            )));
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            log::info!("UDP socket closed");
        }
        self.target = None;
    }

    fn state(&self) -> ConnectionState {
        if self.socket.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Udp
    }
}
