//! Wire transports.
//!
//! Both variants resolve the host with the system resolver. A lookup
//! failure surfaces as `StreamError::Resolution`.

pub mod tcp;
pub mod udp;

use std::net::{SocketAddr, ToSocketAddrs};

use crate::models::config::Protocol;
use crate::models::error::StreamError;
use crate::traits::transport::Transport;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;

/// Build a disconnected transport for `protocol`.
pub fn new_transport(protocol: Protocol) -> Box<dyn Transport> {
    match protocol {
        Protocol::Tcp => Box::new(TcpTransport::new()),
        Protocol::Udp => Box::new(UdpTransport::new()),
    }
}

/// Resolve `host:port` to numeric addresses, in resolver order.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, StreamError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| StreamError::Resolution {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    if addrs.is_empty() {
        return Err(StreamError::Resolution {
            host: host.to_string(),
            reason: "no addresses returned".into(),
        });
    }

    log::debug!("Resolved {} to {:?}", host, addrs);
    Ok(addrs)
}
