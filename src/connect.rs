//! Connection-establishment and relay-tunnel helpers (`spec.md` §6):
//! a function that, given host/port/protocol/timeout, returns a connected
//! OS socket, and a function that, given a shared secret, returns a raw
//! TCP stream to the relay plus the SRP role this process must take.
//! Proxy traversal (HTTP-CONNECT/SOCKS4/SOCKS5) is an external
//! collaborator per §1's Non-goals; the shape is modeled here with a
//! plain TCP/UDP default so the crate is runnable end-to-end on its own.

use crate::error::{CoreError, CoreResult};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Transport requested for an outbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    /// SCTP association — no pure-Rust userspace implementation exists in
    /// the ecosystem; a real backend needs a binding to the platform
    /// socket API (`libc::socket(AF_INET, SOCK_STREAM, IPPROTO_SCTP)`).
    Sctp,
}

/// A connected outbound transport. UDP has no connect-time handshake;
/// `connect()` below still performs `UdpSocket::connect` so subsequent
/// `send`/`recv` calls don't need to track a peer address separately.
pub enum Socket {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// `spec.md` §6 "a connection establishment function that, given
/// host/port/protocol/timeout, returns a connected OS socket".
pub trait Connector {
    fn connect(
        &self,
        host: &str,
        port: u16,
        protocol: Protocol,
        timeout: Duration,
    ) -> CoreResult<Socket>;
}

/// Direct TCP/UDP connector with no proxy traversal.
pub struct DirectConnector;

impl Connector for DirectConnector {
    fn connect(
        &self,
        host: &str,
        port: u16,
        protocol: Protocol,
        timeout: Duration,
    ) -> CoreResult<Socket> {
        let addr = resolve_first(host, port)?;
        match protocol {
            Protocol::Tcp => {
                let stream = TcpStream::connect_timeout(&addr, timeout)?;
                stream.set_nodelay(true)?;
                Ok(Socket::Tcp(stream))
            }
            Protocol::Udp => {
                let socket = UdpSocket::bind("0.0.0.0:0")?;
                socket.connect(addr)?;
                Ok(Socket::Udp(socket))
            }
            Protocol::Sctp => Err(CoreError::Protocol(
                "SCTP requires a platform socket binding not available in this build".to_string(),
            )),
        }
    }
}

fn resolve_first(host: &str, port: u16) -> CoreResult<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| CoreError::Protocol(format!("no addresses resolved for {}", host)))
}

/// Which side of the SRP handshake a process must take once the relay
/// hands back a tunnel — assigned by the relay (whichever peer arrived
/// first), not by the process's own listen/connect mode (`spec.md` §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrpRole {
    Server,
    Client,
}

/// `spec.md` §6 "a relay tunnel function that, given a shared secret,
/// returns a raw TCP stream to the relay plus a role". GSRN tunnel
/// discovery itself is an external collaborator (§1); this trait models
/// only the shape the SRP layer needs from it.
pub trait RelayTunnel {
    fn open(&self, secret: &[u8]) -> CoreResult<(TcpStream, SrpRole)>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn direct_connector_establishes_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = DirectConnector;
        let socket = connector
            .connect(
                &addr.ip().to_string(),
                addr.port(),
                Protocol::Tcp,
                Duration::from_secs(1),
            )
            .unwrap();
        assert!(matches!(socket, Socket::Tcp(_)));
    }

    #[test]
    fn sctp_is_rejected_without_platform_binding() {
        let connector = DirectConnector;
        let result = connector.connect("127.0.0.1", 1, Protocol::Sctp, Duration::from_millis(10));
        assert!(result.is_err());
    }
}
