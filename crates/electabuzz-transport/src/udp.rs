use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::DatagramLink;

/// Default UDP port of the multiplexer.
pub const DEFAULT_PORT: u16 = 5554;

/// Resolve `host:port` to the first datagram-capable address.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;

    addrs.next().ok_or_else(|| TransportError::NoAddress {
        host: host.to_string(),
        port,
    })
}

/// A UDP socket connected to one remote endpoint.
///
/// Connecting the socket makes the kernel drop datagrams from other sources
/// and lets ICMP port-unreachable replies surface as
/// [`io::ErrorKind::ConnectionRefused`] on the next receive.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpLink {
    /// Resolve `host` and connect a fresh ephemeral socket to it.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let remote = resolve(host, port).await?;
        Self::connect_addr(remote).await
    }

    /// Connect a fresh ephemeral socket to an already resolved address.
    pub async fn connect_addr(remote: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| TransportError::Bind {
                addr: local,
                source,
            })?;
        socket
            .connect(remote)
            .await
            .map_err(|source| TransportError::Connect {
                addr: remote,
                source,
            })?;

        info!(%remote, local = ?socket.local_addr().ok(), "udp association established");
        Ok(Self { socket, remote })
    }

    /// The endpoint this link is connected to.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }
}

impl DatagramLink for UdpLink {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        let sent = self.socket.send(datagram).await?;
        debug!(remote = %self.remote, bytes = sent, "datagram sent");
        Ok(sent)
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let received = self.socket.recv(buf).await?;
        debug!(remote = %self.remote, bytes = received, "datagram received");
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_loopback_literal() {
        let addr = resolve("127.0.0.1", DEFAULT_PORT).await.unwrap();
        assert_eq!(addr, SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)));
    }

    #[tokio::test]
    async fn resolve_rejects_invalid_host() {
        let err = resolve("no such host.invalid", 1).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Resolve { .. } | TransportError::NoAddress { .. }
        ));
    }

    #[tokio::test]
    async fn exchanges_datagrams_with_peer() {
        let peer = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let peer_addr = peer.local_addr().unwrap();

        let link = UdpLink::connect_addr(peer_addr).await.unwrap();
        assert_eq!(link.remote_addr(), peer_addr);

        link.send(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(from.port(), link.local_addr().unwrap().port());

        peer.send_to(b"pong", from).await.unwrap();
        let n = link.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[tokio::test]
    async fn ignores_datagrams_from_other_sources() {
        let peer = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let stranger = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let link = UdpLink::connect_addr(peer.local_addr().unwrap())
            .await
            .unwrap();
        let local = link.local_addr().unwrap();
        let local = SocketAddr::from((Ipv4Addr::LOCALHOST, local.port()));

        stranger.send_to(b"noise", local).await.unwrap();
        peer.send_to(b"real", local).await.unwrap();

        let mut buf = [0u8; 16];
        let n = link.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"real");
    }
}
