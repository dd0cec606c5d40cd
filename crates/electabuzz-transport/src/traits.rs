use std::future::Future;
use std::io;

/// A connected, message-oriented link to a single remote endpoint.
///
/// Each `send` transmits exactly one datagram and each `recv` yields exactly
/// one datagram. Implementations must not apply their own timeouts; the
/// caller bounds every `recv`.
pub trait DatagramLink: Send + Sync {
    /// Transmit one datagram.
    fn send(&self, datagram: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Wait for the next datagram and copy it into `buf`.
    ///
    /// Returns the datagram length. A refused or unreachable peer surfaces as
    /// an [`io::ErrorKind::ConnectionRefused`] error.
    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// Returns true if `err` means the peer could not be reached.
pub fn is_refusal(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
    )
}
