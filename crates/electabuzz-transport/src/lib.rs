//! Datagram transport for the Electabuzz protocol.
//!
//! Resolves the multiplexer's address, binds an ephemeral UDP socket of the
//! matching address family and connects it, so that only datagrams from the
//! multiplexer are delivered.
//!
//! This is the lowest layer. The transaction coordinator is written against
//! the [`DatagramLink`] trait, with [`UdpLink`] as the production
//! implementation.

pub mod error;
pub mod traits;
pub mod udp;

pub use error::{Result, TransportError};
pub use traits::{is_refusal, DatagramLink};
pub use udp::{resolve, UdpLink, DEFAULT_PORT};
