//! Packet framing for the Electabuzz datagram protocol.
//!
//! Every datagram carries an 8-byte header followed by a MessagePack payload:
//! - A 2-byte protocol version (always 0)
//! - A 2-byte transaction id correlating a request with its response
//! - A 2-byte message type
//! - A 2-byte payload length
//!
//! All header fields are big-endian.

pub mod codec;
pub mod error;
pub mod message;
pub mod result_code;

pub use codec::{decode_packet, encode_packet, Packet, HEADER_SIZE, MAX_PAYLOAD, VERSION};
pub use error::{FrameError, Result};
pub use message::MessageType;
pub use result_code::ResultCode;
