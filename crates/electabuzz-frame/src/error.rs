/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The datagram is shorter than the fixed header.
    #[error("datagram too short for header ({len} bytes, need 8)")]
    Truncated { len: usize },

    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The header's declared payload length disagrees with the datagram.
    #[error("payload length mismatch (header says {declared}, got {actual})")]
    LengthMismatch { declared: u16, actual: usize },

    /// The message type is not part of the protocol.
    #[error("unknown message type 0x{0:04x}")]
    UnknownMessageType(u16),
}

pub type Result<T> = std::result::Result<T, FrameError>;
