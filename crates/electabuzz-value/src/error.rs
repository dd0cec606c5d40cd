use crate::value::Value;

/// Errors that can occur while encoding or decoding payload values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The payload ended in the middle of a value.
    #[error("payload truncated (needed {needed} more bytes)")]
    Truncated { needed: usize },

    /// A MessagePack marker this protocol does not carry (ext types, reserved).
    #[error("unsupported MessagePack marker 0x{0:02x}")]
    UnsupportedMarker(u8),

    /// A string value was not valid UTF-8.
    #[error("string value is not valid UTF-8")]
    InvalidUtf8,

    /// Values nested deeper than the decoder allows.
    #[error("value nesting exceeds {0} levels")]
    TooDeep(usize),

    /// The value could not be written.
    #[error("failed to encode value: {0}")]
    Encode(String),

    /// A datapoint id is not an integer in `0..=0xFFFF`.
    #[error("invalid datapoint id {0}")]
    InvalidDatapointId(Value),

    /// A result code is not an integer or not a known code.
    #[error("unknown result code {0}")]
    UnknownResultCode(Value),

    /// A write response acknowledged a different datapoint.
    #[error("write response for datapoint 0x{got:04x}, but 0x{expected:04x} was written")]
    IdMismatch { expected: u16, got: u16 },

    /// Bytes remained after the expected content.
    #[error("{0} unexpected trailing bytes in payload")]
    TrailingBytes(usize),
}

pub type Result<T> = std::result::Result<T, ValueError>;
