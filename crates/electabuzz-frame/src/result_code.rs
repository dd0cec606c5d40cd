//! Outcome codes returned per datapoint or per call.

use std::fmt;

/// Result of a datapoint operation.
///
/// Codes up to `0x000F` come from the multiplexer. [`ResultCode::Timeout`] and
/// [`ResultCode::Connection`] are produced locally when an exchange is
/// exhausted without a usable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ResultCode {
    Ok = 0x0000,
    NotFound = 0x0001,
    Other = 0x0004,
    NotUnique = 0x0005,
    NotImplemented = 0x0006,
    WrongParameter = 0x0007,
    NoMemory = 0x0008,
    InternalErr = 0x0009,
    MsgFormat = 0x000A,
    Overflow = 0x000B,
    Type = 0x000C,
    Callback = 0x000D,
    ReadOnly = 0x000E,
    LengthMismatch = 0x000F,
    Timeout = 0x0010,
    Connection = 0xF000,
}

impl ResultCode {
    /// The raw wire value.
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Canonical protocol name, e.g. `EB_ERR_NOT_FOUND`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "EB_OK",
            Self::NotFound => "EB_ERR_NOT_FOUND",
            Self::Other => "EB_ERR_OTHER",
            Self::NotUnique => "EB_ERR_NOT_UNIQUE",
            Self::NotImplemented => "EB_ERR_NOT_IMPLEMENTED",
            Self::WrongParameter => "EB_ERR_WRONG_PARAMETER",
            Self::NoMemory => "EB_ERR_NO_MEMORY",
            Self::InternalErr => "EB_ERR_INTERNAL_ERR",
            Self::MsgFormat => "EB_ERR_MSG_FORMAT",
            Self::Overflow => "EB_ERR_OVERFLOW",
            Self::Type => "EB_ERR_TYPE",
            Self::Callback => "EB_ERR_CALLBACK",
            Self::ReadOnly => "EB_ERR_READ_ONLY",
            Self::LengthMismatch => "EB_ERR_LENGTH_MISMATCH",
            Self::Timeout => "EB_ERR_TIMEOUT",
            Self::Connection => "EB_ERR_CONNECTION",
        }
    }

    /// Look up a code by its raw wire value.
    pub fn from_code(code: u64) -> Option<Self> {
        let rc = match code {
            0x0000 => Self::Ok,
            0x0001 => Self::NotFound,
            0x0004 => Self::Other,
            0x0005 => Self::NotUnique,
            0x0006 => Self::NotImplemented,
            0x0007 => Self::WrongParameter,
            0x0008 => Self::NoMemory,
            0x0009 => Self::InternalErr,
            0x000A => Self::MsgFormat,
            0x000B => Self::Overflow,
            0x000C => Self::Type,
            0x000D => Self::Callback,
            0x000E => Self::ReadOnly,
            0x000F => Self::LengthMismatch,
            0x0010 => Self::Timeout,
            0xF000 => Self::Connection,
            _ => return None,
        };
        Some(rc)
    }
}

impl From<ResultCode> for u16 {
    fn from(rc: ResultCode) -> Self {
        rc.code()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
