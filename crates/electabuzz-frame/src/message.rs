//! Protocol message types.
//!
//! Types are partitioned by range:
//! - `0x0000..=0x0FFF` system and error notifications
//! - `0x1000..=0x1FFF` requests
//! - `0x2000..=0x2FFF` responses (request type + `0x1000`)

use std::fmt;

use crate::error::FrameError;

const REQUEST_BASE: u16 = 0x1000;
const RESPONSE_BASE: u16 = 0x2000;
const RANGE_MASK: u16 = 0xF000;

/// A message type carried in the packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    /// The server failed to process the request.
    ProcessingError = 0x0000,
    /// The server does not support the request type.
    NotSupported = 0x0001,
    /// The server timed out waiting on the datapoint owner.
    Timeout = 0x0002,
    PingReq = 0x1000,
    ReadDataReq = 0x1001,
    WriteDataReq = 0x1002,
    ReadDescReq = 0x1003,
    ClientsReq = 0x1004,
    PingRsp = 0x2000,
    ReadDataRsp = 0x2001,
    WriteDataRsp = 0x2002,
    ReadDescRsp = 0x2003,
    ClientsRsp = 0x2004,
}

impl MessageType {
    /// The raw wire value.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Returns true for types in the system/error range.
    pub fn is_system(self) -> bool {
        self.code() & RANGE_MASK == 0
    }

    /// Returns true for types in the request range.
    pub fn is_request(self) -> bool {
        self.code() & RANGE_MASK == REQUEST_BASE
    }

    /// Returns true for types in the response range.
    pub fn is_response(self) -> bool {
        self.code() & RANGE_MASK == RESPONSE_BASE
    }

    /// The response type that answers this request type.
    ///
    /// Returns `None` for anything that is not a request.
    pub fn response_for(self) -> Option<Self> {
        if !self.is_request() {
            return None;
        }
        Self::try_from(self.code() - REQUEST_BASE + RESPONSE_BASE).ok()
    }

    /// Protocol name of this message type.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProcessingError => "EB_MT_PROCESSING_ERR",
            Self::NotSupported => "EB_MT_NOT_SUPPORTED",
            Self::Timeout => "EB_MT_TIMEOUT",
            Self::PingReq => "EB_MT_PING_REQ",
            Self::ReadDataReq => "EB_MT_READ_DATA_REQ",
            Self::WriteDataReq => "EB_MT_WRITE_DATA_REQ",
            Self::ReadDescReq => "EB_MT_READ_DESC_REQ",
            Self::ClientsReq => "EB_MT_CLIENTS_REQ",
            Self::PingRsp => "EB_MT_PING_RSP",
            Self::ReadDataRsp => "EB_MT_READ_DATA_RSP",
            Self::WriteDataRsp => "EB_MT_WRITE_DATA_RSP",
            Self::ReadDescRsp => "EB_MT_READ_DESC_RSP",
            Self::ClientsRsp => "EB_MT_CLIENTS_RSP",
        }
    }
}

impl TryFrom<u16> for MessageType {
    type Error = FrameError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        let ty = match code {
            0x0000 => Self::ProcessingError,
            0x0001 => Self::NotSupported,
            0x0002 => Self::Timeout,
            0x1000 => Self::PingReq,
            0x1001 => Self::ReadDataReq,
            0x1002 => Self::WriteDataReq,
            0x1003 => Self::ReadDescReq,
            0x1004 => Self::ClientsReq,
            0x2000 => Self::PingRsp,
            0x2001 => Self::ReadDataRsp,
            0x2002 => Self::WriteDataRsp,
            0x2003 => Self::ReadDescRsp,
            0x2004 => Self::ClientsRsp,
            other => return Err(FrameError::UnknownMessageType(other)),
        };
        Ok(ty)
    }
}

impl From<MessageType> for u16 {
    fn from(ty: MessageType) -> Self {
        ty.code()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.name(), self.code())
    }
}
