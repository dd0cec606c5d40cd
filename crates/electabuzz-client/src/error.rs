use electabuzz_frame::ResultCode;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (resolution, socket setup).
    #[error("transport error: {0}")]
    Transport(#[from] electabuzz_transport::TransportError),

    /// Packet encoding error.
    #[error("frame error: {0}")]
    Frame(#[from] electabuzz_frame::FrameError),

    /// Payload encoding or decoding error.
    #[error("payload error: {0}")]
    Value(#[from] electabuzz_value::ValueError),

    /// A datapoint id outside `0..=0xFFFF` was passed in.
    #[error("datapoint id {0} is out of range (0..=0xFFFF)")]
    InvalidDatapoint(u64),

    /// Every attempt of an exchange failed.
    #[error("no valid response after {attempts} attempts ({outcome})")]
    Exhausted { outcome: ResultCode, attempts: u32 },

    /// The multiplexer answered the verification request with an error.
    #[error("multiplexer rejected client list request: {0}")]
    Rejected(ResultCode),

    /// Connection verification failed on every attempt.
    #[error("could not verify connection to {host}:{port} after {attempts} attempts: {last}")]
    Unverified {
        host: String,
        port: u16,
        attempts: u32,
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// The result code that best describes this failure.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::Exhausted { outcome, .. } => *outcome,
            Self::Rejected(code) => *code,
            Self::InvalidDatapoint(_) => ResultCode::WrongParameter,
            Self::Frame(_) | Self::Value(_) => ResultCode::MsgFormat,
            Self::Transport(_) => ResultCode::Connection,
            Self::Unverified { last, .. } => last.result_code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
