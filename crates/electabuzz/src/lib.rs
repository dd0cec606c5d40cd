//! Client library for the Electabuzz datapoint protocol.
//!
//! Electabuzz is a request/response protocol over UDP for reading and
//! writing numbered datapoints on an embedded multiplexer. Payloads are
//! MessagePack; every request carries a transaction id that the response
//! must echo.
//!
//! # Crate Structure
//!
//! - [`transport`]: Connected UDP link and address resolution
//! - [`frame`]: Packet header codec, message types and result codes
//! - [`value`]: Datapoint values and MessagePack payload codecs
//! - [`client`]: Connection, retry coordination and datapoint operations (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use electabuzz_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use electabuzz_frame::*;
}

/// Re-export value types.
pub mod value {
    pub use electabuzz_value::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use electabuzz_client::*;
}
