//! Datapoint client for the Electabuzz multiplexer.
//!
//! A [`Connection`] owns one UDP association and a transaction counter. Each
//! call runs one request/response exchange, retransmitting within a fixed
//! attempt budget until a matching response arrives.

pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
mod exchange;
#[cfg(test)]
mod mock;

pub use config::{ClientConfig, VerifyPolicy, DEFAULT_ATTEMPTS, DEFAULT_RECV_TIMEOUT};
pub use connection::Connection;
pub use connector::{connect, connect_verified, connect_with_config};
pub use error::{ClientError, Result};
