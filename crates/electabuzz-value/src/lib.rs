//! Datapoint values and payload codecs.
//!
//! Packet payloads are MessagePack. This crate models the values a datapoint
//! can hold as the [`Value`] sum type, encodes and decodes them, and builds
//! or parses the payloads of the read, write and client-list exchanges.

pub mod decode;
pub mod encode;
pub mod error;
pub mod payload;
pub mod value;

pub use decode::decode_value;
pub use encode::encode_value;
pub use error::{Result, ValueError};
pub use payload::{
    checked_id, decode_read_response, decode_roster, decode_write_response, encode_read_request,
    encode_write_request, DatapointId, ReadOutcome, ReadResults, MAX_DATAPOINT_ID,
};
pub use value::{DataType, ParseDataTypeError, Value};
