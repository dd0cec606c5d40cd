//! Request and response payloads of the datapoint exchanges.

use std::collections::BTreeMap;

use bytes::Bytes;
use electabuzz_frame::ResultCode;
use tracing::trace;

use crate::decode::decode_value;
use crate::encode::encode_value;
use crate::error::{Result, ValueError};
use crate::value::{DataType, Value};

/// Identifier of one addressable value on the multiplexer.
pub type DatapointId = u16;

/// Largest valid datapoint id.
pub const MAX_DATAPOINT_ID: u64 = DatapointId::MAX as u64;

/// Validate a raw id against the datapoint id range.
pub fn checked_id(raw: impl Into<u64>) -> Result<DatapointId> {
    let raw = raw.into();
    DatapointId::try_from(raw).map_err(|_| ValueError::InvalidDatapointId(Value::U64(raw)))
}

/// Outcome of reading one datapoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    pub datapoint_id: DatapointId,
    pub result_code: ResultCode,
    /// Present only when `result_code` is `Ok`.
    pub value: Option<Value>,
    /// Array length, 1 for scalars, 0 when there is no value.
    pub element_count: usize,
}

impl ReadOutcome {
    fn new(datapoint_id: DatapointId, result_code: ResultCode, value: Option<Value>) -> Self {
        let element_count = value.as_ref().map_or(0, Value::element_count);
        Self {
            datapoint_id,
            result_code,
            value,
            element_count,
        }
    }
}

/// Decoded multi-read response, keyed by datapoint id.
///
/// Holds one entry per requested id. Ids the response did not mention map to
/// `None`; ids the response mentioned without being asked are kept as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadResults {
    entries: BTreeMap<DatapointId, Option<ReadOutcome>>,
}

impl ReadResults {
    /// Prepare an empty entry for every requested id.
    pub fn for_requested(ids: &[DatapointId]) -> Self {
        Self {
            entries: ids.iter().map(|&id| (id, None)).collect(),
        }
    }

    fn insert(&mut self, outcome: ReadOutcome) {
        self.entries.insert(outcome.datapoint_id, Some(outcome));
    }

    /// The outcome for `id`, if the response carried one.
    pub fn get(&self, id: DatapointId) -> Option<&ReadOutcome> {
        self.entries.get(&id).and_then(Option::as_ref)
    }

    /// The value read for `id`, if the read succeeded.
    pub fn value(&self, id: DatapointId) -> Option<&Value> {
        self.get(id).and_then(|outcome| outcome.value.as_ref())
    }

    pub fn contains(&self, id: DatapointId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DatapointId, Option<&ReadOutcome>)> {
        self.entries.iter().map(|(&id, outcome)| (id, outcome.as_ref()))
    }

    /// Outcomes the response actually carried, in id order.
    pub fn outcomes(&self) -> impl Iterator<Item = &ReadOutcome> {
        self.entries.values().filter_map(Option::as_ref)
    }

    /// Requested ids the response did not mention.
    pub fn missing(&self) -> impl Iterator<Item = DatapointId> + '_ {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_none())
            .map(|(&id, _)| id)
    }
}

/// Payload of a read request: the ids in request order, back to back.
pub fn encode_read_request(ids: &[DatapointId]) -> Result<Bytes> {
    let mut buf = Vec::with_capacity(ids.len() * 3);
    for &id in ids {
        encode_value(&Value::U16(id), &mut buf)?;
    }
    Ok(buf.into())
}

/// Payload of a write request: the id followed by the value coerced to `ty`.
pub fn encode_write_request(id: DatapointId, value: Value, ty: DataType) -> Result<Bytes> {
    let mut buf = Vec::new();
    encode_value(&Value::U16(id), &mut buf)?;
    encode_value(&value.coerce_to(ty), &mut buf)?;
    Ok(buf.into())
}

/// Decode a read response: `(id, result code[, value])` triplets until the
/// payload is exhausted. A value follows only when the result code is `Ok`.
pub fn decode_read_response(payload: &[u8], requested: &[DatapointId]) -> Result<ReadResults> {
    let mut results = ReadResults::for_requested(requested);
    let mut cursor = payload;

    while !cursor.is_empty() {
        let id = read_id(&mut cursor)?;
        let result_code = read_result_code(&mut cursor)?;
        let value = if result_code.is_ok() {
            Some(decode_value(&mut cursor)?)
        } else {
            None
        };
        trace!(id, %result_code, "decoded read outcome");
        results.insert(ReadOutcome::new(id, result_code, value));
    }

    Ok(results)
}

/// Decode a write response: one `(id, result code)` pair for `written`.
///
/// An empty payload means the multiplexer did not find the datapoint.
pub fn decode_write_response(payload: &[u8], written: DatapointId) -> Result<ResultCode> {
    if payload.is_empty() {
        return Ok(ResultCode::NotFound);
    }

    let mut cursor = payload;
    let id = read_id(&mut cursor)?;
    if id != written {
        return Err(ValueError::IdMismatch {
            expected: written,
            got: id,
        });
    }
    let result_code = read_result_code(&mut cursor)?;
    ensure_consumed(cursor)?;
    Ok(result_code)
}

/// Decode the client roster of a client-list response.
///
/// The roster layout is defined by the multiplexer; it is returned as a
/// generic value. An empty payload yields [`Value::Nil`].
pub fn decode_roster(payload: &[u8]) -> Result<Value> {
    if payload.is_empty() {
        return Ok(Value::Nil);
    }
    let mut cursor = payload;
    let roster = decode_value(&mut cursor)?;
    ensure_consumed(cursor)?;
    Ok(roster)
}

fn read_id(cursor: &mut &[u8]) -> Result<DatapointId> {
    let raw = decode_value(cursor)?;
    match raw.as_u64().map(DatapointId::try_from) {
        Some(Ok(id)) => Ok(id),
        _ => Err(ValueError::InvalidDatapointId(raw)),
    }
}

fn read_result_code(cursor: &mut &[u8]) -> Result<ResultCode> {
    let raw = decode_value(cursor)?;
    raw.as_u64()
        .and_then(ResultCode::from_code)
        .ok_or(ValueError::UnknownResultCode(raw))
}

fn ensure_consumed(rest: &[u8]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ValueError::TrailingBytes(rest.len()))
    }
}
