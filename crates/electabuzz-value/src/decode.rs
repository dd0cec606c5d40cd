use bytes::Buf;
use rmp::Marker;

use crate::error::{Result, ValueError};
use crate::value::Value;

/// Maximum nesting of arrays and maps accepted by the decoder.
pub const MAX_DEPTH: usize = 32;

/// Decode one MessagePack value from the front of `src`, advancing it.
///
/// On error `src` is left at an unspecified position.
pub fn decode_value(src: &mut &[u8]) -> Result<Value> {
    decode_nested(src, 0)
}

fn decode_nested(src: &mut &[u8], depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(ValueError::TooDeep(MAX_DEPTH));
    }

    need(src, 1)?;
    let byte = src.get_u8();
    let value = match Marker::from_u8(byte) {
        Marker::Null => Value::Nil,
        Marker::True => Value::Bool(true),
        Marker::False => Value::Bool(false),
        Marker::FixPos(v) => Value::U8(v),
        Marker::FixNeg(v) => Value::I8(v),
        Marker::U8 => Value::U8(need(src, 1)?.get_u8()),
        Marker::U16 => Value::U16(need(src, 2)?.get_u16()),
        Marker::U32 => Value::U32(need(src, 4)?.get_u32()),
        Marker::U64 => Value::U64(need(src, 8)?.get_u64()),
        Marker::I8 => Value::I8(need(src, 1)?.get_i8()),
        Marker::I16 => Value::I16(need(src, 2)?.get_i16()),
        Marker::I32 => Value::I32(need(src, 4)?.get_i32()),
        Marker::I64 => Value::I64(need(src, 8)?.get_i64()),
        Marker::F32 => Value::F32(need(src, 4)?.get_f32()),
        Marker::F64 => Value::F64(need(src, 8)?.get_f64()),
        Marker::FixStr(len) => read_str(src, usize::from(len))?,
        Marker::Str8 => {
            let len = usize::from(need(src, 1)?.get_u8());
            read_str(src, len)?
        }
        Marker::Str16 => {
            let len = usize::from(need(src, 2)?.get_u16());
            read_str(src, len)?
        }
        Marker::Str32 => {
            let len = need(src, 4)?.get_u32() as usize;
            read_str(src, len)?
        }
        Marker::Bin8 => {
            let len = usize::from(need(src, 1)?.get_u8());
            Value::Bin(take(src, len)?.to_vec())
        }
        Marker::Bin16 => {
            let len = usize::from(need(src, 2)?.get_u16());
            Value::Bin(take(src, len)?.to_vec())
        }
        Marker::Bin32 => {
            let len = need(src, 4)?.get_u32() as usize;
            Value::Bin(take(src, len)?.to_vec())
        }
        Marker::FixArray(len) => read_array(src, usize::from(len), depth)?,
        Marker::Array16 => {
            let len = usize::from(need(src, 2)?.get_u16());
            read_array(src, len, depth)?
        }
        Marker::Array32 => {
            let len = need(src, 4)?.get_u32() as usize;
            read_array(src, len, depth)?
        }
        Marker::FixMap(len) => read_map(src, usize::from(len), depth)?,
        Marker::Map16 => {
            let len = usize::from(need(src, 2)?.get_u16());
            read_map(src, len, depth)?
        }
        Marker::Map32 => {
            let len = need(src, 4)?.get_u32() as usize;
            read_map(src, len, depth)?
        }
        _ => return Err(ValueError::UnsupportedMarker(byte)),
    };
    Ok(value)
}

/// Check that `n` more bytes are available and hand the cursor back.
fn need<'s, 'a>(src: &'s mut &'a [u8], n: usize) -> Result<&'s mut &'a [u8]> {
    if src.len() < n {
        return Err(ValueError::Truncated {
            needed: n - src.len(),
        });
    }
    Ok(src)
}

fn take<'a>(src: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    need(src, len)?;
    let slice: &'a [u8] = *src;
    let (head, rest) = slice.split_at(len);
    *src = rest;
    Ok(head)
}

fn read_str(src: &mut &[u8], len: usize) -> Result<Value> {
    let raw = take(src, len)?;
    let s = std::str::from_utf8(raw).map_err(|_| ValueError::InvalidUtf8)?;
    Ok(Value::Str(s.to_string()))
}

fn read_array(src: &mut &[u8], len: usize, depth: usize) -> Result<Value> {
    // Every element occupies at least one byte.
    let mut items = Vec::with_capacity(len.min(src.len()));
    for _ in 0..len {
        items.push(decode_nested(src, depth + 1)?);
    }
    Ok(Value::Array(items))
}

fn read_map(src: &mut &[u8], len: usize, depth: usize) -> Result<Value> {
    let mut entries = Vec::with_capacity(len.min(src.len() / 2));
    for _ in 0..len {
        let key = decode_nested(src, depth + 1)?;
        let val = decode_nested(src, depth + 1)?;
        entries.push((key, val));
    }
    Ok(Value::Map(entries))
}
