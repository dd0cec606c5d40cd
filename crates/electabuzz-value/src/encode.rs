use std::fmt::Display;

use rmp::encode;

use crate::error::{Result, ValueError};
use crate::value::Value;

/// Append the MessagePack encoding of `value` to `dst`.
///
/// Integers use the most compact representation for their numeric value.
/// `F32` is always written as float32 and `F64` as float64.
pub fn encode_value(value: &Value, dst: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Nil => encode::write_nil(dst).map_err(encode_err)?,
        Value::Bool(v) => encode::write_bool(dst, *v).map_err(encode_err)?,
        Value::U8(v) => write_uint(dst, u64::from(*v))?,
        Value::U16(v) => write_uint(dst, u64::from(*v))?,
        Value::U32(v) => write_uint(dst, u64::from(*v))?,
        Value::U64(v) => write_uint(dst, *v)?,
        Value::I8(v) => write_sint(dst, i64::from(*v))?,
        Value::I16(v) => write_sint(dst, i64::from(*v))?,
        Value::I32(v) => write_sint(dst, i64::from(*v))?,
        Value::I64(v) => write_sint(dst, *v)?,
        Value::F32(v) => encode::write_f32(dst, *v).map_err(encode_err)?,
        Value::F64(v) => encode::write_f64(dst, *v).map_err(encode_err)?,
        Value::Str(s) => encode::write_str(dst, s).map_err(encode_err)?,
        Value::Bin(b) => encode::write_bin(dst, b).map_err(encode_err)?,
        Value::Array(items) => {
            encode::write_array_len(dst, container_len(items.len())?).map_err(encode_err)?;
            for item in items {
                encode_value(item, dst)?;
            }
        }
        Value::Map(entries) => {
            encode::write_map_len(dst, container_len(entries.len())?).map_err(encode_err)?;
            for (key, val) in entries {
                encode_value(key, dst)?;
                encode_value(val, dst)?;
            }
        }
    }
    Ok(())
}

fn write_uint(dst: &mut Vec<u8>, v: u64) -> Result<()> {
    encode::write_uint(dst, v).map_err(encode_err)?;
    Ok(())
}

fn write_sint(dst: &mut Vec<u8>, v: i64) -> Result<()> {
    encode::write_sint(dst, v).map_err(encode_err)?;
    Ok(())
}

fn container_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ValueError::Encode(format!("{len} elements exceed u32")))
}

fn encode_err(err: impl Display) -> ValueError {
    ValueError::Encode(err.to_string())
}
