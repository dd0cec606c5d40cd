use std::fmt;
use std::str::FromStr;

/// A datapoint value as carried on the wire.
///
/// Integer variants record the width the value was decoded with (or should
/// be reported as); the encoder always writes integers in their most compact
/// MessagePack form. Floats keep their width, which the multiplexer checks
/// strictly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    /// Key/value pairs in wire order. Used by the client roster.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Returns true for any integer variant.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::U8(_)
                | Self::U16(_)
                | Self::U32(_)
                | Self::U64(_)
                | Self::I8(_)
                | Self::I16(_)
                | Self::I32(_)
                | Self::I64(_)
        )
    }

    /// Returns true for any integer or float variant.
    pub fn is_number(&self) -> bool {
        self.is_integer() || matches!(self, Self::F32(_) | Self::F64(_))
    }

    /// The value as `u64`, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => Some(v),
            Self::I8(v) => u64::try_from(v).ok(),
            Self::I16(v) => u64::try_from(v).ok(),
            Self::I32(v) => u64::try_from(v).ok(),
            Self::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The value as `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::U8(v) => Some(v.into()),
            Self::U16(v) => Some(v.into()),
            Self::U32(v) => Some(v.into()),
            Self::U64(v) => i64::try_from(v).ok(),
            Self::I8(v) => Some(v.into()),
            Self::I16(v) => Some(v.into()),
            Self::I32(v) => Some(v.into()),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    /// The value as `f64`, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(v.into()),
            Self::F64(v) => Some(v),
            Self::U64(v) => Some(v as f64),
            Self::I64(v) => Some(v as f64),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Number of elements: the length of an array, otherwise 1.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Array(items) => items.len(),
            _ => 1,
        }
    }

    /// Coerce the value to the declared datapoint type.
    ///
    /// `Float` turns every numeric or boolean scalar, including each array
    /// element, into `F32`; `Double` does the same into `F64`. Every other
    /// declared type leaves the value as it is.
    pub fn coerce_to(self, ty: DataType) -> Value {
        match ty {
            DataType::Float => self.map_scalars(&|v| Value::F32(v as f32)),
            DataType::Double => self.map_scalars(&Value::F64),
            _ => self,
        }
    }

    fn map_scalars(self, to_float: &impl Fn(f64) -> Value) -> Value {
        match self {
            Self::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(|item| item.map_scalars(to_float))
                    .collect(),
            ),
            Self::Bool(b) => to_float(if b { 1.0 } else { 0.0 }),
            Self::F32(v) => to_float(f64::from(v)),
            other => match other.as_f64() {
                Some(v) => to_float(v),
                None => other,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v:?}"),
            Self::F64(v) => write!(f, "{v:?}"),
            Self::Str(s) => f.write_str(s),
            Self::Bin(bytes) => {
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Str,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Declared type of a datapoint, used as a width hint for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DataType {
    Nil = 0x00,
    Bool = 0x01,
    U8 = 0x02,
    I8 = 0x03,
    U16 = 0x04,
    I16 = 0x05,
    U32 = 0x06,
    I32 = 0x07,
    U64 = 0x08,
    I64 = 0x09,
    /// 32-bit float.
    Float = 0x0A,
    /// 64-bit float.
    Double = 0x0B,
    Str = 0x0C,
    Bin = 0x0D,
    #[default]
    Unknown = 0xFF,
}

impl DataType {
    /// Short lowercase name, e.g. `double`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Str => "str",
            Self::Bin => "bin",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for the signed and unsigned integer types.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::I8 | Self::U16 | Self::I16 | Self::U32 | Self::I32 | Self::U64 | Self::I64
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type '{0}'")]
pub struct ParseDataTypeError(pub String);

impl FromStr for DataType {
    type Err = ParseDataTypeError;

    /// Accepts short names (`double`, `uint16`), Rust-style aliases (`f64`,
    /// `u16`) and the protocol constants (`EB_TYPE_DOUBLE`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("eb_type_").unwrap_or(&lower);
        let ty = match name {
            "nil" => Self::Nil,
            "bool" => Self::Bool,
            "uint8" | "u8" => Self::U8,
            "int8" | "i8" => Self::I8,
            "uint16" | "u16" => Self::U16,
            "int16" | "i16" => Self::I16,
            "uint32" | "u32" => Self::U32,
            "int32" | "i32" => Self::I32,
            "uint64" | "u64" => Self::U64,
            "int64" | "i64" => Self::I64,
            "float" | "f32" => Self::Float,
            "double" | "f64" => Self::Double,
            "str" | "string" => Self::Str,
            "bin" | "binary" => Self::Bin,
            "unknown" | "unkown" => Self::Unknown,
            _ => return Err(ParseDataTypeError(s.to_string())),
        };
        Ok(ty)
    }
}
