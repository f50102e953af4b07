//! Scan value types and their byte codec
//!
//! Every value the engine can search for or write carries one of a closed
//! set of types with a fixed byte width. The width drives both the scan
//! stride and read/write buffer sizing. Encoding is little-endian.

use super::error::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a scannable value, each with a fixed byte width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Byte,
    Int16,
    Int32,
    Float32,
    Float64,
}

impl ValueType {
    /// All supported value types
    pub const ALL: [ValueType; 5] = [
        ValueType::Byte,
        ValueType::Int16,
        ValueType::Int32,
        ValueType::Float32,
        ValueType::Float64,
    ];

    /// Byte width of this type; constant per type
    pub const fn width(self) -> usize {
        match self {
            ValueType::Byte => 1,
            ValueType::Int16 => 2,
            ValueType::Int32 | ValueType::Float32 => 4,
            ValueType::Float64 => 8,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueType::Byte => "byte",
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Float32 => "float32",
            ValueType::Float64 => "float64",
        };
        f.write_str(label)
    }
}

/// A typed value read from or written to target memory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScanValue {
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Float32(f32),
    Float64(f64),
}

impl ScanValue {
    /// Parses user-supplied text into a value of the given type.
    ///
    /// Integer types reject values outside their representable range with
    /// [`CodecError::OutOfRange`]; float types accept any IEEE-754 literal
    /// including `NaN` and `inf`.
    pub fn parse(text: &str, value_type: ValueType) -> Result<Self, CodecError> {
        let trimmed = text.trim();

        let invalid = || CodecError::InvalidFormat {
            text: text.to_string(),
            value_type,
        };
        let out_of_range = || CodecError::OutOfRange {
            text: text.to_string(),
            value_type,
        };

        match value_type {
            ValueType::Byte | ValueType::Int16 | ValueType::Int32 => {
                let wide: i64 = trimmed.parse().map_err(|_| invalid())?;
                match value_type {
                    ValueType::Byte => u8::try_from(wide)
                        .map(ScanValue::Byte)
                        .map_err(|_| out_of_range()),
                    ValueType::Int16 => i16::try_from(wide)
                        .map(ScanValue::Int16)
                        .map_err(|_| out_of_range()),
                    _ => i32::try_from(wide)
                        .map(ScanValue::Int32)
                        .map_err(|_| out_of_range()),
                }
            }
            ValueType::Float32 => trimmed
                .parse::<f32>()
                .map(ScanValue::Float32)
                .map_err(|_| invalid()),
            ValueType::Float64 => trimmed
                .parse::<f64>()
                .map(ScanValue::Float64)
                .map_err(|_| invalid()),
        }
    }

    /// The type tag of this value
    pub const fn value_type(self) -> ValueType {
        match self {
            ScanValue::Byte(_) => ValueType::Byte,
            ScanValue::Int16(_) => ValueType::Int16,
            ScanValue::Int32(_) => ValueType::Int32,
            ScanValue::Float32(_) => ValueType::Float32,
            ScanValue::Float64(_) => ValueType::Float64,
        }
    }

    /// Byte width of this value
    pub const fn width(self) -> usize {
        self.value_type().width()
    }

    /// Encodes the value as little-endian bytes
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            ScanValue::Byte(v) => v.to_le_bytes().to_vec(),
            ScanValue::Int16(v) => v.to_le_bytes().to_vec(),
            ScanValue::Int32(v) => v.to_le_bytes().to_vec(),
            ScanValue::Float32(v) => v.to_le_bytes().to_vec(),
            ScanValue::Float64(v) => v.to_le_bytes().to_vec(),
        }
    }

    /// Decodes a value of the given type from little-endian bytes.
    /// Returns `None` when fewer than `value_type.width()` bytes are given.
    pub fn from_bytes(bytes: &[u8], value_type: ValueType) -> Option<Self> {
        if bytes.len() < value_type.width() {
            return None;
        }
        let value = match value_type {
            ValueType::Byte => ScanValue::Byte(bytes[0]),
            ValueType::Int16 => ScanValue::Int16(i16::from_le_bytes([bytes[0], bytes[1]])),
            ValueType::Int32 => ScanValue::Int32(i32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            ValueType::Float32 => ScanValue::Float32(f32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            ValueType::Float64 => ScanValue::Float64(f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])),
        };
        Some(value)
    }

    /// Whether this value equals another under the native semantics of its
    /// type. Float `NaN` never matches anything, itself included.
    pub fn matches(self, other: ScanValue) -> bool {
        self == other
    }
}

impl fmt::Display for ScanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanValue::Byte(v) => write!(f, "{}", v),
            ScanValue::Int16(v) => write!(f, "{}", v),
            ScanValue::Int32(v) => write!(f, "{}", v),
            ScanValue::Float32(v) => write!(f, "{}", v),
            ScanValue::Float64(v) => write!(f, "{}", v),
        }
    }
}
