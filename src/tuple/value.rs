use std::fmt;

use bytes::{Buf, BufMut};

use super::DataType;

/// A typed value held in one tuple slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    Text(String),
}

impl Value {
    /// Returns true if this value is storable under the given type
    /// (for `Text(n)`, the string must fit in `n` bytes).
    pub fn matches(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Int(_), DataType::Int) => true,
            (Value::Text(s), DataType::Text(n)) => s.len() <= *n as usize,
            _ => false,
        }
    }

    /// Encodes this value into `buf`, writing exactly `data_type.width()`
    /// bytes. The caller has already validated the value against the type.
    pub fn encode(&self, data_type: &DataType, buf: &mut impl BufMut) {
        match (self, data_type) {
            (Value::Int(v), DataType::Int) => buf.put_i32_le(*v),
            (Value::Text(s), DataType::Text(n)) => {
                let bytes = s.as_bytes();
                buf.put_u32_le(bytes.len() as u32);
                buf.put_slice(bytes);
                buf.put_bytes(0, *n as usize - bytes.len());
            }
            _ => unreachable!("value validated against schema before encode"),
        }
    }

    /// Decodes a value of the given type, consuming exactly
    /// `data_type.width()` bytes from `buf`. Returns None if the image is
    /// malformed (length prefix out of range, invalid UTF-8).
    pub fn decode(data_type: &DataType, buf: &mut impl Buf) -> Option<Value> {
        match data_type {
            DataType::Int => Some(Value::Int(buf.get_i32_le())),
            DataType::Text(n) => {
                let len = buf.get_u32_le() as usize;
                if len > *n as usize {
                    return None;
                }
                let mut data = vec![0u8; *n as usize];
                buf.copy_to_slice(&mut data);
                data.truncate(len);
                String::from_utf8(data).ok().map(Value::Text)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}
