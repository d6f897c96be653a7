use std::fmt;

/// Data types storable in a tuple slot. Every type occupies a fixed number
/// of bytes so that a page can hold a packed array of equal-width slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer: 4 bytes, little-endian
    Int,

    /// Fixed-capacity character string: 4-byte length prefix followed by
    /// exactly `n` data bytes, zero-padded past the actual length
    Text(u16),
}

impl DataType {
    /// Returns the number of bytes a value of this type occupies on a page.
    pub fn width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Text(n) => 4 + *n as usize,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Text(n) => write!(f, "TEXT({})", n),
        }
    }
}
