use crate::storage::error::{StorageError, StorageResult};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Width in bytes of an `Int` field.
pub const INT_SIZE: usize = 4;
/// Width in bytes of a `Double` field.
pub const DOUBLE_SIZE: usize = 8;
/// Width in bytes of a `Char` field.
pub const CHAR_SIZE: usize = 64;

/// Field types supported by the tuple codec. Every type has a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Double,
    Char,
}

impl FieldType {
    /// Encoded width of a field of this type.
    pub const fn width(self) -> usize {
        match self {
            FieldType::Int => INT_SIZE,
            FieldType::Double => DOUBLE_SIZE,
            FieldType::Char => CHAR_SIZE,
        }
    }

    /// Parse a type name as accepted on the command line.
    pub fn parse(name: &str) -> StorageResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "int" => Ok(FieldType::Int),
            "double" => Ok(FieldType::Double),
            "char" => Ok(FieldType::Char),
            other => Err(StorageError::InvalidSchema(format!(
                "unknown field type '{}'",
                other
            ))),
        }
    }

    /// Decode one field of this type from the front of `data`.
    pub(crate) fn decode(self, data: &[u8]) -> Field {
        match self {
            FieldType::Int => Field::Int(LittleEndian::read_i32(data)),
            FieldType::Double => Field::Double(LittleEndian::read_f64(data)),
            FieldType::Char => {
                let raw = &data[..CHAR_SIZE];
                let end = raw.iter().position(|&b| b == 0).unwrap_or(CHAR_SIZE);
                Field::Char(String::from_utf8_lossy(&raw[..end]).into_owned())
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Int => "int",
            FieldType::Double => "double",
            FieldType::Char => "char",
        };
        f.write_str(name)
    }
}

/// A single field value of a tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i32),
    Double(f64),
    Char(String),
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Double(_) => FieldType::Double,
            Field::Char(_) => FieldType::Char,
        }
    }

    /// Parse `text` as a value of type `ty`.
    pub fn parse(ty: FieldType, text: &str) -> StorageResult<Self> {
        let invalid = || StorageError::InvalidSchema(format!("'{}' is not a valid {}", text, ty));
        match ty {
            FieldType::Int => text.parse().map(Field::Int).map_err(|_| invalid()),
            FieldType::Double => text.parse().map(Field::Double).map_err(|_| invalid()),
            FieldType::Char => Ok(Field::Char(text.to_string())),
        }
    }

    /// Encode this field into the front of `out`, which must hold at least
    /// `self.field_type().width()` bytes.
    pub(crate) fn encode(&self, out: &mut [u8]) {
        match self {
            Field::Int(v) => LittleEndian::write_i32(out, *v),
            Field::Double(v) => LittleEndian::write_f64(out, *v),
            Field::Char(s) => {
                let bytes = truncate_to_boundary(s, CHAR_SIZE).as_bytes();
                out[..bytes.len()].copy_from_slice(bytes);
                out[bytes.len()..CHAR_SIZE].fill(0);
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Double(v) => write!(f, "{}", v),
            Field::Char(s) => write!(f, "{}", s),
        }
    }
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
