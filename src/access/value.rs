use crate::access::error::CodecError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Maximum number of bytes stored for a string field.
pub const STRING_LEN: usize = 128;

/// Field types supported by the storage layer. Every type has a fixed width.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int = 1,
    String = 2,
}

impl FieldType {
    /// Number of bytes a field of this type occupies inside a tuple.
    pub fn byte_len(&self) -> usize {
        match self {
            FieldType::Int => 4,
            // length prefix + padded payload
            FieldType::String => 4 + STRING_LEN,
        }
    }

    /// Decode one field of this type from `reader`.
    pub fn read_field<R: Read>(&self, reader: &mut R) -> Result<Field, CodecError> {
        match self {
            FieldType::Int => Ok(Field::Int(reader.read_i32::<BigEndian>()?)),
            FieldType::String => {
                let len = reader.read_u32::<BigEndian>()? as usize;
                if len > STRING_LEN {
                    return Err(CodecError::StringTooLong {
                        len,
                        max: STRING_LEN,
                    });
                }
                let mut buf = [0u8; STRING_LEN];
                reader.read_exact(&mut buf)?;
                let s = String::from_utf8(buf[..len].to_vec())?;
                Ok(Field::String(s))
            }
        }
    }

    /// Parse a field of this type from its textual form.
    pub fn parse_field(&self, text: &str) -> Result<Field, CodecError> {
        match self {
            FieldType::Int => text
                .trim()
                .parse::<i32>()
                .map(Field::Int)
                .map_err(|_| CodecError::Parse {
                    field_type: *self,
                    text: text.to_string(),
                }),
            FieldType::String => Ok(Field::String(text.trim().to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "INT"),
            FieldType::String => write!(f, "STRING"),
        }
    }
}

impl FromStr for FieldType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" => Ok(FieldType::Int),
            "string" => Ok(FieldType::String),
            _ => Err(CodecError::UnknownType(s.to_string())),
        }
    }
}

/// A single typed value stored in a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Int(i32),
    String(String),
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::String(_) => FieldType::String,
        }
    }

    /// Encode this field in its fixed-width form.
    ///
    /// Strings longer than `STRING_LEN` bytes are truncated at the last
    /// character boundary that fits.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        match self {
            Field::Int(v) => writer.write_i32::<BigEndian>(*v)?,
            Field::String(s) => {
                let mut end = s.len().min(STRING_LEN);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                let bytes = &s.as_bytes()[..end];
                writer.write_u32::<BigEndian>(bytes.len() as u32)?;
                writer.write_all(bytes)?;
                writer.write_all(&[0u8; STRING_LEN][..STRING_LEN - bytes.len()])?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::String(s) => write!(f, "{}", s),
        }
    }
}
