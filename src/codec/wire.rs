//! Field-level reader and writer for the protobuf wire format.
//!
//! # Responsibilities
//! - Walk a message one field at a time without materializing it
//! - Expose each field's number, typed value and exact encoded bytes
//! - Re-emit fields verbatim or encode new length-delimited fields
//!
//! # Design Decisions
//! - Single forward pass over a borrowed buffer, no backtracking
//! - Values borrow from the input; only nested buffers are ever walked
//! - Group wire types are rejected (deprecated and absent from the schema)

use bytes::{Bytes, BytesMut};
use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, WireType};
use thiserror::Error;

/// Field number of `MetricPayload.series`.
pub const SERIES_FIELD: u32 = 1;

/// Field number of `MetricSeries.metric`.
pub const METRIC_NAME_FIELD: u32 = 2;

/// Malformed wire data.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid field key or varint: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("field {number} truncated: needs {needed} bytes, {remaining} remaining")]
    Truncated {
        number: u32,
        needed: u64,
        remaining: usize,
    },

    #[error("field {number} uses unsupported group wire type")]
    UnsupportedGroup { number: u32 },

    #[error("field {number} has wire type {found:?}, expected length-delimited")]
    UnexpectedWireType { number: u32, found: WireType },
}

/// Decoded value of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Fixed64(&'a [u8]),
    LengthDelimited(&'a [u8]),
    Fixed32(&'a [u8]),
}

impl<'a> FieldValue<'a> {
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Varint(_) => WireType::Varint,
            FieldValue::Fixed64(_) => WireType::SixtyFourBit,
            FieldValue::LengthDelimited(_) => WireType::LengthDelimited,
            FieldValue::Fixed32(_) => WireType::ThirtyTwoBit,
        }
    }
}

/// One field of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub number: u32,
    pub value: FieldValue<'a>,
    /// Key, length prefix and payload exactly as they appeared in the input.
    pub raw: &'a [u8],
}

impl<'a> Field<'a> {
    /// Payload of a length-delimited field (nested message, string or bytes).
    pub fn length_delimited(&self) -> Result<&'a [u8], WireError> {
        match self.value {
            FieldValue::LengthDelimited(bytes) => Ok(bytes),
            other => Err(WireError::UnexpectedWireType {
                number: self.number,
                found: other.wire_type(),
            }),
        }
    }
}

/// Iterates the top-level fields of an encoded message.
///
/// Yields at most one error, after which iteration stops.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn read_field(&mut self) -> Result<Field<'a>, WireError> {
        let start = self.buf;
        let mut cursor = self.buf;

        let (number, wire_type) = decode_key(&mut cursor)?;
        let value = match wire_type {
            WireType::Varint => FieldValue::Varint(decode_varint(&mut cursor)?),
            WireType::SixtyFourBit => FieldValue::Fixed64(take(&mut cursor, number, 8)?),
            WireType::ThirtyTwoBit => FieldValue::Fixed32(take(&mut cursor, number, 4)?),
            WireType::LengthDelimited => {
                let len = decode_varint(&mut cursor)?;
                FieldValue::LengthDelimited(take(&mut cursor, number, len)?)
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(WireError::UnsupportedGroup { number })
            }
        };

        let consumed = start.len() - cursor.len();
        self.buf = cursor;
        Ok(Field {
            number,
            value,
            raw: &start[..consumed],
        })
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = Result<Field<'a>, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let field = self.read_field();
        if field.is_err() {
            self.buf = &[];
        }
        Some(field)
    }
}

fn take<'a>(cursor: &mut &'a [u8], number: u32, len: u64) -> Result<&'a [u8], WireError> {
    let truncated = || WireError::Truncated {
        number,
        needed: len,
        remaining: cursor.len(),
    };
    let len = usize::try_from(len).map_err(|_| truncated())?;
    if cursor.len() < len {
        return Err(truncated());
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Ok(head)
}

/// Accumulates an encoded message.
#[derive(Debug, Default)]
pub struct FieldWriter {
    out: BytesMut,
}

impl FieldWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a field byte-for-byte as it was read.
    pub fn copy(&mut self, field: &Field<'_>) {
        self.out.extend_from_slice(field.raw);
    }

    /// Encode a length-delimited field.
    #[cfg(test)]
    pub(crate) fn write_bytes(&mut self, number: u32, payload: &[u8]) {
        encode_key(number, WireType::LengthDelimited, &mut self.out);
        encode_varint(payload.len() as u64, &mut self.out);
        self.out.extend_from_slice(payload);
    }

    /// Encode a varint field.
    #[cfg(test)]
    pub(crate) fn write_varint(&mut self, number: u32, value: u64) {
        encode_key(number, WireType::Varint, &mut self.out);
        encode_varint(value, &mut self.out);
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.out.freeze()
    }
}
