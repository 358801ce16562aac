//! Payload field decoding.
//!
//! Fields are decoded from the in-memory payload buffer only, never from the
//! underlying stream, so a bad payload can never pull bytes from the next
//! record.
//!
//! ## Field Encodings
//!
//! - `FixedInt8/16/32/64`: 1, 2, 4 or 8 bytes, big-endian, signed
//! - `CString`: a run of non-zero bytes followed by one `0x00`

use crate::record::{Field, FieldKind};
use crate::schema::Schema;
use bytes::{Buf, Bytes};
use thiserror::Error;

/// Reasons a payload fails to match its schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Not enough payload left for a fixed-size field
    #[error("{kind:?} at payload offset {at} needs {needed} bytes, {available} left")]
    Short {
        /// Kind of the field being decoded
        kind: FieldKind,
        /// Payload offset of the field
        at: usize,
        /// Width of the field
        needed: usize,
        /// Payload bytes remaining
        available: usize,
    },

    /// No zero terminator before the payload boundary
    #[error("string at payload offset {at} has no terminator before the payload boundary")]
    Unterminated {
        /// Payload offset of the string start
        at: usize,
    },

    /// Fields ended before the declared payload length
    #[error("schema consumed {consumed} of {declared} payload bytes")]
    Trailing {
        /// Bytes consumed by the schema's fields
        consumed: usize,
        /// Declared payload length
        declared: usize,
    },
}

/// Locate the zero terminator of a string, relative to `data`
pub fn find_terminator(data: &[u8]) -> Option<usize> {
    data.iter().position(|&b| b == 0)
}

/// Decode one field of the given kind starting at `at`.
///
/// Returns the field and the number of payload bytes consumed.
pub fn decode_field(
    kind: FieldKind,
    payload: &Bytes,
    at: usize,
) -> Result<(Field, usize), FieldError> {
    match kind {
        FieldKind::FixedInt8 => decode_fixed(kind, payload, at, |b| Field::FixedInt8(b.get_i8())),
        FieldKind::FixedInt16 => decode_fixed(kind, payload, at, |b| Field::FixedInt16(b.get_i16())),
        FieldKind::FixedInt32 => decode_fixed(kind, payload, at, |b| Field::FixedInt32(b.get_i32())),
        FieldKind::FixedInt64 => decode_fixed(kind, payload, at, |b| Field::FixedInt64(b.get_i64())),
        FieldKind::CString => {
            let rest = payload.get(at..).unwrap_or_default();
            let len = find_terminator(rest).ok_or(FieldError::Unterminated { at })?;
            Ok((Field::CString(payload.slice(at..at + len)), len + 1))
        }
    }
}

fn decode_fixed(
    kind: FieldKind,
    payload: &Bytes,
    at: usize,
    read: impl FnOnce(&mut &[u8]) -> Field,
) -> Result<(Field, usize), FieldError> {
    let width = kind.fixed_size().unwrap_or(0);
    let remaining = payload.len().saturating_sub(at);
    if remaining < width {
        return Err(FieldError::Short {
            kind,
            at,
            needed: width,
            available: remaining,
        });
    }

    let mut buf = &payload[at..at + width];
    Ok((read(&mut buf), width))
}

/// Decode a complete payload according to `schema`.
///
/// Every payload byte must be claimed by a field.
pub fn decode_fields(schema: &Schema, payload: &Bytes) -> Result<Vec<Field>, FieldError> {
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut position = 0;

    for &kind in schema.fields() {
        let (field, consumed) = decode_field(kind, payload, position)?;
        fields.push(field);
        position += consumed;
    }

    if position != payload.len() {
        return Err(FieldError::Trailing {
            consumed: position,
            declared: payload.len(),
        });
    }

    Ok(fields)
}
