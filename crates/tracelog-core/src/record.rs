//! Decoded trace records and their typed payload fields.

use bytes::Bytes;
use std::fmt;

/// Size of the fixed record header: timestamp (4) + event id (2) + payload length (1)
pub const HEADER_LEN: usize = 7;

/// Largest payload a single record can carry
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// The fixed 7-byte header preceding every payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Opaque event time
    pub timestamp: i32,
    /// Selects the payload schema
    pub event_id: i16,
    /// Exact byte length of the payload that follows
    pub payload_length: u8,
}

impl RecordHeader {
    /// Decodes a header from its big-endian wire form
    pub fn from_bytes(buf: &[u8; HEADER_LEN]) -> Self {
        Self {
            timestamp: i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            event_id: i16::from_be_bytes([buf[4], buf[5]]),
            payload_length: buf[6],
        }
    }

    /// Encodes the header into its big-endian wire form
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[4..6].copy_from_slice(&self.event_id.to_be_bytes());
        buf[6] = self.payload_length;
        buf
    }
}

/// Kinds of payload field a schema can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 1-byte signed integer
    FixedInt8,
    /// 2-byte big-endian signed integer
    FixedInt16,
    /// 4-byte big-endian signed integer
    FixedInt32,
    /// 8-byte big-endian signed integer
    FixedInt64,
    /// Zero-terminated byte string
    CString,
}

impl FieldKind {
    /// Encoded width for fixed-size kinds, `None` for variable-length ones
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldKind::FixedInt8 => Some(1),
            FieldKind::FixedInt16 => Some(2),
            FieldKind::FixedInt32 => Some(4),
            FieldKind::FixedInt64 => Some(8),
            FieldKind::CString => None,
        }
    }

    /// Label used when rendering arguments of this kind
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::FixedInt8 => "byte",
            FieldKind::FixedInt16 => "short",
            FieldKind::FixedInt32 => "int",
            FieldKind::FixedInt64 => "long",
            FieldKind::CString => "string",
        }
    }
}

/// A single decoded payload argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// 1-byte signed integer
    FixedInt8(i8),
    /// 2-byte signed integer
    FixedInt16(i16),
    /// 4-byte signed integer
    FixedInt32(i32),
    /// 8-byte signed integer
    FixedInt64(i64),
    /// String bytes without the terminator
    CString(Bytes),
}

impl Field {
    /// Creates a string field from anything byte-like
    pub fn cstring(value: impl Into<Bytes>) -> Self {
        Field::CString(value.into())
    }

    /// Returns the kind of this field
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::FixedInt8(_) => FieldKind::FixedInt8,
            Field::FixedInt16(_) => FieldKind::FixedInt16,
            Field::FixedInt32(_) => FieldKind::FixedInt32,
            Field::FixedInt64(_) => FieldKind::FixedInt64,
            Field::CString(_) => FieldKind::CString,
        }
    }

    /// Number of payload bytes this field occupies, terminator included
    pub fn encoded_len(&self) -> usize {
        match self {
            Field::CString(value) => value.len() + 1,
            other => other.kind().fixed_size().unwrap_or(0),
        }
    }

    /// Returns the integer value for fixed-size fields
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Field::FixedInt8(v) => Some(i64::from(*v)),
            Field::FixedInt16(v) => Some(i64::from(*v)),
            Field::FixedInt32(v) => Some(i64::from(*v)),
            Field::FixedInt64(v) => Some(*v),
            Field::CString(_) => None,
        }
    }

    /// Returns the string bytes for string fields
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Field::CString(value) => Some(value.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::FixedInt8(v) => write!(f, "{}", v),
            Field::FixedInt16(v) => write!(f, "{}", v),
            Field::FixedInt32(v) => write!(f, "{}", v),
            Field::FixedInt64(v) => write!(f, "{}", v),
            Field::CString(value) => write!(f, "\"{}\"", String::from_utf8_lossy(value)),
        }
    }
}

/// One fully decoded trace event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Opaque event time
    pub timestamp: i32,
    /// Event id that selected the payload schema
    pub event_id: i16,
    /// Exact byte length of the serialized payload
    pub payload_length: u8,
    /// Arguments decoded from the payload, in wire order
    pub payload: Vec<Field>,
}

impl TraceRecord {
    /// Creates a record from a decoded header and its fields
    pub fn new(header: RecordHeader, payload: Vec<Field>) -> Self {
        Self {
            timestamp: header.timestamp,
            event_id: header.event_id,
            payload_length: header.payload_length,
            payload,
        }
    }

    /// Returns the header this record was decoded from
    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            timestamp: self.timestamp,
            event_id: self.event_id,
            payload_length: self.payload_length,
        }
    }

    /// Total bytes the record occupies in the stream
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + usize::from(self.payload_length)
    }
}
