//! Error types for the tracelog-core library.
//!
//! Clean end-of-stream is not an error: the decoder reports it as `Ok(None)`.
//! Everything else that can go wrong while replaying or producing a trace is
//! a variant of [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tracelog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Part of a record that a truncated stream ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSection {
    /// The 7-byte record header
    Header,
    /// The payload declared by the header
    Payload,
}

impl std::fmt::Display for RecordSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSection::Header => f.write_str("header"),
            RecordSection::Payload => f.write_str("payload"),
        }
    }
}

/// Error type for all tracelog operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to open or read an input trace file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write an output trace file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The trace stream failed for a reason other than running out of data
    #[error("I/O error at offset {offset}: {source}")]
    Io {
        /// Stream offset where the read or write failed
        offset: u64,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The stream ended in the middle of a record
    #[error(
        "truncated record at offset {offset}: {section} needs {needed} bytes, only {available} available"
    )]
    TruncatedRecord {
        /// Stream offset of the record start
        offset: u64,
        /// Which part of the record was cut short
        section: RecordSection,
        /// Bytes required to complete the section
        needed: usize,
        /// Bytes that were actually available
        available: usize,
    },

    /// The payload was read in full but its fields do not fit the schema
    #[error("malformed payload in record at offset {offset} (event id {event_id}): {details}")]
    MalformedPayload {
        /// Stream offset of the record start
        offset: u64,
        /// Event id of the offending record
        event_id: i16,
        /// Detailed description of the issue
        details: String,
    },

    /// No schema is registered for the record's event id
    #[error("no schema registered for event id {event_id} (record at offset {offset})")]
    UnsupportedSchema {
        /// Stream offset of the record start
        offset: u64,
        /// The unknown event id
        event_id: i16,
    },

    /// Encoded arguments do not fit in a single record
    #[error("payload of {len} bytes exceeds the 255-byte record limit")]
    PayloadTooLarge {
        /// Encoded payload size
        len: usize,
    },

    /// A string argument contains an interior zero byte
    #[error("string argument contains a zero byte at index {index}")]
    InvalidCString {
        /// Index of the first zero byte
        index: usize,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new truncation error
    pub fn truncated(offset: u64, section: RecordSection, needed: usize, available: usize) -> Self {
        Self::TruncatedRecord {
            offset,
            section,
            needed,
            available,
        }
    }

    /// Creates a new malformed payload error
    pub fn malformed_payload(offset: u64, event_id: i16, details: impl Into<String>) -> Self {
        Self::MalformedPayload {
            offset,
            event_id,
            details: details.into(),
        }
    }

    /// Creates a new unsupported schema error
    pub fn unsupported_schema(offset: u64, event_id: i16) -> Self {
        Self::UnsupportedSchema { offset, event_id }
    }

    /// Returns true if the error is local to one record.
    ///
    /// The payload boundary was honoured for these, so the stream is still
    /// aligned on the next record and decoding may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. } | Self::UnsupportedSchema { .. }
        )
    }
}
