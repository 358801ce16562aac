//! Streaming decoder for binary trace logs.
//!
//! A trace log is a flat sequence of records with no file header and no
//! record count. Each record is a 7-byte header followed by a payload whose
//! length the header declares:
//!
//! ```text
//! record  := header payload
//! header  := timestamp:i32(BE) event_id:i16(BE) payload_length:u8
//! payload := byte[payload_length]
//! ```
//!
//! ## Algorithm Overview
//!
//! 1. Read the header; end-of-stream before its first byte ends the replay
//! 2. Read exactly `payload_length` bytes into a bounded buffer
//! 3. Select the payload schema from the event id
//! 4. Decode fields from the buffer and check that they claim every byte
//!
//! The payload length is a sealed boundary: steps 3 and 4 never touch the
//! stream, so a payload that does not match its schema leaves the decoder
//! aligned on the next record.

mod wire;

use crate::error::{Error, RecordSection, Result};
use crate::record::{RecordHeader, TraceRecord, HEADER_LEN};
use crate::schema::SchemaRegistry;
use bytes::BytesMut;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use tracing::{debug, trace, warn};

pub use wire::{decode_field, decode_fields, find_terminator, FieldError};

/// Configuration for the decoder
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    /// Event id to payload schema mapping
    pub schemas: SchemaRegistry,
    /// Skip records whose payload does not decode instead of returning the error
    pub skip_malformed: bool,
    /// Maximum number of records to decode (0 = unlimited)
    pub max_records: u64,
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema registry
    pub fn schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    /// Sets whether recoverable payload errors are skipped
    pub fn skip_malformed(mut self, skip: bool) -> Self {
        self.skip_malformed = skip;
        self
    }

    /// Sets the maximum number of records to decode
    pub fn max_records(mut self, max: u64) -> Self {
        self.max_records = max;
        self
    }
}

/// Running totals for a decode session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Records decoded successfully
    pub records: u64,
    /// Records skipped because their payload did not decode
    pub skipped: u64,
    /// Bytes consumed from the source
    pub bytes: u64,
}

/// Sequential decoder over a trace byte source.
///
/// The decoder owns its reader for its whole lifetime; dropping it releases
/// the source. Once the stream is exhausted or a fatal error has been
/// returned, every further call yields `Ok(None)`.
#[derive(Debug)]
pub struct Decoder<R> {
    reader: R,
    config: DecoderConfig,
    stats: DecodeStats,
    finished: bool,
}

impl<R: Read> Decoder<R> {
    /// Wraps a byte source with the default configuration. Nothing is read yet.
    pub fn open(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    /// Wraps a byte source with a custom configuration
    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Self {
            reader,
            config,
            stats: DecodeStats::default(),
            finished: false,
        }
    }

    /// Bytes consumed from the source so far
    pub fn position(&self) -> u64 {
        self.stats.bytes
    }

    /// Totals for this session
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Returns true once end-of-stream or a fatal error has been reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Releases the decoder and returns the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` when the stream ends exactly on a record boundary.
    /// [`Error::TruncatedRecord`] and [`Error::Io`] end the session.
    /// Recoverable payload errors leave the decoder on the next record, so
    /// calling again continues the replay.
    pub fn next_record(&mut self) -> Result<Option<TraceRecord>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            if self.config.max_records > 0 && self.stats.records >= self.config.max_records {
                debug!("Record limit of {} reached", self.config.max_records);
                self.finished = true;
                return Ok(None);
            }

            match self.decode_record() {
                Ok(Some(record)) => {
                    self.stats.records += 1;
                    return Ok(Some(record));
                }
                Ok(None) => {
                    debug!(
                        "End of stream after {} records ({} bytes)",
                        self.stats.records, self.stats.bytes
                    );
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) if e.is_recoverable() => {
                    if !self.config.skip_malformed {
                        return Err(e);
                    }
                    warn!("Skipping record: {}", e);
                    self.stats.skipped += 1;
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }
    }

    fn decode_record(&mut self) -> Result<Option<TraceRecord>> {
        let offset = self.stats.bytes;

        let mut header = [0u8; HEADER_LEN];
        let read = self.fill(&mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_LEN {
            return Err(Error::truncated(offset, RecordSection::Header, HEADER_LEN, read));
        }
        let header = RecordHeader::from_bytes(&header);

        let length = usize::from(header.payload_length);
        let mut payload = BytesMut::zeroed(length);
        let read = self.fill(&mut payload)?;
        if read < length {
            return Err(Error::truncated(offset, RecordSection::Payload, length, read));
        }
        let payload = payload.freeze();

        trace!(
            "Record at offset {}: timestamp {} id {} payload {} bytes",
            offset,
            header.timestamp,
            header.event_id,
            length
        );

        let schema = self
            .config
            .schemas
            .lookup(header.event_id)
            .ok_or_else(|| Error::unsupported_schema(offset, header.event_id))?;

        let fields = decode_fields(schema, &payload)
            .map_err(|e| Error::malformed_payload(offset, header.event_id, e.to_string()))?;

        Ok(Some(TraceRecord::new(header, fields)))
    }

    /// Read until `buf` is full or the source is exhausted.
    ///
    /// Returns the number of bytes read; fewer than `buf.len()` means end-of-stream.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.stats.bytes += filled as u64;
                    return Err(Error::Io {
                        offset: self.stats.bytes,
                        source: e,
                    });
                }
            }
        }

        self.stats.bytes += filled as u64;
        Ok(filled)
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Open a trace file for decoding with the default configuration
pub fn open_file(path: impl AsRef<Path>) -> Result<Decoder<BufReader<File>>> {
    open_file_with_config(path, DecoderConfig::default())
}

/// Open a trace file for decoding with a custom configuration
pub fn open_file_with_config(
    path: impl AsRef<Path>,
    config: DecoderConfig,
) -> Result<Decoder<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    Ok(Decoder::with_config(BufReader::new(file), config))
}

/// Decode every record of an in-memory trace
pub fn decode_all(data: &[u8]) -> Result<Vec<TraceRecord>> {
    Decoder::open(data).collect()
}
