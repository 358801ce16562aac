//! Record producer: serialises instrumentation arguments into trace records.
//!
//! The instrumentation side of the toolkit is opaque to the decoder; all it
//! needs is something that turns a typed argument list into the wire format.
//! [`TraceProducer`] is that boundary, and [`TraceWriter`] is the stock
//! implementation appending records to any [`std::io::Write`].

use crate::error::{Error, Result};
use crate::record::{Field, RecordHeader, TraceRecord, HEADER_LEN, MAX_PAYLOAD_LEN};
use bytes::{BufMut, Bytes, BytesMut};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Something that accepts instrumentation events and records them
pub trait TraceProducer {
    /// Record one event with its typed arguments
    fn emit(&mut self, timestamp: i32, event_id: i16, args: &[Field]) -> Result<()>;

    /// Record an already decoded record again
    fn emit_record(&mut self, record: &TraceRecord) -> Result<()> {
        self.emit(record.timestamp, record.event_id, &record.payload)
    }
}

/// Serialise arguments into a payload
pub fn encode_payload(args: &[Field]) -> Result<Bytes> {
    let len: usize = args.iter().map(Field::encoded_len).sum();
    if len > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge { len });
    }

    let mut buf = BytesMut::with_capacity(len);
    for arg in args {
        put_field(&mut buf, arg)?;
    }
    Ok(buf.freeze())
}

/// Serialise a complete record: header followed by payload
pub fn encode_record(timestamp: i32, event_id: i16, args: &[Field]) -> Result<Bytes> {
    let payload = encode_payload(args)?;
    let header = RecordHeader {
        timestamp,
        event_id,
        // encode_payload caps the length at 255
        payload_length: payload.len() as u8,
    };

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_slice(&header.to_bytes());
    buf.put(payload);
    Ok(buf.freeze())
}

fn put_field(buf: &mut BytesMut, field: &Field) -> Result<()> {
    match field {
        Field::FixedInt8(v) => buf.put_i8(*v),
        Field::FixedInt16(v) => buf.put_i16(*v),
        Field::FixedInt32(v) => buf.put_i32(*v),
        Field::FixedInt64(v) => buf.put_i64(*v),
        Field::CString(value) => {
            if let Some(index) = value.iter().position(|&b| b == 0) {
                return Err(Error::InvalidCString { index });
            }
            buf.put_slice(value);
            buf.put_u8(0);
        }
    }
    Ok(())
}

/// Appends encoded records to a byte sink
#[derive(Debug)]
pub struct TraceWriter<W: Write> {
    inner: W,
    records: u64,
    bytes: u64,
}

impl<W: Write> TraceWriter<W> {
    /// Creates a writer appending to `inner`
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records: 0,
            bytes: 0,
        }
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Number of bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Flushes the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|source| Error::Io {
            offset: self.bytes,
            source,
        })
    }

    /// Returns the underlying sink
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl TraceWriter<BufWriter<File>> {
    /// Creates (or truncates) a trace file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::file_write(path, e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TraceProducer for TraceWriter<W> {
    fn emit(&mut self, timestamp: i32, event_id: i16, args: &[Field]) -> Result<()> {
        let record = encode_record(timestamp, event_id, args)?;

        // One write per record so the file never interleaves partial records
        self.inner.write_all(&record).map_err(|source| Error::Io {
            offset: self.bytes,
            source,
        })?;

        self.records += 1;
        self.bytes += record.len() as u64;
        Ok(())
    }
}
