//! Record rendering.
//!
//! [`TextFormatter`] renders each record on one line in the classic replay
//! layout:
//!
//! ```text
//! timestamp 100 id 1 args=(short=5 string="hi")
//! ```
//!
//! Each argument is labelled by its field kind (`byte`, `short`, `int`,
//! `long`, `string`). Rendering depends only on the record, so the same
//! record always produces byte-identical output.

mod writer;

use crate::record::{Field, TraceRecord};
use std::fmt::{self, Write as FmtWrite};

pub use writer::{NullFormatter, RecordFormatter, StatsFormatter};

/// Drive a formatter over one record
pub fn format_record<F>(formatter: &mut F, record: &TraceRecord) -> fmt::Result
where
    F: RecordFormatter + ?Sized,
{
    formatter.begin_record(record)?;
    for (index, field) in record.payload.iter().enumerate() {
        formatter.write_field(index, field)?;
    }
    formatter.end_record(record)
}

/// Render a record as a single line, without the trailing newline
pub fn render_record(record: &TraceRecord) -> String {
    let mut formatter = TextFormatter::new(String::new()).with_newline(false);
    // Writing into a String cannot fail
    let _ = format_record(&mut formatter, record);
    formatter.into_inner()
}

/// Writes records as text lines into any [`fmt::Write`]
#[derive(Debug)]
pub struct TextFormatter<W> {
    out: W,
    newline: bool,
}

impl<W: FmtWrite> TextFormatter<W> {
    /// Creates a formatter writing one line per record into `out`
    pub fn new(out: W) -> Self {
        Self { out, newline: true }
    }

    /// Sets whether each record is followed by a newline
    pub fn with_newline(mut self, newline: bool) -> Self {
        self.newline = newline;
        self
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: FmtWrite> RecordFormatter for TextFormatter<W> {
    fn begin_record(&mut self, record: &TraceRecord) -> fmt::Result {
        write!(
            self.out,
            "timestamp {} id {} args=(",
            record.timestamp, record.event_id
        )
    }

    fn write_field(&mut self, index: usize, field: &Field) -> fmt::Result {
        if index > 0 {
            self.out.write_char(' ')?;
        }
        write!(self.out, "{}={}", field.kind().label(), field)
    }

    fn end_record(&mut self, _record: &TraceRecord) -> fmt::Result {
        self.out.write_char(')')?;
        if self.newline {
            self.out.write_char('\n')?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hi() -> TraceRecord {
        TraceRecord {
            timestamp: 100,
            event_id: 1,
            payload_length: 5,
            payload: vec![Field::FixedInt16(5), Field::cstring("hi")],
        }
    }

    #[test]
    fn test_render_default_schema() {
        assert_eq!(
            render_record(&hi()),
            "timestamp 100 id 1 args=(short=5 string=\"hi\")"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = hi();
        assert_eq!(render_record(&record), render_record(&record));
    }

    #[test]
    fn test_render_other_kinds() {
        let record = TraceRecord {
            timestamp: -1,
            event_id: -2,
            payload_length: 13,
            payload: vec![
                Field::FixedInt8(-3),
                Field::FixedInt32(70000),
                Field::FixedInt64(-9),
            ],
        };
        assert_eq!(
            render_record(&record),
            "timestamp -1 id -2 args=(byte=-3 int=70000 long=-9)"
        );
    }

    #[test]
    fn test_render_empty_payload() {
        let record = TraceRecord {
            timestamp: 0,
            event_id: 9,
            payload_length: 0,
            payload: vec![],
        };
        assert_eq!(render_record(&record), "timestamp 0 id 9 args=()");
    }

    #[test]
    fn test_text_formatter_lines() {
        let mut formatter = TextFormatter::new(String::new());
        format_record(&mut formatter, &hi()).unwrap();
        format_record(&mut formatter, &hi()).unwrap();
        let out = formatter.into_inner();
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with(")\n"));
    }

    #[test]
    fn test_non_utf8_string_is_lossy() {
        let record = TraceRecord {
            timestamp: 1,
            event_id: 1,
            payload_length: 4,
            payload: vec![Field::FixedInt16(1), Field::cstring(&[0xFF][..])],
        };
        assert!(render_record(&record).contains("string=\"\u{FFFD}\""));
    }
}
