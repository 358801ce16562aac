//! Extensible record formatting traits.
//!
//! This module provides the [`RecordFormatter`] trait for customizing
//! what happens to each decoded record.

use crate::record::{Field, FieldKind, TraceRecord};
use std::collections::HashMap;
use std::fmt::Result;

/// Trait for consuming decoded records.
///
/// A formatter is driven once per successfully decoded record by
/// [`format_record`](super::format_record): `begin_record`, then
/// `write_field` for each argument in wire order, then `end_record`.
/// Truncated or malformed records never reach a formatter.
///
/// # Example
///
/// ```
/// use tracelog_core::format::{format_record, RecordFormatter};
/// use tracelog_core::{Field, TraceRecord};
///
/// #[derive(Default)]
/// struct MaxTimestamp(i32);
///
/// impl RecordFormatter for MaxTimestamp {
///     fn begin_record(&mut self, record: &TraceRecord) -> std::fmt::Result {
///         self.0 = self.0.max(record.timestamp);
///         Ok(())
///     }
/// }
///
/// let record = TraceRecord {
///     timestamp: 42,
///     event_id: 1,
///     payload_length: 3,
///     payload: vec![Field::FixedInt16(0), Field::cstring("")],
/// };
/// let mut max = MaxTimestamp::default();
/// format_record(&mut max, &record)?;
/// assert_eq!(max.0, 42);
/// # Ok::<(), std::fmt::Error>(())
/// ```
pub trait RecordFormatter {
    /// Called before the record's fields
    fn begin_record(&mut self, record: &TraceRecord) -> Result {
        let _ = record;
        Ok(())
    }

    /// Called for each payload argument; `index` is its position in the payload
    fn write_field(&mut self, index: usize, field: &Field) -> Result {
        let _ = (index, field);
        Ok(())
    }

    /// Called after the record's fields
    fn end_record(&mut self, record: &TraceRecord) -> Result {
        let _ = record;
        Ok(())
    }
}

/// A no-op formatter that discards all output
pub struct NullFormatter;

impl RecordFormatter for NullFormatter {}

/// A formatter that collects statistics about the replayed records
#[derive(Debug, Default)]
pub struct StatsFormatter {
    /// Number of records
    pub record_count: usize,
    /// Number of payload arguments
    pub field_count: usize,
    /// Number of arguments per field kind
    pub kind_counts: HashMap<FieldKind, usize>,
    /// Total payload bytes
    pub payload_bytes: usize,
    /// Smallest and largest timestamp seen
    pub timestamp_range: Option<(i32, i32)>,
}

impl RecordFormatter for StatsFormatter {
    fn begin_record(&mut self, record: &TraceRecord) -> Result {
        self.record_count += 1;
        self.payload_bytes += usize::from(record.payload_length);
        self.timestamp_range = Some(match self.timestamp_range {
            Some((lo, hi)) => (lo.min(record.timestamp), hi.max(record.timestamp)),
            None => (record.timestamp, record.timestamp),
        });
        Ok(())
    }

    fn write_field(&mut self, _index: usize, field: &Field) -> Result {
        self.field_count += 1;
        *self.kind_counts.entry(field.kind()).or_default() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_record;

    fn record(timestamp: i32) -> TraceRecord {
        TraceRecord {
            timestamp,
            event_id: 1,
            payload_length: 5,
            payload: vec![Field::FixedInt16(5), Field::cstring("hi")],
        }
    }

    #[test]
    fn test_null_formatter() {
        let mut formatter = NullFormatter;
        assert!(format_record(&mut formatter, &record(1)).is_ok());
    }

    #[test]
    fn test_stats_formatter() {
        let mut formatter = StatsFormatter::default();
        format_record(&mut formatter, &record(30)).unwrap();
        format_record(&mut formatter, &record(10)).unwrap();

        assert_eq!(formatter.record_count, 2);
        assert_eq!(formatter.field_count, 4);
        assert_eq!(formatter.kind_counts[&FieldKind::CString], 2);
        assert_eq!(formatter.payload_bytes, 10);
        assert_eq!(formatter.timestamp_range, Some((10, 30)));
    }
}
