//! # tracelog-core
//!
//! A library for replaying binary event-trace logs.
//!
//! This crate provides the core functionality for:
//! - Decoding a stream of length-prefixed trace records, one at a time
//! - Recovering typed arguments from each record's payload
//! - Rendering decoded records for display
//! - Producing trace records from instrumentation arguments
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`decoder`]: Streaming record decoder and payload field decoding
//! - [`schema`]: Payload layouts selected by event id
//! - [`record`]: Decoded records and fields
//! - [`format`]: Record formatting
//! - [`encode`]: Record producer
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use tracelog_core::{open_file, render_record};
//!
//! for record in open_file("trace.dat")? {
//!     println!("{}", render_record(&record?));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! The library provides several seams for customization:
//!
//! - [`RecordFormatter`]: Customize what happens to each decoded record
//! - [`TraceProducer`]: Plug instrumentation into any record sink
//! - [`SchemaRegistry`]: Describe payload layouts for new event ids
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod decoder;
pub mod encode;
pub mod error;
pub mod format;
pub mod record;
pub mod schema;

// Re-export primary types for convenience
pub use decoder::{decode_all, open_file, open_file_with_config, DecodeStats, Decoder, DecoderConfig};
pub use encode::{encode_record, TraceProducer, TraceWriter};
pub use error::{Error, RecordSection, Result};
pub use format::{format_record, render_record, NullFormatter, RecordFormatter, StatsFormatter, TextFormatter};
pub use record::{Field, FieldKind, RecordHeader, TraceRecord, HEADER_LEN, MAX_PAYLOAD_LEN};
pub use schema::{Schema, SchemaRegistry};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
