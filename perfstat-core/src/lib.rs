//! # perfstat-core
//!
//! Decoder for the binary performance statistics capture files written by the
//! nodes of a data grid.
//!
//! Each node appends one frame per profiled operation (cache accesses,
//! transactions, queries, compute tasks and jobs) to a capture file named after
//! the node. This crate finds those files, decodes them into typed records and
//! fans the records out to handlers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use perfstat_core::prelude::*;
//!
//! let files = scan(Path::new("/var/perf"), &CaptureNaming::default()).unwrap();
//!
//! let mut dispatcher = Dispatcher::new()
//!     .with_filter(RecordFilter::new().with_ops([OperationKind::Query]));
//! dispatcher.add_handler(PrintHandler::new(std::io::stdout(), OutputFormat::Text));
//!
//! let summary = dispatcher.run(&files).unwrap();
//! println!("{} records", summary.records_admitted);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        perfstat-core                                |
//! +---------------------------------------------------------------------+
//! |  record     - Record, RecordBody, OperationKind, QueryType          |
//! |  codec/     - Frame decoding/encoding, per-stream string dictionary |
//! |  scan       - Capture file naming and discovery                     |
//! |  reader     - Rolling-buffer record reader over one stream          |
//! |  filter     - Ops / time window / cache id predicates               |
//! |  dispatch   - Handler trait, sequential fan-out, cancellation       |
//! |  print      - Text and JSON line rendering                          |
//! |  error      - Error types                                           |
//! +---------------------------------------------------------------------+
//! ```

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod prelude;
pub mod print;
pub mod reader;
pub mod record;
pub mod scan;

// Re-export commonly used types at crate root for convenience
pub use codec::{decode, DecodeLimits, Decoded, Encoder, StringDictionary, DEFAULT_MAX_FIELD_LEN};
pub use dispatch::{CancelToken, Dispatcher, FailureReason, Handler, RunSummary, StreamFailure};
pub use error::{
    CorruptFrame, DispatchError, Error, HandlerError, Result, ScanError, StreamError,
};
pub use filter::RecordFilter;
pub use print::{FieldValue, OutputFormat, PrintHandler};
pub use reader::StreamReader;
pub use record::{
    CacheIdList, OperationKind, QueryType, Record, RecordBody, SessionId, UnknownOperationKind,
};
pub use scan::{scan, CaptureFile, CaptureNaming, ParsedName};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
