//! Convenient re-exports for common usage.
//!
//! ```rust,no_run
//! use perfstat_core::prelude::*;
//!
//! let naming = CaptureNaming::default();
//! ```

// Record model
pub use crate::record::{OperationKind, QueryType, Record, RecordBody, SessionId};

// Discovery and decoding
pub use crate::codec::DecodeLimits;
pub use crate::reader::StreamReader;
pub use crate::scan::{scan, CaptureFile, CaptureNaming};

// Processing
pub use crate::dispatch::{CancelToken, Dispatcher, Handler, RunSummary};
pub use crate::filter::RecordFilter;
pub use crate::print::{OutputFormat, PrintHandler};

// Error types
pub use crate::error::{Error, Result};
