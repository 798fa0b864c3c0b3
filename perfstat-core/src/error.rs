//! Error types for perfstat-core.
//!
//! This module provides structured error types for all perfstat-core operations:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`CorruptFrame`] - A frame that can never decode, whatever follows it
//! - [`ScanError`] - Errors from locating capture files
//! - [`StreamError`] - Errors that end a single capture stream
//! - [`DispatchError`] - Errors that abort a whole run
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::RunSummary;

/// Main error type for perfstat-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error locating or naming capture files
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Error decoding a capture stream
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Error that aborted dispatching
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a frame is malformed.
///
/// These never depend on how many bytes are available: a frame that is only
/// short is reported as `Decoded::NeedMore` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptFrame {
    /// Op-byte is neither an operation kind nor a reserved frame type
    #[error("unknown op-byte 0x{op:02x}")]
    UnknownOp { op: u8 },

    /// String reference to a handle never defined in this stream
    #[error("reference to undefined string handle {handle}")]
    UndefinedString { handle: i32 },

    /// Same handle defined twice with different bytes
    #[error("conflicting definition for string handle {handle}")]
    ConflictingString { handle: i32 },

    /// String bytes are not valid UTF-8
    #[error("string handle {handle} is not valid UTF-8")]
    InvalidUtf8 { handle: i32 },

    /// String field tag is neither definition nor reference
    #[error("invalid string tag {tag}")]
    InvalidStringTag { tag: u8 },

    /// Negative length or element count
    #[error("negative {field} {value}")]
    NegativeLength { field: &'static str, value: i32 },

    /// Length or element count larger than the configured cap
    #[error("{field} of {len} bytes exceeds limit of {max} bytes")]
    LengthTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Query type ordinal outside the known set
    #[error("unknown query type {value}")]
    UnknownQueryType { value: u8 },

    /// Boolean byte other than 0 or 1
    #[error("invalid boolean byte {value}")]
    InvalidBool { value: u8 },
}

/// Errors related to finding capture files.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Input path does not exist
    #[error("performance statistics file or directory not found: {path}")]
    NotFound { path: PathBuf },

    /// File name does not follow `<prefix>-<uuid>-<ts>.<ext>`
    #[error("not a capture file name: {path}")]
    BadName { path: PathBuf },

    /// Directory listing or metadata failure
    #[error("failed to scan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end one capture stream.
///
/// The run continues with the remaining streams.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Malformed frame at the given absolute byte offset
    #[error("corrupt frame at offset {offset}: {source}")]
    Corrupt {
        offset: u64,
        #[source]
        source: CorruptFrame,
    },

    /// Read failure on the underlying byte source
    #[error("read failed at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl StreamError {
    /// Absolute byte offset the error refers to.
    pub fn offset(&self) -> u64 {
        match self {
            StreamError::Corrupt { offset, .. } | StreamError::Io { offset, .. } => *offset,
        }
    }

    /// Whether the stream content itself is malformed.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StreamError::Corrupt { .. })
    }
}

/// Errors raised by a handler while consuming a record.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Writing to the output sink failed
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering failed
    #[error("JSON rendering error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a dispatch run.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A handler rejected a record
    #[error("handler failed: {source}")]
    Handler {
        #[source]
        source: HandlerError,
        /// What was read before the abort
        summary: Box<RunSummary>,
    },
}

impl DispatchError {
    /// Summary of the run up to the error.
    pub fn summary(&self) -> &RunSummary {
        match self {
            DispatchError::Handler { summary, .. } => summary,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
