//! Fan-out of decoded records to handlers.
//!
//! Streams are drained one after another in the order the scanner returned
//! them, so the records of one node keep their on-disk order across rollover
//! files. Every admitted record is offered to every handler in registration
//! order.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::codec::DecodeLimits;
use crate::error::{DispatchError, HandlerError, StreamError};
use crate::filter::RecordFilter;
use crate::reader::StreamReader;
use crate::record::Record;
use crate::scan::CaptureFile;

/// Consumer of decoded records.
pub trait Handler {
    /// Consume one record. The record is only borrowed for the call.
    fn handle(&mut self, record: &Record) -> Result<(), HandlerError>;

    /// Called once after the last record, including after cancellation.
    fn finish(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Shared flag used to stop a run from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a stream ended early.
#[derive(Debug)]
pub enum FailureReason {
    /// The file could not be opened
    Open(std::io::Error),
    /// Decoding or reading failed part way through
    Stream(StreamError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Open(e) => write!(f, "failed to open: {e}"),
            FailureReason::Stream(StreamError::Corrupt { source, .. }) => write!(f, "{source}"),
            FailureReason::Stream(StreamError::Io { source, .. }) => write!(f, "{source}"),
        }
    }
}

/// A stream that did not reach its natural end.
#[derive(Debug)]
pub struct StreamFailure {
    pub path: PathBuf,
    /// Absolute offset of the failure, if the stream was opened
    pub offset: Option<u64>,
    pub reason: FailureReason,
}

impl StreamFailure {
    /// Whether the stream content itself is malformed.
    pub fn is_corrupt(&self) -> bool {
        matches!(&self.reason, FailureReason::Stream(e) if e.is_corrupt())
    }
}

/// Outcome of a dispatch run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Streams opened or attempted
    pub streams: usize,
    /// Records decoded
    pub records_read: u64,
    /// Records that passed the filter
    pub records_admitted: u64,
    /// Streams that ended inside a frame
    pub truncated_streams: Vec<PathBuf>,
    pub failures: Vec<StreamFailure>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Drains capture streams through a filter into handlers.
pub struct Dispatcher {
    handlers: Vec<Box<dyn Handler + Send>>,
    filter: RecordFilter,
    limits: DecodeLimits,
    cancel: CancelToken,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            filter: RecordFilter::default(),
            limits: DecodeLimits::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Register a handler. Handlers see records in registration order.
    pub fn add_handler(&mut self, handler: impl Handler + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Token that stops this dispatcher when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Drain `files` in order.
    ///
    /// A stream that fails is recorded in the summary and the run moves on to
    /// the next one. A handler error aborts the run; the error carries the
    /// summary of what was read up to that point.
    pub fn run(&mut self, files: &[CaptureFile]) -> Result<RunSummary, DispatchError> {
        let mut summary = RunSummary::default();
        let result = self.drain_all(files, &mut summary);

        tracing::info!(
            streams = summary.streams,
            records_read = summary.records_read,
            records_admitted = summary.records_admitted,
            truncated = summary.truncated_streams.len(),
            failed = summary.failures.len(),
            cancelled = summary.cancelled,
            aborted = result.is_err(),
            "dispatch finished"
        );

        match result {
            Ok(()) => Ok(summary),
            Err(source) => Err(DispatchError::Handler {
                source,
                summary: Box::new(summary),
            }),
        }
    }

    fn drain_all(
        &mut self,
        files: &[CaptureFile],
        summary: &mut RunSummary,
    ) -> Result<(), HandlerError> {
        for file in files {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            summary.streams += 1;
            self.drain(file, summary)?;
            if summary.cancelled {
                break;
            }
        }

        for handler in &mut self.handlers {
            handler.finish()?;
        }
        Ok(())
    }

    fn drain(&mut self, file: &CaptureFile, summary: &mut RunSummary) -> Result<(), HandlerError> {
        tracing::debug!(path = %file.path.display(), node = %file.node_id, "reading capture file");

        let source = match file.open() {
            Ok(source) => source,
            Err(e) => {
                summary.failures.push(StreamFailure {
                    path: file.path.clone(),
                    offset: None,
                    reason: FailureReason::Open(e),
                });
                return Ok(());
            }
        };

        let mut reader = StreamReader::with_limits(source, file.node_id, self.limits);
        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let record = match reader.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(path = %file.path.display(), error = %e, "stream failed");
                    summary.failures.push(StreamFailure {
                        path: file.path.clone(),
                        offset: Some(e.offset()),
                        reason: FailureReason::Stream(e),
                    });
                    break;
                }
            };

            summary.records_read += 1;
            if !self.filter.matches(&record.body) {
                continue;
            }
            summary.records_admitted += 1;

            for handler in &mut self.handlers {
                handler.handle(&record)?;
            }
        }

        if reader.is_truncated() {
            summary.truncated_streams.push(file.path.clone());
        }

        Ok(())
    }
}
