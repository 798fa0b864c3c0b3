//! Sequential record reader over one capture stream.

use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use uuid::Uuid;

use crate::codec::{decode, DecodeLimits, Decoded, StringDictionary};
use crate::error::StreamError;
use crate::record::Record;

/// Refill chunk size (64KB).
const CHUNK_SIZE: usize = 65536;

/// Reads records from one capture stream.
///
/// Capture files are appended to by a live producer that may be killed
/// mid-frame, so a partial frame at end of stream is a clean end, not an
/// error. A corrupt frame ends the stream; later calls return `Ok(None)`.
pub struct StreamReader<R: Read> {
    source: R,
    node_id: Uuid,
    limits: DecodeLimits,
    dict: StringDictionary,
    buf: BytesMut,
    chunk: Box<[u8]>,
    /// Absolute offset of `buf[0]` in the stream
    offset: u64,
    records: u64,
    eof: bool,
    finished: bool,
    truncated: bool,
}

impl<R: Read> StreamReader<R> {
    pub fn new(source: R, node_id: Uuid) -> Self {
        Self::with_limits(source, node_id, DecodeLimits::default())
    }

    pub fn with_limits(source: R, node_id: Uuid, limits: DecodeLimits) -> Self {
        Self {
            source,
            node_id,
            limits,
            dict: StringDictionary::new(),
            buf: BytesMut::with_capacity(CHUNK_SIZE),
            chunk: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            offset: 0,
            records: 0,
            eof: false,
            finished: false,
            truncated: false,
        }
    }

    /// Node every record of this stream is attributed to.
    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    /// Offset of the first byte not yet consumed as a complete frame.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Records returned so far.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Whether the stream ended inside a frame.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` at end of stream, including after a truncated tail.
    pub fn next_record(&mut self) -> Result<Option<Record>, StreamError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match decode(&self.buf, &mut self.dict, &self.limits) {
                Ok(Decoded::Record { body, consumed }) => {
                    self.advance(consumed);
                    self.records += 1;
                    return Ok(Some(Record::new(self.node_id, body)));
                }
                Ok(Decoded::Control { consumed }) => self.advance(consumed),
                Ok(Decoded::NeedMore) => {
                    if self.eof {
                        self.finish_at_eof();
                        return Ok(None);
                    }
                    self.fill()?;
                }
                Err(source) => {
                    self.finished = true;
                    return Err(StreamError::Corrupt {
                        offset: self.offset,
                        source,
                    });
                }
            }
        }
    }

    fn advance(&mut self, n: usize) {
        self.buf.advance(n);
        self.offset += n as u64;
    }

    fn fill(&mut self) -> Result<(), StreamError> {
        loop {
            match self.source.read(&mut self.chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&self.chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    self.finished = true;
                    return Err(StreamError::Io {
                        offset: self.offset + self.buf.len() as u64,
                        source,
                    });
                }
            }
        }
    }

    fn finish_at_eof(&mut self) {
        self.finished = true;
        if !self.buf.is_empty() {
            self.truncated = true;
            tracing::info!(
                node = %self.node_id,
                offset = self.offset,
                trailing = self.buf.len(),
                "stream ends inside a frame, ignoring truncated tail"
            );
            self.buf.clear();
        }
    }
}

impl<R: Read> Iterator for StreamReader<R> {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
