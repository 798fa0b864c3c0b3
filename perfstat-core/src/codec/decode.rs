//! Frame decoding.

use std::sync::Arc;

use bytes::Buf;
use smallvec::SmallVec;
use uuid::Uuid;

use super::dictionary::{check_definition, StringDictionary};
use super::{DecodeLimits, EXTENSION_FRAME, STRING_DEFINITION_FRAME, STRING_TAG_DEFINITION, STRING_TAG_REFERENCE};
use crate::error::CorruptFrame;
use crate::record::{CacheIdList, OperationKind, QueryType, RecordBody, SessionId};

/// Outcome of decoding the frame at the start of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A record frame of `consumed` bytes
    Record { body: RecordBody, consumed: usize },
    /// A string-definition or extension frame of `consumed` bytes
    Control { consumed: usize },
    /// The buffer is a proper prefix of a frame
    NeedMore,
}

/// Internal failure while walking a frame.
enum Step {
    Incomplete,
    Corrupt(CorruptFrame),
}

impl From<CorruptFrame> for Step {
    fn from(err: CorruptFrame) -> Self {
        Step::Corrupt(err)
    }
}

/// Decode the frame at the start of `buf`.
///
/// String definitions found in the frame are installed in `dict` only when
/// the whole frame decoded, so a `NeedMore` leaves the dictionary untouched
/// and the same bytes can be decoded again after a refill.
pub fn decode(
    buf: &[u8],
    dict: &mut StringDictionary,
    limits: &DecodeLimits,
) -> Result<Decoded, CorruptFrame> {
    let mut cursor = FrameCursor {
        data: buf,
        limits,
        strings: PendingStrings {
            dict,
            pending: SmallVec::new(),
        },
    };

    let body = match cursor.frame() {
        Ok(body) => body,
        Err(Step::Incomplete) => return Ok(Decoded::NeedMore),
        Err(Step::Corrupt(err)) => return Err(err),
    };

    let consumed = buf.len() - cursor.data.len();
    let PendingStrings { dict, pending } = cursor.strings;
    for (handle, value) in pending {
        dict.insert(handle, value);
    }

    Ok(match body {
        Some(body) => Decoded::Record { body, consumed },
        None => Decoded::Control { consumed },
    })
}

/// Dictionary view that stages definitions until the frame is complete.
struct PendingStrings<'d> {
    dict: &'d mut StringDictionary,
    pending: SmallVec<[(i32, Arc<str>); 2]>,
}

impl PendingStrings<'_> {
    fn define(&mut self, handle: i32, bytes: &[u8]) -> Result<Arc<str>, CorruptFrame> {
        let existing = self
            .dict
            .get(handle)
            .or_else(|| self.pending.iter().find(|(h, _)| *h == handle).map(|(_, v)| v));
        let is_new = existing.is_none();
        let value = check_definition(existing, handle, bytes)?;
        if is_new {
            self.pending.push((handle, Arc::clone(&value)));
        }
        Ok(value)
    }

    fn resolve(&self, handle: i32) -> Result<Arc<str>, CorruptFrame> {
        if let Some(value) = self.dict.get(handle) {
            return Ok(Arc::clone(value));
        }
        self.pending
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, v)| Arc::clone(v))
            .ok_or(CorruptFrame::UndefinedString { handle })
    }
}

/// Big-endian reader over one frame.
struct FrameCursor<'a, 'd> {
    data: &'a [u8],
    limits: &'a DecodeLimits,
    strings: PendingStrings<'d>,
}

impl<'a> FrameCursor<'a, '_> {
    fn ensure(&self, n: usize) -> Result<(), Step> {
        if self.data.remaining() < n {
            Err(Step::Incomplete)
        } else {
            Ok(())
        }
    }

    fn u8(&mut self) -> Result<u8, Step> {
        self.ensure(1)?;
        Ok(self.data.get_u8())
    }

    fn i32(&mut self) -> Result<i32, Step> {
        self.ensure(4)?;
        Ok(self.data.get_i32())
    }

    fn i64(&mut self) -> Result<i64, Step> {
        self.ensure(8)?;
        Ok(self.data.get_i64())
    }

    fn bool(&mut self) -> Result<bool, Step> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CorruptFrame::InvalidBool { value }.into()),
        }
    }

    fn uuid(&mut self) -> Result<Uuid, Step> {
        let msb = self.i64()? as u64;
        let lsb = self.i64()? as u64;
        Ok(Uuid::from_u64_pair(msb, lsb))
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], Step> {
        self.ensure(n)?;
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    /// Length prefix checked against the configured cap.
    fn length(&mut self, field: &'static str, unit: usize) -> Result<usize, Step> {
        let value = self.i32()?;
        if value < 0 {
            return Err(CorruptFrame::NegativeLength { field, value }.into());
        }
        let len = value as usize;
        let bytes = len.saturating_mul(unit);
        if bytes > self.limits.max_field_len {
            return Err(CorruptFrame::LengthTooLarge {
                field,
                len: bytes,
                max: self.limits.max_field_len,
            }
            .into());
        }
        Ok(len)
    }

    fn string(&mut self) -> Result<Arc<str>, Step> {
        let tag = self.u8()?;
        if tag != STRING_TAG_DEFINITION && tag != STRING_TAG_REFERENCE {
            return Err(CorruptFrame::InvalidStringTag { tag }.into());
        }
        let handle = self.i32()?;
        match tag {
            STRING_TAG_DEFINITION => {
                let len = self.length("string length", 1)?;
                let bytes = self.bytes(len)?;
                Ok(self.strings.define(handle, bytes)?)
            }
            _ => Ok(self.strings.resolve(handle)?),
        }
    }

    fn query_type(&mut self) -> Result<QueryType, Step> {
        let value = self.u8()?;
        QueryType::from_ordinal(value).ok_or_else(|| CorruptFrame::UnknownQueryType { value }.into())
    }

    fn session_id(&mut self) -> Result<SessionId, Step> {
        let node_id = self.uuid()?;
        let local_id = self.i64()?;
        Ok(SessionId { node_id, local_id })
    }

    fn cache_id_list(&mut self) -> Result<CacheIdList, Step> {
        let count = self.length("cache id count", 4)?;
        self.ensure(count * 4)?;
        let mut ids = CacheIdList::with_capacity(count);
        for _ in 0..count {
            ids.push(self.i32()?);
        }
        Ok(ids)
    }

    /// Decode one frame. `None` means a frame that carries no record.
    fn frame(&mut self) -> Result<Option<RecordBody>, Step> {
        let op = self.u8()?;

        match op {
            STRING_DEFINITION_FRAME => {
                let handle = self.i32()?;
                let len = self.length("string length", 1)?;
                let bytes = self.bytes(len)?;
                self.strings.define(handle, bytes)?;
                return Ok(None);
            }
            EXTENSION_FRAME => {
                let len = self.length("extension length", 1)?;
                self.bytes(len)?;
                return Ok(None);
            }
            _ => {}
        }

        let kind = OperationKind::from_ordinal(op).ok_or(CorruptFrame::UnknownOp { op })?;

        let body = match kind {
            OperationKind::CacheStart => {
                let cache_id = self.i32()?;
                let name = self.string()?;
                RecordBody::CacheStart { cache_id, name }
            }
            kind if kind.is_cache_operation() => RecordBody::CacheOperation {
                kind,
                cache_id: self.i32()?,
                start_time: self.i64()?,
                duration: self.i64()?,
            },
            OperationKind::TxCommit | OperationKind::TxRollback => RecordBody::Transaction {
                cache_ids: self.cache_id_list()?,
                start_time: self.i64()?,
                duration: self.i64()?,
                committed: kind == OperationKind::TxCommit,
            },
            OperationKind::Query => RecordBody::Query {
                query_type: self.query_type()?,
                text: self.string()?,
                id: self.i64()?,
                start_time: self.i64()?,
                duration: self.i64()?,
                success: self.bool()?,
            },
            OperationKind::QueryReads => RecordBody::QueryReads {
                query_type: self.query_type()?,
                query_node_id: self.uuid()?,
                id: self.i64()?,
                logical_reads: self.i64()?,
                physical_reads: self.i64()?,
            },
            OperationKind::Task => RecordBody::Task {
                session_id: self.session_id()?,
                task_name: self.string()?,
                start_time: self.i64()?,
                duration: self.i64()?,
                affinity_partition_id: self.i32()?,
            },
            OperationKind::Job => RecordBody::Job {
                session_id: self.session_id()?,
                queued_time: self.i64()?,
                start_time: self.i64()?,
                duration: self.i64()?,
                timed_out: self.bool()?,
            },
            _ => unreachable!("cache operations handled above"),
        };

        Ok(Some(body))
    }
}
