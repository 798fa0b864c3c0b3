//! Frame encoding.
//!
//! The data grid writes capture files itself; this encoder produces the same
//! byte layout for fixtures, fuzz seeds and tooling.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::BufMut;
use uuid::Uuid;

use super::{EXTENSION_FRAME, STRING_DEFINITION_FRAME, STRING_TAG_DEFINITION, STRING_TAG_REFERENCE};
use crate::record::{RecordBody, SessionId};

/// Stateful encoder for one capture stream.
///
/// The first occurrence of a string is written inline with a fresh handle,
/// later occurrences as references to that handle.
#[derive(Debug)]
pub struct Encoder {
    handles: HashMap<Arc<str>, i32>,
    next_handle: i32,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Append one record frame to `out`.
    pub fn encode(&mut self, body: &RecordBody, out: &mut Vec<u8>) {
        out.put_u8(body.kind().ordinal());

        match body {
            RecordBody::CacheStart { cache_id, name } => {
                out.put_i32(*cache_id);
                self.put_string(name, out);
            }
            RecordBody::CacheOperation {
                cache_id,
                start_time,
                duration,
                ..
            } => {
                out.put_i32(*cache_id);
                out.put_i64(*start_time);
                out.put_i64(*duration);
            }
            RecordBody::Transaction {
                cache_ids,
                start_time,
                duration,
                ..
            } => {
                out.put_i32(cache_ids.len() as i32);
                for id in cache_ids {
                    out.put_i32(*id);
                }
                out.put_i64(*start_time);
                out.put_i64(*duration);
            }
            RecordBody::Query {
                query_type,
                text,
                id,
                start_time,
                duration,
                success,
            } => {
                out.put_u8(query_type.ordinal());
                self.put_string(text, out);
                out.put_i64(*id);
                out.put_i64(*start_time);
                out.put_i64(*duration);
                out.put_u8(*success as u8);
            }
            RecordBody::QueryReads {
                query_type,
                query_node_id,
                id,
                logical_reads,
                physical_reads,
            } => {
                out.put_u8(query_type.ordinal());
                put_uuid(*query_node_id, out);
                out.put_i64(*id);
                out.put_i64(*logical_reads);
                out.put_i64(*physical_reads);
            }
            RecordBody::Task {
                session_id,
                task_name,
                start_time,
                duration,
                affinity_partition_id,
            } => {
                put_session_id(session_id, out);
                self.put_string(task_name, out);
                out.put_i64(*start_time);
                out.put_i64(*duration);
                out.put_i32(*affinity_partition_id);
            }
            RecordBody::Job {
                session_id,
                queued_time,
                start_time,
                duration,
                timed_out,
            } => {
                put_session_id(session_id, out);
                out.put_i64(*queued_time);
                out.put_i64(*start_time);
                out.put_i64(*duration);
                out.put_u8(*timed_out as u8);
            }
        }
    }

    /// Append a standalone string-definition frame and remember the handle.
    pub fn define_string(&mut self, handle: i32, value: &str, out: &mut Vec<u8>) {
        out.put_u8(STRING_DEFINITION_FRAME);
        out.put_i32(handle);
        out.put_i32(value.len() as i32);
        out.put_slice(value.as_bytes());
        self.handles.insert(Arc::from(value), handle);
        if handle >= self.next_handle {
            self.next_handle = handle.saturating_add(1);
        }
    }

    /// Append an extension frame with an opaque payload.
    pub fn extension(&mut self, payload: &[u8], out: &mut Vec<u8>) {
        out.put_u8(EXTENSION_FRAME);
        out.put_i32(payload.len() as i32);
        out.put_slice(payload);
    }

    fn put_string(&mut self, value: &Arc<str>, out: &mut Vec<u8>) {
        if let Some(handle) = self.handles.get(value) {
            out.put_u8(STRING_TAG_REFERENCE);
            out.put_i32(*handle);
            return;
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(Arc::clone(value), handle);

        out.put_u8(STRING_TAG_DEFINITION);
        out.put_i32(handle);
        out.put_i32(value.len() as i32);
        out.put_slice(value.as_bytes());
    }
}

fn put_uuid(id: Uuid, out: &mut Vec<u8>) {
    let (msb, lsb) = id.as_u64_pair();
    out.put_u64(msb);
    out.put_u64(lsb);
}

fn put_session_id(id: &SessionId, out: &mut Vec<u8>) {
    put_uuid(id.node_id, out);
    out.put_i64(id.local_id);
}
