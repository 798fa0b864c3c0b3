//! Human-readable and JSON rendering of records.
//!
//! Every record becomes one line: the operation kind followed by its fields in
//! a fixed per-kind order.
//!
//! ```text
//! CACHE_GET [nodeId=6ba7b810-9dad-11d1-80b4-00c04fd430c8, cacheId=1, startTime=10, duration=2]
//! {"op":"CACHE_GET","nodeId":"6ba7b810-9dad-11d1-80b4-00c04fd430c8","cacheId":1,"startTime":10,"duration":2}
//! ```

use std::fmt;
use std::io::Write;

use smallvec::SmallVec;
use uuid::Uuid;

use crate::dispatch::Handler;
use crate::error::HandlerError;
use crate::record::{QueryType, Record, RecordBody, SessionId};

/// Line rendering mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `OP [key=value, ...]` (default)
    #[default]
    Text,
    /// JSON Lines (one JSON object per record)
    Json,
}

/// A single printable field value, borrowed from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    Str(&'a str),
    QueryType(QueryType),
    Session(SessionId),
    /// Cache id list of a transaction
    IntList(&'a [i32]),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Uuid(v) => write!(f, "{}", v.hyphenated()),
            FieldValue::Str(v) => f.write_str(v),
            FieldValue::QueryType(v) => f.write_str(v.name()),
            FieldValue::Session(v) => write!(f, "{v}"),
            FieldValue::IntList(ids) => {
                f.write_str("[")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl FieldValue<'_> {
    /// Convert to a JSON value. Numbers and booleans keep their type;
    /// everything else, cache id lists included, is its text form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Int(v) => serde_json::Value::from(*v),
            FieldValue::Bool(v) => serde_json::Value::Bool(*v),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

/// Named fields of a record, in output order.
pub type Fields<'a> = SmallVec<[(&'static str, FieldValue<'a>); 8]>;

/// Project a record onto its printable fields.
pub fn fields(record: &Record) -> Fields<'_> {
    let mut out = Fields::new();
    out.push(("nodeId", FieldValue::Uuid(record.node_id)));

    match &record.body {
        RecordBody::CacheStart { cache_id, name } => {
            out.push(("cacheId", FieldValue::Int(i64::from(*cache_id))));
            out.push(("name", FieldValue::Str(name)));
        }
        RecordBody::CacheOperation {
            cache_id,
            start_time,
            duration,
            ..
        } => {
            out.push(("cacheId", FieldValue::Int(i64::from(*cache_id))));
            out.push(("startTime", FieldValue::Int(*start_time)));
            out.push(("duration", FieldValue::Int(*duration)));
        }
        RecordBody::Transaction {
            cache_ids,
            start_time,
            duration,
            ..
        } => {
            out.push(("cacheIds", FieldValue::IntList(cache_ids)));
            out.push(("startTime", FieldValue::Int(*start_time)));
            out.push(("duration", FieldValue::Int(*duration)));
        }
        RecordBody::Query {
            query_type,
            text,
            id,
            start_time,
            duration,
            success,
        } => {
            out.push(("type", FieldValue::QueryType(*query_type)));
            out.push(("text", FieldValue::Str(text)));
            out.push(("id", FieldValue::Int(*id)));
            out.push(("startTime", FieldValue::Int(*start_time)));
            out.push(("duration", FieldValue::Int(*duration)));
            out.push(("success", FieldValue::Bool(*success)));
        }
        RecordBody::QueryReads {
            query_type,
            query_node_id,
            id,
            logical_reads,
            physical_reads,
        } => {
            out.push(("type", FieldValue::QueryType(*query_type)));
            out.push(("queryNodeId", FieldValue::Uuid(*query_node_id)));
            out.push(("id", FieldValue::Int(*id)));
            out.push(("logicalReads", FieldValue::Int(*logical_reads)));
            out.push(("physicalReads", FieldValue::Int(*physical_reads)));
        }
        RecordBody::Task {
            session_id,
            task_name,
            start_time,
            duration,
            affinity_partition_id,
        } => {
            out.push(("sesId", FieldValue::Session(*session_id)));
            out.push(("taskName", FieldValue::Str(task_name)));
            out.push(("startTime", FieldValue::Int(*start_time)));
            out.push(("duration", FieldValue::Int(*duration)));
            out.push(("affPartId", FieldValue::Int(i64::from(*affinity_partition_id))));
        }
        RecordBody::Job {
            session_id,
            queued_time,
            start_time,
            duration,
            timed_out,
        } => {
            out.push(("sesId", FieldValue::Session(*session_id)));
            out.push(("queuedTime", FieldValue::Int(*queued_time)));
            out.push(("startTime", FieldValue::Int(*start_time)));
            out.push(("duration", FieldValue::Int(*duration)));
            out.push(("timedOut", FieldValue::Bool(*timed_out)));
        }
    }

    out
}

/// Handler that writes one line per record to a sink.
pub struct PrintHandler<W: Write> {
    writer: W,
    format: OutputFormat,
    /// Reused line buffer so each line reaches the sink in one write
    line: Vec<u8>,
    lines: u64,
}

impl<W: Write> PrintHandler<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            line: Vec::with_capacity(256),
            lines: 0,
        }
    }

    /// Lines written so far.
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn render_text(&mut self, record: &Record) -> Result<(), HandlerError> {
        write!(self.line, "{} [", record.kind())?;
        for (i, (key, value)) in fields(record).iter().enumerate() {
            if i > 0 {
                self.line.extend_from_slice(b", ");
            }
            write!(self.line, "{key}={value}")?;
        }
        self.line.extend_from_slice(b"]\n");
        Ok(())
    }

    fn render_json(&mut self, record: &Record) -> Result<(), HandlerError> {
        let mut obj = serde_json::Map::new();
        obj.insert("op".to_string(), record.kind().name().into());
        for (key, value) in fields(record) {
            obj.insert(key.to_string(), value.to_json());
        }
        serde_json::to_writer(&mut self.line, &serde_json::Value::Object(obj))?;
        self.line.push(b'\n');
        Ok(())
    }
}

impl<W: Write> Handler for PrintHandler<W> {
    fn handle(&mut self, record: &Record) -> Result<(), HandlerError> {
        self.line.clear();
        match self.format {
            OutputFormat::Text => self.render_text(record)?,
            OutputFormat::Json => self.render_json(record)?,
        }
        self.writer.write_all(&self.line)?;
        self.lines += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), HandlerError> {
        self.writer.flush()?;
        Ok(())
    }
}
