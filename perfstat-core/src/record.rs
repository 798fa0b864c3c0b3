//! Decoded performance statistics records.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use smallvec::SmallVec;
use uuid::Uuid;

/// Kind of a recorded operation.
///
/// The discriminant is the op-byte of the frame on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperationKind {
    CacheStart = 0,
    CacheGet = 1,
    CachePut = 2,
    CacheRemove = 3,
    CacheGetAndPut = 4,
    CacheGetAndRemove = 5,
    CacheInvoke = 6,
    CacheLock = 7,
    CacheGetAll = 8,
    CachePutAll = 9,
    CacheRemoveAll = 10,
    CacheInvokeAll = 11,
    TxCommit = 12,
    TxRollback = 13,
    Query = 14,
    QueryReads = 15,
    Task = 16,
    Job = 17,
}

impl OperationKind {
    /// All kinds in ordinal order.
    pub const ALL: [OperationKind; 18] = [
        OperationKind::CacheStart,
        OperationKind::CacheGet,
        OperationKind::CachePut,
        OperationKind::CacheRemove,
        OperationKind::CacheGetAndPut,
        OperationKind::CacheGetAndRemove,
        OperationKind::CacheInvoke,
        OperationKind::CacheLock,
        OperationKind::CacheGetAll,
        OperationKind::CachePutAll,
        OperationKind::CacheRemoveAll,
        OperationKind::CacheInvokeAll,
        OperationKind::TxCommit,
        OperationKind::TxRollback,
        OperationKind::Query,
        OperationKind::QueryReads,
        OperationKind::Task,
        OperationKind::Job,
    ];

    /// Look up a kind by its wire ordinal.
    pub fn from_ordinal(op: u8) -> Option<Self> {
        Self::ALL.get(op as usize).copied()
    }

    /// Wire ordinal of this kind.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Canonical name, as accepted by `--ops` and printed at line start.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::CacheStart => "CACHE_START",
            OperationKind::CacheGet => "CACHE_GET",
            OperationKind::CachePut => "CACHE_PUT",
            OperationKind::CacheRemove => "CACHE_REMOVE",
            OperationKind::CacheGetAndPut => "CACHE_GET_AND_PUT",
            OperationKind::CacheGetAndRemove => "CACHE_GET_AND_REMOVE",
            OperationKind::CacheInvoke => "CACHE_INVOKE",
            OperationKind::CacheLock => "CACHE_LOCK",
            OperationKind::CacheGetAll => "CACHE_GET_ALL",
            OperationKind::CachePutAll => "CACHE_PUT_ALL",
            OperationKind::CacheRemoveAll => "CACHE_REMOVE_ALL",
            OperationKind::CacheInvokeAll => "CACHE_INVOKE_ALL",
            OperationKind::TxCommit => "TX_COMMIT",
            OperationKind::TxRollback => "TX_ROLLBACK",
            OperationKind::Query => "QUERY",
            OperationKind::QueryReads => "QUERY_READS",
            OperationKind::Task => "TASK",
            OperationKind::Job => "JOB",
        }
    }

    /// Per-operation cache access (everything between CACHE_START and TX_COMMIT).
    pub fn is_cache_operation(self) -> bool {
        (OperationKind::CacheGet as u8..=OperationKind::CacheInvokeAll as u8)
            .contains(&(self as u8))
    }

    /// Transaction outcome kinds.
    pub fn is_transaction(self) -> bool {
        matches!(self, OperationKind::TxCommit | OperationKind::TxRollback)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown operation kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation kind '{0}'")]
pub struct UnknownOperationKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    /// Names are matched case-sensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownOperationKind(s.to_string()))
    }
}

/// Kind of query reported by QUERY and QUERY_READS records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QueryType {
    Spi = 0,
    Scan = 1,
    Sql = 2,
    SqlFields = 3,
    Text = 4,
    Set = 5,
    Index = 6,
}

impl QueryType {
    /// Look up a query type by its wire ordinal.
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(QueryType::Spi),
            1 => Some(QueryType::Scan),
            2 => Some(QueryType::Sql),
            3 => Some(QueryType::SqlFields),
            4 => Some(QueryType::Text),
            5 => Some(QueryType::Set),
            6 => Some(QueryType::Index),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            QueryType::Spi => "SPI",
            QueryType::Scan => "SCAN",
            QueryType::Sql => "SQL",
            QueryType::SqlFields => "SQL_FIELDS",
            QueryType::Text => "TEXT",
            QueryType::Set => "SET",
            QueryType::Index => "INDEX",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one task and all of its jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    /// Node that started the task
    pub node_id: Uuid,
    /// Node-local monotonic counter
    pub local_id: i64,
}

impl fmt::Display for SessionId {
    /// Renders as `<local id in hex>-<node id>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{}", self.local_id, self.node_id)
    }
}

/// Cache ids touched by a transaction. Most transactions touch very few caches.
pub type CacheIdList = SmallVec<[i32; 4]>;

/// Kind-specific payload of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// A cache was registered on the node
    CacheStart { cache_id: i32, name: Arc<str> },

    /// Single cache access; `kind` is one of the CACHE_* access kinds
    CacheOperation {
        kind: OperationKind,
        cache_id: i32,
        start_time: i64,
        duration: i64,
    },

    /// Committed or rolled back transaction
    Transaction {
        cache_ids: CacheIdList,
        start_time: i64,
        duration: i64,
        committed: bool,
    },

    /// Finished query
    Query {
        query_type: QueryType,
        text: Arc<str>,
        id: i64,
        start_time: i64,
        duration: i64,
        success: bool,
    },

    /// Page reads for a query started on `query_node_id`
    QueryReads {
        query_type: QueryType,
        query_node_id: Uuid,
        id: i64,
        logical_reads: i64,
        physical_reads: i64,
    },

    /// Completed distributed task
    Task {
        session_id: SessionId,
        task_name: Arc<str>,
        start_time: i64,
        duration: i64,
        affinity_partition_id: i32,
    },

    /// Completed job of a task
    Job {
        session_id: SessionId,
        queued_time: i64,
        start_time: i64,
        duration: i64,
        timed_out: bool,
    },
}

impl RecordBody {
    pub fn kind(&self) -> OperationKind {
        match self {
            RecordBody::CacheStart { .. } => OperationKind::CacheStart,
            RecordBody::CacheOperation { kind, .. } => *kind,
            RecordBody::Transaction { committed: true, .. } => OperationKind::TxCommit,
            RecordBody::Transaction { committed: false, .. } => OperationKind::TxRollback,
            RecordBody::Query { .. } => OperationKind::Query,
            RecordBody::QueryReads { .. } => OperationKind::QueryReads,
            RecordBody::Task { .. } => OperationKind::Task,
            RecordBody::Job { .. } => OperationKind::Job,
        }
    }

    /// Start time in epoch milliseconds, if the record carries one.
    pub fn start_time(&self) -> Option<i64> {
        match self {
            RecordBody::CacheStart { .. } | RecordBody::QueryReads { .. } => None,
            RecordBody::CacheOperation { start_time, .. }
            | RecordBody::Transaction { start_time, .. }
            | RecordBody::Query { start_time, .. }
            | RecordBody::Task { start_time, .. }
            | RecordBody::Job { start_time, .. } => Some(*start_time),
        }
    }

    /// Caches this record is associated with, if any.
    pub fn cache_ids(&self) -> Option<&[i32]> {
        match self {
            RecordBody::CacheStart { cache_id, .. }
            | RecordBody::CacheOperation { cache_id, .. } => Some(std::slice::from_ref(cache_id)),
            RecordBody::Transaction { cache_ids, .. } => Some(cache_ids.as_slice()),
            _ => None,
        }
    }
}

/// A decoded record tagged with the node that produced its capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub node_id: Uuid,
    pub body: RecordBody,
}

impl Record {
    pub fn new(node_id: Uuid, body: RecordBody) -> Self {
        Self { node_id, body }
    }

    pub fn kind(&self) -> OperationKind {
        self.body.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_operation_kind_ordinals_are_stable() {
        for (i, kind) in OperationKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal() as usize, i);
            assert_eq!(OperationKind::from_ordinal(i as u8), Some(*kind));
        }
        assert_eq!(OperationKind::from_ordinal(18), None);
        assert_eq!(OperationKind::TxCommit.ordinal(), 12);
        assert_eq!(OperationKind::Job.ordinal(), 17);
    }

    #[test]
    fn test_operation_kind_parse_is_case_sensitive() {
        assert_eq!("CACHE_START".parse::<OperationKind>(), Ok(OperationKind::CacheStart));
        assert_eq!("QUERY_READS".parse::<OperationKind>(), Ok(OperationKind::QueryReads));
        assert!("cache_start".parse::<OperationKind>().is_err());
        assert!("CACHE".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_operation_kind_name_roundtrip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.to_string().parse::<OperationKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_cache_operation_range() {
        assert!(!OperationKind::CacheStart.is_cache_operation());
        assert!(OperationKind::CacheGet.is_cache_operation());
        assert!(OperationKind::CacheInvokeAll.is_cache_operation());
        assert!(!OperationKind::TxCommit.is_cache_operation());
        assert!(OperationKind::TxRollback.is_transaction());
    }

    #[test]
    fn test_query_type_unknown() {
        assert_eq!(QueryType::from_ordinal(3), Some(QueryType::SqlFields));
        assert_eq!(QueryType::from_ordinal(7), None);
    }

    #[test]
    fn test_session_id_display() {
        let node_id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let ses = SessionId { node_id, local_id: 255 };
        assert_eq!(ses.to_string(), "ff-01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn test_projections() {
        let tx = RecordBody::Transaction {
            cache_ids: smallvec![1, 2],
            start_time: 10,
            duration: 5,
            committed: false,
        };
        assert_eq!(tx.kind(), OperationKind::TxRollback);
        assert_eq!(tx.start_time(), Some(10));
        assert_eq!(tx.cache_ids(), Some(&[1, 2][..]));

        let start = RecordBody::CacheStart {
            cache_id: -7,
            name: "cache".into(),
        };
        assert_eq!(start.start_time(), None);
        assert_eq!(start.cache_ids(), Some(&[-7][..]));

        let reads = RecordBody::QueryReads {
            query_type: QueryType::Sql,
            query_node_id: Uuid::nil(),
            id: 1,
            logical_reads: 2,
            physical_reads: 3,
        };
        assert_eq!(reads.start_time(), None);
        assert_eq!(reads.cache_ids(), None);
    }
}
