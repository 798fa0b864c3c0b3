//! Record filtering.
//!
//! Three independent predicates, combined with AND. An unset predicate
//! admits everything, and a predicate never rejects a record that lacks the
//! attribute it tests.

use std::collections::HashSet;

use crate::record::{OperationKind, RecordBody};

/// Immutable predicate chain applied before records reach handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    ops: Option<HashSet<OperationKind>>,
    from: Option<i64>,
    to: Option<i64>,
    cache_ids: Option<HashSet<i32>>,
}

impl RecordFilter {
    /// Filter that admits every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit only the given operation kinds.
    pub fn with_ops(mut self, ops: impl IntoIterator<Item = OperationKind>) -> Self {
        self.ops = Some(ops.into_iter().collect());
        self
    }

    /// Admit records whose start time lies in `[from, to]` (inclusive).
    pub fn with_time_window(mut self, from: Option<i64>, to: Option<i64>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Admit only records associated with one of the given caches.
    pub fn with_cache_ids(mut self, cache_ids: impl IntoIterator<Item = i32>) -> Self {
        self.cache_ids = Some(cache_ids.into_iter().collect());
        self
    }

    /// Whether no predicate is set.
    pub fn is_pass_all(&self) -> bool {
        self.ops.is_none() && self.from.is_none() && self.to.is_none() && self.cache_ids.is_none()
    }

    pub fn matches(&self, body: &RecordBody) -> bool {
        self.matches_ops(body) && self.matches_window(body) && self.matches_cache_ids(body)
    }

    fn matches_ops(&self, body: &RecordBody) -> bool {
        self.ops.as_ref().map_or(true, |ops| ops.contains(&body.kind()))
    }

    fn matches_window(&self, body: &RecordBody) -> bool {
        let Some(start_time) = body.start_time() else {
            return true;
        };
        self.from.map_or(true, |from| start_time >= from)
            && self.to.map_or(true, |to| start_time <= to)
    }

    fn matches_cache_ids(&self, body: &RecordBody) -> bool {
        match (&self.cache_ids, body.cache_ids()) {
            (Some(allowed), Some(ids)) => ids.iter().any(|id| allowed.contains(id)),
            _ => true,
        }
    }
}
