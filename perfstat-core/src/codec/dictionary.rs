//! Per-stream string dictionary.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CorruptFrame;

/// Write-once mapping from producer-chosen handles to string values.
///
/// Handles are local to one stream; two streams may use the same handle for
/// different strings.
#[derive(Debug, Default)]
pub struct StringDictionary {
    entries: HashMap<i32, Arc<str>>,
}

impl StringDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle -> bytes`.
    ///
    /// Redefining a handle with identical bytes is a no-op; different bytes
    /// are a conflict.
    pub fn define(&mut self, handle: i32, bytes: &[u8]) -> Result<Arc<str>, CorruptFrame> {
        let existing = self.entries.get(&handle);
        let is_new = existing.is_none();
        let value = check_definition(existing, handle, bytes)?;
        if is_new {
            self.entries.insert(handle, Arc::clone(&value));
        }
        Ok(value)
    }

    /// Install a value already checked against this dictionary.
    pub(crate) fn insert(&mut self, handle: i32, value: Arc<str>) {
        self.entries.entry(handle).or_insert(value);
    }

    /// Resolve a reference.
    pub fn resolve(&self, handle: i32) -> Result<Arc<str>, CorruptFrame> {
        self.get(handle)
            .cloned()
            .ok_or(CorruptFrame::UndefinedString { handle })
    }

    pub fn get(&self, handle: i32) -> Option<&Arc<str>> {
        self.entries.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate a definition of `handle` against its current value, if any.
///
/// Returns the value the handle maps to after the definition.
pub(crate) fn check_definition(
    existing: Option<&Arc<str>>,
    handle: i32,
    bytes: &[u8],
) -> Result<Arc<str>, CorruptFrame> {
    match existing {
        Some(existing) if existing.as_bytes() == bytes => Ok(Arc::clone(existing)),
        Some(_) => Err(CorruptFrame::ConflictingString { handle }),
        None => std::str::from_utf8(bytes)
            .map(Arc::from)
            .map_err(|_| CorruptFrame::InvalidUtf8 { handle }),
    }
}
