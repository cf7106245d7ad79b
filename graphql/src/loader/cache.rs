use std::collections::HashMap;

use graph::prelude::{QueryExecutionError, Value};

use super::Key;

/// Remembers what was loaded for a `(field, key)` pair for the lifetime of
/// one operation. Failures are remembered as well, so a key whose batch
/// failed is not fetched again within the same operation.
#[derive(Default)]
pub struct PerRequestCache {
    entries: HashMap<String, HashMap<Key, Result<Value, QueryExecutionError>>>,
    hits: usize,
}

impl PerRequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, field: &str, key: &str) -> Option<Result<Value, QueryExecutionError>> {
        let hit = self.entries.get(field)?.get(key).cloned();
        if hit.is_some() {
            self.hits += 1;
        }
        hit
    }

    pub fn contains(&self, field: &str, key: &str) -> bool {
        self.entries
            .get(field)
            .map_or(false, |values| values.contains_key(key))
    }

    /// Entries are written once; returns `false` and keeps the existing
    /// entry if `(field, key)` was already cached.
    pub fn insert(
        &mut self,
        field: &str,
        key: Key,
        value: Result<Value, QueryExecutionError>,
    ) -> bool {
        let values = self.entries.entry(field.to_owned()).or_default();
        if values.contains_key(&key) {
            return false;
        }
        values.insert(key, value);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
