use futures03::channel::oneshot;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use graph::prelude::{CheapClone, QueryExecutionError, Value};

use super::{BatchResult, FieldLoader, Key};

type LoadResult = Result<Value, QueryExecutionError>;

/// The value a field will eventually resolve to. Either it is known right
/// away because it was cached, or it arrives once the batch for its field
/// has been dispatched.
pub struct LoadHandle {
    inner: HandleInner,
}

enum HandleInner {
    Ready(LoadResult),
    Pending(oneshot::Receiver<LoadResult>),
}

impl LoadHandle {
    pub fn ready(result: LoadResult) -> Self {
        LoadHandle {
            inner: HandleInner::Ready(result),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.inner, HandleInner::Ready(_))
    }

    /// Wait for the value. A handle whose batch was dropped without being
    /// dispatched, e.g. because the operation went away, fails with
    /// `Canceled`.
    pub async fn wait(self) -> LoadResult {
        match self.inner {
            HandleInner::Ready(result) => result,
            HandleInner::Pending(receiver) => receiver
                .await
                .unwrap_or(Err(QueryExecutionError::Canceled)),
        }
    }
}

/// The keys registered for one field during the current phase, together
/// with everyone waiting for them.
pub struct PendingBatch {
    field: String,
    loader: Arc<dyn FieldLoader>,
    waiters: BTreeMap<Key, Vec<oneshot::Sender<LoadResult>>>,
}

impl PendingBatch {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn loader(&self) -> Arc<dyn FieldLoader> {
        self.loader.cheap_clone()
    }

    /// The distinct keys of this batch, in sorted order.
    pub fn keys(&self) -> BTreeSet<Key> {
        self.waiters.keys().cloned().collect()
    }

    /// Hand every waiter its value. A failed load fails all waiters with the
    /// same error. Returns the value for each key so it can be cached.
    pub fn fulfill(
        self,
        result: Result<BatchResult<Value>, QueryExecutionError>,
    ) -> Vec<(Key, LoadResult)> {
        self.waiters
            .into_iter()
            .map(|(key, senders)| {
                let value = match &result {
                    Ok(values) => Ok(values.get(&key).cloned().unwrap_or(Value::Null)),
                    Err(e) => Err(e.clone()),
                };
                for sender in senders {
                    // The receiver is gone when nobody waits for the value
                    // anymore, which is fine
                    let _ = sender.send(value.clone());
                }
                (key, value)
            })
            .collect()
    }

    /// Fail every waiter with `error`.
    pub fn fail(self, error: QueryExecutionError) {
        for sender in self.waiters.into_values().flatten() {
            let _ = sender.send(Err(error.clone()));
        }
    }
}

/// Accumulates the keys that fields request during one resolution phase.
/// Keys are grouped by field and deduplicated; each field remembers the
/// loader it was first registered with.
#[derive(Default)]
pub struct BatchKeyCollector {
    pending: BTreeMap<String, PendingBatch>,
}

impl BatchKeyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `key` for `field`. Registering a key that is
    /// already pending only adds another waiter.
    pub fn register(&mut self, field: &str, loader: &Arc<dyn FieldLoader>, key: Key) -> LoadHandle {
        let (sender, receiver) = oneshot::channel();
        let batch = self
            .pending
            .entry(field.to_owned())
            .or_insert_with(|| PendingBatch {
                field: field.to_owned(),
                loader: loader.cheap_clone(),
                waiters: BTreeMap::new(),
            });
        batch.waiters.entry(key).or_default().push(sender);
        LoadHandle {
            inner: HandleInner::Pending(receiver),
        }
    }

    pub fn is_pending(&self, field: &str, key: &str) -> bool {
        self.pending
            .get(field)
            .map_or(false, |batch| batch.waiters.contains_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of distinct keys registered for `field`
    pub fn key_count(&self, field: &str) -> usize {
        self.pending
            .get(field)
            .map_or(0, |batch| batch.waiters.len())
    }

    /// Remove and return everything registered so far, one batch per field.
    pub fn take(&mut self) -> Vec<PendingBatch> {
        std::mem::take(&mut self.pending).into_values().collect()
    }
}
