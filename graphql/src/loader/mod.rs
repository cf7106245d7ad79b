//! Batch loading of related entities.
//!
//! A field that references other entities registers the key it needs with
//! the `BatchKeyCollector` of its operation instead of fetching right away.
//! Once a resolution phase has registered everything it needs, the
//! `ResolutionScheduler` hands the distinct keys of each field to that
//! field's loader in a single call and fans the results back out to every
//! waiter. Results are kept in the `PerRequestCache` for the rest of the
//! operation.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use graph::prelude::{IntoValue, Value};

mod cache;
mod collector;
mod scheduler;

pub use self::cache::PerRequestCache;
pub use self::collector::{BatchKeyCollector, LoadHandle, PendingBatch};
pub use self::scheduler::{Phase, ResolutionScheduler};

/// The key a related entity is looked up by, usually its id or the id of
/// the entity it belongs to.
pub type Key = String;

/// The shape of the value a loader produces for one key, and what a key
/// the backend knows nothing about resolves to.
pub trait LoadShape: Clone + Send + Sync + 'static {
    fn missing() -> Self;
}

/// One-to-one relations: a missing key resolves to `None`.
impl<T: Clone + Send + Sync + 'static> LoadShape for Option<T> {
    fn missing() -> Self {
        None
    }
}

/// One-to-many relations: a missing key resolves to an empty list.
impl<T: Clone + Send + Sync + 'static> LoadShape for Vec<T> {
    fn missing() -> Self {
        Vec::new()
    }
}

/// The outcome of one batch load. Contains exactly one entry for every
/// requested key.
#[derive(Clone, PartialEq)]
pub struct BatchResult<V> {
    values: HashMap<Key, V>,
}

impl<V: LoadShape> BatchResult<V> {
    /// Builds a result for `keys` from what the backend `found`. Keys the
    /// backend did not return get `V::missing()`, entries for keys that
    /// were never requested are dropped.
    pub fn complete(keys: &BTreeSet<Key>, mut found: HashMap<Key, V>) -> Self {
        let values = keys
            .iter()
            .map(|key| {
                let value = found.remove(key).unwrap_or_else(V::missing);
                (key.clone(), value)
            })
            .collect();
        BatchResult { values }
    }
}

impl<V> BatchResult<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.values.keys()
    }

    pub fn map<U>(self, f: impl Fn(V) -> U) -> BatchResult<U> {
        BatchResult {
            values: self.values.into_iter().map(|(k, v)| (k, f(v))).collect(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for BatchResult<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort_unstable();
        f.debug_map()
            .entries(keys.into_iter().map(|k| (k, &self.values[k])))
            .finish()
    }
}

/// Fetches the related entities for a set of distinct keys in one call to
/// the backend.
#[async_trait]
pub trait BatchLoader: Send + Sync + 'static {
    type Value: LoadShape;

    /// Load the values for `keys`. The returned map may omit keys; it is
    /// completed by `fetch`.
    async fn load(&self, keys: &BTreeSet<Key>) -> Result<HashMap<Key, Self::Value>, anyhow::Error>;

    /// Load the values for `keys` and complete the result so that every key
    /// has an entry.
    async fn fetch(&self, keys: &BTreeSet<Key>) -> Result<BatchResult<Self::Value>, anyhow::Error> {
        let found = self.load(keys).await?;
        Ok(BatchResult::complete(keys, found))
    }
}

/// A `BatchLoader` whose values were turned into GraphQL values, which is
/// what the execution engine stores per field.
#[async_trait]
pub trait FieldLoader: Send + Sync + 'static {
    async fn load_values(&self, keys: &BTreeSet<Key>) -> Result<BatchResult<Value>, anyhow::Error>;
}

#[async_trait]
impl<L> FieldLoader for L
where
    L: BatchLoader,
    L::Value: IntoValue,
{
    async fn load_values(&self, keys: &BTreeSet<Key>) -> Result<BatchResult<Value>, anyhow::Error> {
        let result = self.fetch(keys).await?;
        Ok(result.map(IntoValue::into_value))
    }
}

/// Loads a one-to-one relation: `fetch` returns the entities for a list of
/// keys, and `key_of` says which key an entity belongs to. When the backend
/// returns several entities for the same key, the first one wins.
pub struct OneToOne<E, F, K> {
    fetch: F,
    key_of: K,
    entity: PhantomData<fn() -> E>,
}

impl<E, F, K> OneToOne<E, F, K>
where
    K: Fn(&E) -> Key,
{
    pub fn new(fetch: F, key_of: K) -> Self {
        OneToOne {
            fetch,
            key_of,
            entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, F, Fut, K, Err> BatchLoader for OneToOne<E, F, K>
where
    E: Clone + Send + Sync + 'static,
    F: Fn(Vec<Key>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<E>, Err>> + Send,
    Err: Into<anyhow::Error>,
    K: Fn(&E) -> Key + Send + Sync + 'static,
{
    type Value = Option<E>;

    async fn load(&self, keys: &BTreeSet<Key>) -> Result<HashMap<Key, Option<E>>, anyhow::Error> {
        let entities = (self.fetch)(keys.iter().cloned().collect())
            .await
            .map_err(Into::into)?;

        let mut found = HashMap::with_capacity(entities.len());
        for entity in entities {
            found
                .entry((self.key_of)(&entity))
                .or_insert(Some(entity));
        }
        Ok(found)
    }
}

/// Loads a one-to-many relation: `fetch` returns the children for a list of
/// parent keys, and `group_key` says which parent a child belongs to. The
/// children of each parent keep the order in which the backend returned
/// them.
pub struct OneToMany<E, F, K> {
    fetch: F,
    group_key: K,
    entity: PhantomData<fn() -> E>,
}

impl<E, F, K> OneToMany<E, F, K>
where
    K: Fn(&E) -> Key,
{
    pub fn new(fetch: F, group_key: K) -> Self {
        OneToMany {
            fetch,
            group_key,
            entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, F, Fut, K, Err> BatchLoader for OneToMany<E, F, K>
where
    E: Clone + Send + Sync + 'static,
    F: Fn(Vec<Key>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<E>, Err>> + Send,
    Err: Into<anyhow::Error>,
    K: Fn(&E) -> Key + Send + Sync + 'static,
{
    type Value = Vec<E>;

    async fn load(&self, keys: &BTreeSet<Key>) -> Result<HashMap<Key, Vec<E>>, anyhow::Error> {
        let children = (self.fetch)(keys.iter().cloned().collect())
            .await
            .map_err(Into::into)?;

        let mut found: HashMap<Key, Vec<E>> = HashMap::new();
        for child in children {
            found.entry((self.group_key)(&child)).or_default().push(child);
        }
        Ok(found)
    }
}
