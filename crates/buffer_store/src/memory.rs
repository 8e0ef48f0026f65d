//! MemoryStore - shared in-memory keyed multi-map
//!
//! Clones share the same underlying map, so an ingestion path and the dispatcher can
//! hold handles to one buffer.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{BufferStore, BufferedItem, ContractError, GroupKey};
use tracing::debug;

type Buckets = BTreeMap<GroupKey, Vec<BufferedItem>>;

/// In-memory buffer store
///
/// Keys are enumerated in `GroupKey` order; items keep insertion order per key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<Mutex<Buckets>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one item under `key`
    pub fn add(&self, key: GroupKey, item: BufferedItem) -> Result<(), ContractError> {
        self.lock()?.entry(key).or_default().push(item);
        Ok(())
    }

    /// Append several items under `key`, preserving their order
    pub fn add_many(
        &self,
        key: GroupKey,
        items: impl IntoIterator<Item = BufferedItem>,
    ) -> Result<(), ContractError> {
        self.lock()?.entry(key).or_default().extend(items);
        Ok(())
    }

    /// Total number of buffered items across all keys
    pub fn total_items(&self) -> usize {
        self.lock()
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Snapshot of the items under `key` (empty if none)
    pub fn items(&self, key: &GroupKey) -> Vec<BufferedItem> {
        self.lock()
            .ok()
            .and_then(|buckets| buckets.get(key).cloned())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Buckets>, ContractError> {
        self.buckets
            .lock()
            .map_err(|_| ContractError::Other("memory store lock poisoned".to_string()))
    }
}

impl BufferStore for MemoryStore {
    async fn list_keys(&self) -> Result<Vec<GroupKey>, ContractError> {
        let buckets = self.buckets.lock().map_err(|_| ContractError::StoreListKeys {
            message: "memory store lock poisoned".to_string(),
        })?;
        Ok(buckets
            .iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(key, _)| *key)
            .collect())
    }

    async fn count(&self, key: &GroupKey) -> Result<usize, ContractError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|_| ContractError::store_read(key, "memory store lock poisoned"))?;
        Ok(buckets.get(key).map_or(0, Vec::len))
    }

    async fn fetch(&self, key: &GroupKey) -> Result<Vec<BufferedItem>, ContractError> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|_| ContractError::store_read(key, "memory store lock poisoned"))?;
        Ok(buckets.get(key).cloned().unwrap_or_default())
    }

    async fn delete(&self, key: &GroupKey, items: &[BufferedItem]) -> Result<(), ContractError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| ContractError::store_delete(key, "memory store lock poisoned"))?;

        let Some(bucket) = buckets.get_mut(key) else {
            return Err(ContractError::store_delete(key, "key not found"));
        };

        // One stored entry per listed item; ids alone are not unique.
        let mut removed = 0;
        for doomed in items {
            if let Some(pos) = bucket.iter().position(|item| item == doomed) {
                bucket.remove(pos);
                removed += 1;
            }
        }

        if bucket.is_empty() {
            buckets.remove(key);
        }

        debug!(key = %key, removed, "Deleted buffered items");
        Ok(())
    }
}
