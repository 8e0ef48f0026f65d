//! BufferStore trait - keyed buffer consumed by the dispatcher
//!
//! The store's own durability and concurrency discipline are its own business; the
//! dispatcher only relies on each operation being atomic for a single key.

use chrono::{DateTime, Utc};

use crate::{day_index_utc, BufferedItem, ContractError, GroupKey};

/// Keyed multi-map of buffered observations
#[trait_variant::make(BufferStore: Send)]
pub trait LocalBufferStore {
    /// All keys that currently hold items
    async fn list_keys(&self) -> Result<Vec<GroupKey>, ContractError>;

    /// Number of items buffered under `key`
    async fn count(&self, key: &GroupKey) -> Result<usize, ContractError>;

    /// All items buffered under `key`, in store order
    async fn fetch(&self, key: &GroupKey) -> Result<Vec<BufferedItem>, ContractError>;

    /// Delete exactly `items` from `key`; items not listed are untouched
    async fn delete(&self, key: &GroupKey, items: &[BufferedItem]) -> Result<(), ContractError>;

    /// Day index used for aging buffered items
    fn current_day_index(&self, now: DateTime<Utc>) -> u32 {
        day_index_utc(now)
    }
}
