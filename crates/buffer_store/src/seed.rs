//! Seed file loading
//!
//! A seed file is a JSON array of `{ "key": {...}, "item": {...} }` records.

use std::path::Path;

use contracts::{BufferedItem, ContractError, GroupKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::MemoryStore;

/// One buffered item together with its group key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRecord {
    pub key: GroupKey,
    pub item: BufferedItem,
}

impl MemoryStore {
    /// Load seed records from a JSON string, returning how many items were added
    pub fn load_seed_str(&self, content: &str) -> Result<usize, ContractError> {
        let records: Vec<SeedRecord> =
            serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
                message: format!("seed parse error: {e}"),
                source: Some(Box::new(e)),
            })?;

        let count = records.len();
        for record in records {
            self.add(record.key, record.item)?;
        }
        Ok(count)
    }

    /// Load seed records from a JSON file
    pub fn load_seed(&self, path: &Path) -> Result<usize, ContractError> {
        let content = std::fs::read_to_string(path)?;
        let count = self.load_seed_str(&content)?;
        info!(path = %path.display(), items = count, "Seeded buffer store");
        Ok(count)
    }
}
