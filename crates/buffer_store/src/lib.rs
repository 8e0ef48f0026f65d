//! # Buffer Store
//!
//! In-memory keyed buffer of encrypted observations.
//!
//! Responsibilities:
//! - Hold items per `GroupKey` in arrival order
//! - Implement `BufferStore` for the dispatcher
//! - Seed buffered data from a JSON file (for local runs)

mod memory;
mod seed;

pub use memory::MemoryStore;
pub use seed::SeedRecord;
