//! # Contracts
//!
//! Frozen interface contracts shared by the shuffler crates: observation data types,
//! dispatch configuration, and the `BufferStore` / `AnalyzerTransport` traits.
//! All business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Ages are measured in UTC day indices (days since the Unix epoch), never in
//!   wall-clock timestamps
//! - Dispatch timing uses `chrono::DateTime<Utc>`

mod blueprint;
mod error;
mod observation;
mod store;
mod transport;

pub use blueprint::*;
pub use error::*;
pub use observation::*;
pub use store::*;
pub use transport::*;
