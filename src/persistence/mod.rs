//! Anti-rollback checkpoint persistence.
//!
//! Stores a future-seed token and reseed counter with a tamper-detection
//! checksum. The active DRBG secret is never written out.

mod checkpoint;
mod store;

pub use checkpoint::{checksum, Checkpoint, CheckpointRecord};
pub use store::{FileStateStore, MemoryStateStore, StateStore, StoreError};
