//! Per-user memory.
//!
//! `MemoryStore` owns one user's ordered fact list: serial allocation,
//! case-insensitive deduplication, expiry sweeps and deletion, persisted
//! through a [`FactRepository`](crate::repository::fact::FactRepository).
//! `migrate` normalizes legacy on-disk entries on every load.

pub mod migrate;
pub mod store;
