//! JSON file adapters.
//!
//! `JsonUserStore` implements `UserRepository` and `FactRepository` over the
//! single user database file. `JsonHistoryStore` implements
//! `HistoryRepository` with one file per user.

pub mod history_store;
pub mod user_store;

pub use history_store::JsonHistoryStore;
pub use user_store::JsonUserStore;
