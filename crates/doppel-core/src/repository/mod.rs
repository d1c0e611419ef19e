//! Repository trait definitions.
//!
//! Each trait is implemented by an adapter in `doppel-infra`. All methods
//! use native async fn in traits (RPITIT, Rust 2024 edition).

pub mod fact;
pub mod history;
pub mod user;
