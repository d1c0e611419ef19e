//! Infrastructure layer for Doppel.
//!
//! Contains implementations of the ports defined in `doppel-core`: the JSON
//! user database (users and their memory), per-user chat history files, the
//! external generator process, plus data directory and config resolution.

pub mod config;
pub mod filesystem;
pub mod generator;
pub mod json;
