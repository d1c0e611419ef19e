//! Shared domain types for Doppel.
//!
//! This crate contains the core domain types used across the Doppel workspace:
//! fact records and their serials, memory directives and their outcomes, user
//! profiles, chat history entries, configuration, and the error enums.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod directive;
pub mod error;
pub mod memory;
pub mod user;
