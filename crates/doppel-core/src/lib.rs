//! Business logic and repository trait definitions for Doppel.
//!
//! This crate defines the "ports" (repository traits, clock, generator) that
//! the infrastructure layer implements, plus the memory store and the
//! directive protocol built on top of them. It depends only on
//! `doppel-types` -- never on `doppel-infra` or any IO crate.

pub mod chat;
pub mod clock;
pub mod context;
pub mod directive;
pub mod generator;
pub mod memory;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
