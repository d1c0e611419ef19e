//! Conversational turns.
//!
//! `TurnProcessor` ties a user's memory store, chat history and the reply
//! generator together and runs one turn at a time.

pub mod turn;
