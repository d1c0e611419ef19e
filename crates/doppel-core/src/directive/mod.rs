//! The memory directive protocol.
//!
//! The reply generator is an untrusted producer of free-form text. It asks
//! for memory changes by emitting command lines (`/save_to_memory`,
//! `/delete_from_memory`, bare serial numbers, `/used_memory`) inside its
//! prose. `parser` tokenizes that text line by line into directives and the
//! text shown to the user; `trigger` applies the save grammar to the user's
//! own input; `executor` applies directives to a memory store.

pub mod executor;
pub mod parser;
pub mod time;
pub mod trigger;
