//! Chat triggers.
//!
//! Triggers are stored per chat and compiled into an in-memory
//! [`TriggerIndex`]. The index is rebuilt wholesale on refresh.

mod index;

pub use index::{CompiledTrigger, TriggerIndex};
