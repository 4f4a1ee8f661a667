//! Database module exports.

mod memory;
mod models;
mod mongo;
mod repository;
mod store;

pub use memory::MemoryStore;
pub use models::*;
pub use mongo::Database;
pub use store::{ChatStore, PlayerStore, RaidStore, Stores, TriggerStore, UserStore};
