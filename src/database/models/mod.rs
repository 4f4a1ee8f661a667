//! Database models.

pub mod chat;
pub mod invoker;
pub mod player;
pub mod raid;
pub mod trigger;

pub use chat::{Chat, ChatFlag};
pub use invoker::Invoker;
pub use player::{Player, PlayerStats};
pub use raid::{AssignOutcome, RaidAssignment, RaidsInterval};
pub use trigger::{MediaKind, Trigger, TriggerMedia};
