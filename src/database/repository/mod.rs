//! MongoDB implementations of the store traits.

mod chat_repository;
mod counters;
mod player_repository;
mod raid_repository;
mod trigger_repository;
mod user_repository;

pub use chat_repository::ChatRepository;
pub use player_repository::PlayerRepository;
pub use raid_repository::RaidRepository;
pub use trigger_repository::TriggerRepository;
pub use user_repository::UserRepository;
