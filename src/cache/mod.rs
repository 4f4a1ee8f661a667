//! Cache module - named Moka caches shared by the repositories.
//!
//! - `CacheRegistry` - central registry holding all named caches
//! - `CacheConfig` - capacity and expiry of one cache, with presets
//! - `TypedCache` - typed handle over a Moka cache
//!
//! ```rust,ignore
//! let players = registry.get_or_create::<i64, Player>("players_by_tg", CacheConfig::hot_data());
//! players.insert(player.telegram_id, player.clone());
//! ```

mod config;
mod registry;
mod typed;

pub use config::CacheConfig;
pub use registry::CacheRegistry;
pub use typed::TypedCache;
