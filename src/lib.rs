//! Wasteland Warden - group management and raid scheduling bot.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Store traits, MongoDB repositories and an in-memory store
//! - `cache` - Moka-backed caches for the repositories
//! - `dispatch` - Classification, envelope resolution, filters and routing
//! - `messaging` - Outbound messages, immediate or queued
//! - `permissions` - Owner/admin/leader checks over a resolved envelope
//! - `raid` - Raid slots, statuses and assignments
//! - `triggers` - Per-chat trigger index
//! - `scheduler` - Recurring jobs
//! - `bot` - teloxide glue (with Throttle for API rate limiting)
//! - `plugins` - Bot features as modules
//! - `utils` - Text parsers

pub mod bot;
pub mod cache;
pub mod config;
pub mod database;
pub mod dispatch;
pub mod messaging;
pub mod permissions;
pub mod plugins;
pub mod raid;
pub mod scheduler;
pub mod triggers;
pub mod utils;
