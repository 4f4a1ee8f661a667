//! Persistence contracts.
//!
//! Everything above the database layer talks to these traits. MongoDB
//! repositories implement them for production, [`MemoryStore`] for local runs
//! and tests.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{
    AssignOutcome, Chat, ChatFlag, Invoker, Player, PlayerStats, RaidAssignment, RaidsInterval, Trigger,
};
use super::repository::{ChatRepository, PlayerRepository, RaidRepository, TriggerRepository, UserRepository};
use super::{Database, MemoryStore};
use crate::cache::CacheRegistry;
use crate::dispatch::Sender;
use crate::raid::{RaidSlot, RaidStatus};

/// Last-seen records of message senders.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Upsert the sender's last-seen record and return it.
    async fn touch(&self, sender: &Sender, seen_at: DateTime<Utc>) -> Result<Invoker>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>>;

    /// Upsert the chat's last-seen time and, when given, its title.
    ///
    /// Leaves the switches alone; a new chat starts with every switch off.
    async fn touch_chat(&self, chat_id: i64, title: Option<&str>, last_seen: i64) -> Result<Chat>;

    /// Set one switch, creating the chat if needed.
    async fn set_chat_flag(&self, chat_id: i64, flag: ChatFlag, value: bool) -> Result<Chat>;
}

#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn player(&self, id: i64) -> Result<Option<Player>>;

    async fn player_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Player>>;

    /// Create a player with a fresh id.
    async fn create_player(&self, telegram_id: i64, nickname: &str) -> Result<Player>;

    /// Write the profile fields of a forwarded Pip-Boy and reactivate the player.
    ///
    /// `None` if the player does not exist.
    async fn update_profile(
        &self,
        id: i64,
        nickname: &str,
        stats: &PlayerStats,
        updated_at: i64,
    ) -> Result<Option<Player>>;

    async fn set_banned(&self, id: i64, banned: bool) -> Result<Option<Player>>;
}

#[async_trait]
pub trait RaidStore: Send + Sync {
    /// Atomic idempotent upsert keyed by `(slot, player_id)`.
    ///
    /// An equal stored distance leaves the record untouched; otherwise the
    /// distance is recorded and the status reset to `default_status`.
    async fn upsert_assignment(
        &self,
        slot: RaidSlot,
        player_id: i64,
        distance: Option<i32>,
        default_status: RaidStatus,
        now: i64,
    ) -> Result<AssignOutcome>;

    async fn assignment(&self, slot: RaidSlot, player_id: i64) -> Result<Option<RaidAssignment>>;

    /// Set `new` only if the stored status is still `expected`.
    async fn compare_and_set_status(
        &self,
        slot: RaidSlot,
        player_id: i64,
        expected: RaidStatus,
        new: RaidStatus,
        now: i64,
    ) -> Result<bool>;

    async fn assignments_for_slot(&self, slot: RaidSlot) -> Result<Vec<RaidAssignment>>;

    /// Assignments of one player with `from <= slot <= to`.
    async fn assignments_for_player(
        &self,
        player_id: i64,
        from: RaidSlot,
        to: RaidSlot,
    ) -> Result<Vec<RaidAssignment>>;

    async fn mark_reported(&self, slot: RaidSlot, player_id: i64) -> Result<()>;

    async fn intervals(&self) -> Result<Vec<RaidsInterval>>;
}

#[async_trait]
pub trait TriggerStore: Send + Sync {
    async fn all_triggers(&self) -> Result<Vec<Trigger>>;

    async fn triggers_for_chat(&self, chat_id: i64) -> Result<Vec<Trigger>>;

    /// Store a trigger under a fresh id and return it.
    async fn insert_trigger(&self, trigger: Trigger) -> Result<Trigger>;

    async fn delete_trigger(&self, chat_id: i64, id: i64) -> Result<bool>;
}

/// All stores the bot needs, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub chats: Arc<dyn ChatStore>,
    pub players: Arc<dyn PlayerStore>,
    pub raids: Arc<dyn RaidStore>,
    pub triggers: Arc<dyn TriggerStore>,
}

impl Stores {
    /// Everything backed by one in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            chats: store.clone(),
            players: store.clone(),
            raids: store.clone(),
            triggers: store,
        }
    }

    /// MongoDB repositories with their caches.
    pub async fn mongo(db: &Database, cache: &CacheRegistry) -> Result<Self> {
        let raids = RaidRepository::new(db);
        raids.ensure_indexes().await?;

        Ok(Self {
            users: Arc::new(UserRepository::new(db, cache)),
            chats: Arc::new(ChatRepository::new(db, cache)),
            players: Arc::new(PlayerRepository::new(db, cache)),
            raids: Arc::new(raids),
            triggers: Arc::new(TriggerRepository::new(db)),
        })
    }
}
