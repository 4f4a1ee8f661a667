//! In-memory store.
//!
//! Implements every store trait on `DashMap`s. Used with `STORAGE=memory`
//! for local runs and as the fake behind tests.

use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use super::models::{
    AssignOutcome, Chat, ChatFlag, Invoker, Player, PlayerStats, RaidAssignment, RaidsInterval, Trigger,
};
use super::store::{ChatStore, PlayerStore, RaidStore, TriggerStore, UserStore};
use crate::dispatch::Sender;
use crate::raid::{RaidSlot, RaidStatus};

type RaidKey = (i64, i64); // (slot key, player_id)

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<i64, Invoker>,
    chats: DashMap<i64, Chat>,
    players: DashMap<i64, Player>,
    next_player_id: AtomicI64,
    raids: DashMap<RaidKey, RaidAssignment>,
    intervals: RwLock<Vec<RaidsInterval>>,
    triggers: DashMap<i64, Trigger>,
    next_trigger_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reporting interval (intervals are maintained outside the bot).
    #[cfg(test)]
    pub fn add_interval(&self, interval: RaidsInterval) {
        self.intervals.write().push(interval);
    }

    /// Insert or replace a player as-is, bumping the id sequence past it.
    #[cfg(test)]
    pub fn put_player(&self, player: Player) {
        self.next_player_id.fetch_max(player.id, Ordering::SeqCst);
        self.players.insert(player.id, player);
    }

    #[cfg(test)]
    pub fn put_chat(&self, chat: Chat) {
        self.chats.insert(chat.chat_id, chat);
    }

    /// Number of last-seen records.
    #[cfg(test)]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn touch(&self, sender: &Sender, seen_at: DateTime<Utc>) -> Result<Invoker> {
        let invoker = Invoker::from_sender(sender, seen_at);
        self.users.insert(sender.id, invoker.clone());
        Ok(invoker)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>> {
        Ok(self.chats.get(&chat_id).map(|c| c.clone()))
    }

    async fn touch_chat(&self, chat_id: i64, title: Option<&str>, last_seen: i64) -> Result<Chat> {
        let mut chat = self
            .chats
            .entry(chat_id)
            .or_insert_with(|| Chat::new(chat_id, None));
        if let Some(title) = title {
            chat.title = Some(title.to_string());
        }
        chat.last_seen = last_seen;
        Ok(chat.clone())
    }

    async fn set_chat_flag(&self, chat_id: i64, flag: ChatFlag, value: bool) -> Result<Chat> {
        let mut chat = self
            .chats
            .entry(chat_id)
            .or_insert_with(|| Chat::new(chat_id, None));
        chat.set_flag(flag, value);
        Ok(chat.clone())
    }
}

#[async_trait]
impl PlayerStore for MemoryStore {
    async fn player(&self, id: i64) -> Result<Option<Player>> {
        Ok(self.players.get(&id).map(|p| p.clone()))
    }

    async fn player_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Player>> {
        Ok(self
            .players
            .iter()
            .find(|p| p.telegram_id == telegram_id)
            .map(|p| p.clone()))
    }

    async fn create_player(&self, telegram_id: i64, nickname: &str) -> Result<Player> {
        let id = self.next_player_id.fetch_add(1, Ordering::SeqCst) + 1;
        let player = Player::new(id, telegram_id, nickname);
        self.players.insert(id, player.clone());
        Ok(player)
    }

    async fn update_profile(
        &self,
        id: i64,
        nickname: &str,
        stats: &PlayerStats,
        updated_at: i64,
    ) -> Result<Option<Player>> {
        Ok(self.players.get_mut(&id).map(|mut player| {
            player.nickname = nickname.to_string();
            player.stats = stats.clone();
            player.is_active = true;
            player.updated_at = updated_at;
            player.clone()
        }))
    }

    async fn set_banned(&self, id: i64, banned: bool) -> Result<Option<Player>> {
        Ok(self.players.get_mut(&id).map(|mut player| {
            player.is_banned = banned;
            player.clone()
        }))
    }
}

#[async_trait]
impl RaidStore for MemoryStore {
    async fn upsert_assignment(
        &self,
        slot: RaidSlot,
        player_id: i64,
        distance: Option<i32>,
        default_status: RaidStatus,
        now: i64,
    ) -> Result<AssignOutcome> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        let outcome = match self.raids.entry((slot.key(), player_id)) {
            Entry::Occupied(mut entry) => {
                let assignment = entry.get_mut();
                if assignment.assigned_distance == distance {
                    AssignOutcome::Unchanged
                } else {
                    assignment.assigned_distance = distance;
                    assignment.status = default_status;
                    assignment.is_reported = false;
                    assignment.last_update = now;
                    AssignOutcome::Reassigned
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(RaidAssignment::new(slot, player_id, distance, default_status, now));
                AssignOutcome::Created
            }
        };
        Ok(outcome)
    }

    async fn assignment(&self, slot: RaidSlot, player_id: i64) -> Result<Option<RaidAssignment>> {
        Ok(self.raids.get(&(slot.key(), player_id)).map(|a| a.clone()))
    }

    async fn compare_and_set_status(
        &self,
        slot: RaidSlot,
        player_id: i64,
        expected: RaidStatus,
        new: RaidStatus,
        now: i64,
    ) -> Result<bool> {
        let Some(mut assignment) = self.raids.get_mut(&(slot.key(), player_id)) else {
            return Ok(false);
        };
        if assignment.status != expected {
            return Ok(false);
        }
        assignment.status = new;
        assignment.last_update = now;
        Ok(true)
    }

    async fn assignments_for_slot(&self, slot: RaidSlot) -> Result<Vec<RaidAssignment>> {
        let key = slot.key();
        let mut found: Vec<RaidAssignment> = self
            .raids
            .iter()
            .filter(|a| a.slot == key)
            .map(|a| a.clone())
            .collect();
        found.sort_by_key(|a| a.player_id);
        Ok(found)
    }

    async fn assignments_for_player(
        &self,
        player_id: i64,
        from: RaidSlot,
        to: RaidSlot,
    ) -> Result<Vec<RaidAssignment>> {
        let (from, to) = (from.key(), to.key());
        let mut found: Vec<RaidAssignment> = self
            .raids
            .iter()
            .filter(|a| a.player_id == player_id && a.slot >= from && a.slot <= to)
            .map(|a| a.clone())
            .collect();
        found.sort_by_key(|a| a.slot);
        Ok(found)
    }

    async fn mark_reported(&self, slot: RaidSlot, player_id: i64) -> Result<()> {
        if let Some(mut assignment) = self.raids.get_mut(&(slot.key(), player_id)) {
            assignment.is_reported = true;
        }
        Ok(())
    }

    async fn intervals(&self) -> Result<Vec<RaidsInterval>> {
        Ok(self.intervals.read().clone())
    }
}

#[async_trait]
impl TriggerStore for MemoryStore {
    async fn all_triggers(&self) -> Result<Vec<Trigger>> {
        let mut all: Vec<Trigger> = self.triggers.iter().map(|t| t.clone()).collect();
        all.sort_by_key(|t| t.id);
        Ok(all)
    }

    async fn triggers_for_chat(&self, chat_id: i64) -> Result<Vec<Trigger>> {
        let mut found: Vec<Trigger> = self
            .triggers
            .iter()
            .filter(|t| t.chat_id == chat_id)
            .map(|t| t.clone())
            .collect();
        found.sort_by_key(|t| t.id);
        Ok(found)
    }

    async fn insert_trigger(&self, mut trigger: Trigger) -> Result<Trigger> {
        trigger.id = self.next_trigger_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.triggers.insert(trigger.id, trigger.clone());
        Ok(trigger)
    }

    async fn delete_trigger(&self, chat_id: i64, id: i64) -> Result<bool> {
        Ok(self
            .triggers
            .remove_if(&id, |_, t| t.chat_id == chat_id)
            .is_some())
    }
}
