//! Player records, cached by Telegram id.

use anyhow::Result;
use async_trait::async_trait;
use mongodb::Collection;
use mongodb::bson::{Document, doc, to_bson};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use tracing::info;

use super::counters::Counters;
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::{Database, Player, PlayerStats, PlayerStore};

pub struct PlayerRepository {
    collection: Collection<Player>,
    counters: Counters,
    by_telegram_id: TypedCache<i64, Player>,
}

impl PlayerRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        Self {
            collection: db.collection("players"),
            counters: Counters::new(db),
            by_telegram_id: cache.get_or_create("players_by_tg", CacheConfig::hot_data()),
        }
    }

    /// Apply `update` to player `id` and refresh the cache from the result.
    async fn update(&self, id: i64, update: Document) -> Result<Option<Player>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let player = self
            .collection
            .find_one_and_update(doc! { "id": id }, update)
            .with_options(options)
            .await?;
        if let Some(player) = &player {
            self.by_telegram_id.insert(player.telegram_id, player.clone());
        }
        Ok(player)
    }
}

#[async_trait]
impl PlayerStore for PlayerRepository {
    async fn player(&self, id: i64) -> Result<Option<Player>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn player_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Player>> {
        if let Some(player) = self.by_telegram_id.get(&telegram_id) {
            return Ok(Some(player));
        }

        let result = self
            .collection
            .find_one(doc! { "telegram_id": telegram_id })
            .await?;
        if let Some(player) = &result {
            self.by_telegram_id.insert(telegram_id, player.clone());
        }
        Ok(result)
    }

    async fn create_player(&self, telegram_id: i64, nickname: &str) -> Result<Player> {
        let id = self.counters.next("players").await?;
        let player = Player::new(id, telegram_id, nickname);
        self.collection.insert_one(&player).await?;
        self.by_telegram_id.insert(telegram_id, player.clone());
        info!("Registered player {} ({}) for {}", id, nickname, telegram_id);
        Ok(player)
    }

    async fn update_profile(
        &self,
        id: i64,
        nickname: &str,
        stats: &PlayerStats,
        updated_at: i64,
    ) -> Result<Option<Player>> {
        let update = doc! {
            "$set": {
                "nickname": nickname,
                "stats": to_bson(stats)?,
                "is_active": true,
                "updated_at": updated_at,
            }
        };
        self.update(id, update).await
    }

    async fn set_banned(&self, id: i64, banned: bool) -> Result<Option<Player>> {
        self.update(id, doc! { "$set": { "is_banned": banned } }).await
    }
}
