//! Chat records.
//!
//! Writes touch only the fields they own so concurrent updates of the same
//! chat never overwrite each other's switches.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::Collection;
use mongodb::bson::{Document, doc};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::{Chat, ChatFlag, ChatStore, Database};

pub struct ChatRepository {
    collection: Collection<Chat>,
    cache: TypedCache<i64, Chat>,
}

impl ChatRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        Self {
            collection: db.collection("chats"),
            cache: cache.get_or_create("chats", CacheConfig::cold_data()),
        }
    }

    /// Upsert `chat_id` with `update` and refresh the cache from the result.
    async fn upsert(&self, chat_id: i64, update: Document) -> Result<Chat> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let chat = self
            .collection
            .find_one_and_update(doc! { "chat_id": chat_id }, update)
            .with_options(options)
            .await?
            .with_context(|| format!("chat {} was not returned after upsert", chat_id))?;

        self.cache.insert(chat_id, chat.clone());
        Ok(chat)
    }
}

#[async_trait]
impl ChatStore for ChatRepository {
    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>> {
        if let Some(chat) = self.cache.get(&chat_id) {
            return Ok(Some(chat));
        }

        let result = self.collection.find_one(doc! { "chat_id": chat_id }).await?;
        if let Some(chat) = &result {
            self.cache.insert(chat_id, chat.clone());
        }
        Ok(result)
    }

    async fn touch_chat(&self, chat_id: i64, title: Option<&str>, last_seen: i64) -> Result<Chat> {
        let mut set = doc! { "last_seen": last_seen };
        if let Some(title) = title {
            set.insert("title", title);
        }
        let update = doc! {
            "$set": set,
            "$setOnInsert": { "is_active": false, "is_admin_chat": false },
        };
        self.upsert(chat_id, update).await
    }

    async fn set_chat_flag(&self, chat_id: i64, flag: ChatFlag, value: bool) -> Result<Chat> {
        let mut set = Document::new();
        set.insert(flag.field(), value);
        let mut on_insert = doc! { "last_seen": Utc::now().timestamp() };
        on_insert.insert(flag.other().field(), false);

        self.upsert(chat_id, doc! { "$set": set, "$setOnInsert": on_insert }).await
    }
}
