//! Last-seen records with a cache in front of MongoDB.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::Collection;
use mongodb::bson::doc;
use mongodb::options::ReplaceOptions;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::{Database, Invoker, UserStore};
use crate::dispatch::Sender;

/// Unchanged profiles are written back at most this often.
const LAST_SEEN_RESOLUTION: Duration = Duration::from_secs(300);

pub struct UserRepository {
    collection: Collection<Invoker>,
    cache: TypedCache<i64, Invoker>,
}

impl UserRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        Self {
            collection: db.collection("users"),
            cache: cache.get_or_create("users_by_id", CacheConfig::identity()),
        }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn touch(&self, sender: &Sender, seen_at: DateTime<Utc>) -> Result<Invoker> {
        // Skip the write when nothing changed and the record is fresh enough.
        if let Some(cached) = self.cache.get(&sender.id) {
            let age = seen_at.timestamp() - cached.last_seen;
            if !cached.has_changed(sender) && age < LAST_SEEN_RESOLUTION.as_secs() as i64 {
                return Ok(cached);
            }
        }

        let invoker = Invoker::from_sender(sender, seen_at);
        let options = ReplaceOptions::builder().upsert(true).build();
        self.collection
            .replace_one(doc! { "user_id": sender.id }, &invoker)
            .with_options(options)
            .await?;

        self.cache.insert(sender.id, invoker.clone());
        debug!("Upserted user {} ({:?})", sender.id, invoker.username);
        Ok(invoker)
    }
}
