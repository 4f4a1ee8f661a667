//! Trigger documents. Reads are served by the in-memory trigger index, so
//! this repository does not cache.

use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::doc;

use super::counters::Counters;
use crate::database::{Database, Trigger, TriggerStore};

pub struct TriggerRepository {
    collection: Collection<Trigger>,
    counters: Counters,
}

impl TriggerRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("triggers"),
            counters: Counters::new(db),
        }
    }
}

#[async_trait]
impl TriggerStore for TriggerRepository {
    async fn all_triggers(&self) -> Result<Vec<Trigger>> {
        let cursor = self.collection.find(doc! {}).sort(doc! { "id": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn triggers_for_chat(&self, chat_id: i64) -> Result<Vec<Trigger>> {
        let cursor = self
            .collection
            .find(doc! { "chat_id": chat_id })
            .sort(doc! { "id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_trigger(&self, mut trigger: Trigger) -> Result<Trigger> {
        trigger.id = self.counters.next("triggers").await?;
        self.collection.insert_one(&trigger).await?;
        Ok(trigger)
    }

    async fn delete_trigger(&self, chat_id: i64, id: i64) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "id": id, "chat_id": chat_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
