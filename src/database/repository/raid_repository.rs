//! Raid assignments and reporting intervals.
//!
//! Assignment upserts rely on the unique `(slot, player_id)` index: the
//! conditional upsert only matches a record with a different distance, so an
//! equal distance turns into a duplicate-key insert and is reported as
//! [`AssignOutcome::Unchanged`].

use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, doc};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, info};

use crate::database::{AssignOutcome, Database, RaidAssignment, RaidStore, RaidsInterval};
use crate::raid::{RaidSlot, RaidStatus};

const DUPLICATE_KEY: i32 = 11000;

pub struct RaidRepository {
    assignments: Collection<RaidAssignment>,
    intervals: Collection<RaidsInterval>,
}

impl RaidRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            assignments: db.collection("raid_assignments"),
            intervals: db.collection("raids_intervals"),
        }
    }

    /// Create the unique assignment key index. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "slot": 1, "player_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.assignments.create_index(index).await?;
        info!("Raid assignment index ready");
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn distance_bson(distance: Option<i32>) -> Bson {
    distance.map(Bson::Int32).unwrap_or(Bson::Null)
}

#[async_trait]
impl RaidStore for RaidRepository {
    async fn upsert_assignment(
        &self,
        slot: RaidSlot,
        player_id: i64,
        distance: Option<i32>,
        default_status: RaidStatus,
        now: i64,
    ) -> Result<AssignOutcome> {
        let filter = doc! {
            "slot": slot.key(),
            "player_id": player_id,
            "assigned_distance": { "$ne": distance_bson(distance) },
        };
        let update = doc! {
            "$set": {
                "assigned_distance": distance_bson(distance),
                "status": default_status.code(),
                "is_reported": false,
                "last_update": now,
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();

        match self
            .assignments
            .update_one(filter, update)
            .with_options(options)
            .await
        {
            Ok(result) if result.upserted_id.is_some() => Ok(AssignOutcome::Created),
            Ok(_) => Ok(AssignOutcome::Reassigned),
            Err(e) if is_duplicate_key(&e) => {
                debug!("Assignment {} / {} unchanged", slot, player_id);
                Ok(AssignOutcome::Unchanged)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn assignment(&self, slot: RaidSlot, player_id: i64) -> Result<Option<RaidAssignment>> {
        Ok(self
            .assignments
            .find_one(doc! { "slot": slot.key(), "player_id": player_id })
            .await?)
    }

    async fn compare_and_set_status(
        &self,
        slot: RaidSlot,
        player_id: i64,
        expected: RaidStatus,
        new: RaidStatus,
        now: i64,
    ) -> Result<bool> {
        let result = self
            .assignments
            .update_one(
                doc! { "slot": slot.key(), "player_id": player_id, "status": expected.code() },
                doc! { "$set": { "status": new.code(), "last_update": now } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn assignments_for_slot(&self, slot: RaidSlot) -> Result<Vec<RaidAssignment>> {
        let cursor = self
            .assignments
            .find(doc! { "slot": slot.key() })
            .sort(doc! { "player_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn assignments_for_player(
        &self,
        player_id: i64,
        from: RaidSlot,
        to: RaidSlot,
    ) -> Result<Vec<RaidAssignment>> {
        let cursor = self
            .assignments
            .find(doc! {
                "player_id": player_id,
                "slot": { "$gte": from.key(), "$lte": to.key() },
            })
            .sort(doc! { "slot": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn mark_reported(&self, slot: RaidSlot, player_id: i64) -> Result<()> {
        self.assignments
            .update_one(
                doc! { "slot": slot.key(), "player_id": player_id },
                doc! { "$set": { "is_reported": true } },
            )
            .await?;
        Ok(())
    }

    async fn intervals(&self) -> Result<Vec<RaidsInterval>> {
        let cursor = self.intervals.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }
}
