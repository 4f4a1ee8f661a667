//! Raid assignment and reporting interval models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::raid::{RaidSlot, RaidStatus};

/// One player's assignment for one raid slot. Keyed by `(slot, player_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidAssignment {
    /// [`RaidSlot::key`] of the raid.
    pub slot: i64,
    pub player_id: i64,
    /// Distance (km) the player is sent to.
    pub assigned_distance: Option<i32>,
    pub status: RaidStatus,
    /// The player has been reminded about this raid.
    #[serde(default)]
    pub is_reported: bool,
    /// Unix timestamp of the last change.
    pub last_update: i64,
}

impl RaidAssignment {
    pub fn new(slot: RaidSlot, player_id: i64, distance: Option<i32>, status: RaidStatus, now: i64) -> Self {
        Self {
            slot: slot.key(),
            player_id,
            assigned_distance: distance,
            status,
            is_reported: false,
            last_update: now,
        }
    }
}

/// Result of an idempotent assignment upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// No assignment existed for the key.
    Created,
    /// The distance changed; status was reset.
    Reassigned,
    /// Same distance as stored; nothing changed.
    Unchanged,
}

/// A persisted reporting window `[start_date, last_date]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidsInterval {
    pub id: i64,
    pub start_date: NaiveDateTime,
    pub last_date: NaiveDateTime,
}

impl RaidsInterval {
    pub fn contains(&self, date: NaiveDateTime) -> bool {
        self.start_date <= date && date <= self.last_date
    }
}
