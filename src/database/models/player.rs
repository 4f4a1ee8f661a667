//! Player (game-domain identity) model.

use serde::{Deserialize, Serialize};

/// Combat stats from the last forwarded Pip-Boy profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub health: u32,
    pub damage: u32,
    pub armor: u32,
    pub strength: u32,
    pub accuracy: u32,
    pub charisma: u32,
    pub agility: u32,
    pub stamina: u32,
}

impl PlayerStats {
    /// Sum used for quick comparisons in reports.
    pub fn total(&self) -> u32 {
        self.health
            + self.damage
            + self.armor
            + self.strength
            + self.accuracy
            + self.charisma
            + self.agility
    }
}

/// A Wasteland Wars player linked to a Telegram account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub telegram_id: i64,
    pub nickname: String,
    #[serde(default)]
    pub stats: PlayerStats,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub is_admin: bool,
    /// Ids of the groups this player leads.
    #[serde(default)]
    pub leader_of: Vec<i64>,
    /// Unix timestamp of the last profile update.
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

impl Player {
    pub fn new(id: i64, telegram_id: i64, nickname: impl Into<String>) -> Self {
        Self {
            id,
            telegram_id,
            nickname: nickname.into(),
            stats: PlayerStats::default(),
            is_active: true,
            is_banned: false,
            is_admin: false,
            leader_of: Vec::new(),
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_leader(&self) -> bool {
        !self.leader_of.is_empty()
    }
}
