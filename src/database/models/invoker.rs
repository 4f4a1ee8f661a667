//! Last-seen record for anyone who talks to the bot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::Sender;

/// Lightweight identity of a message sender.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoker {
    /// Telegram user ID.
    pub user_id: i64,
    /// Username without @, lowercase for matching.
    pub username: Option<String>,
    /// Username as written, for display.
    pub username_display: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Unix timestamp of the last event from this user.
    pub last_seen: i64,
}

impl Invoker {
    pub fn from_sender(sender: &Sender, seen_at: DateTime<Utc>) -> Self {
        Self {
            user_id: sender.id,
            username: sender.username.as_ref().map(|u| u.to_lowercase()),
            username_display: sender.username.clone(),
            first_name: sender.first_name.clone(),
            last_name: sender.last_name.clone(),
            last_seen: seen_at.timestamp(),
        }
    }

    /// Whether profile fields differ from what Telegram reports now.
    pub fn has_changed(&self, sender: &Sender) -> bool {
        self.username_display != sender.username
            || self.first_name != sender.first_name
            || self.last_name != sender.last_name
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}
