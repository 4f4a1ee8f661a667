//! Chat record.

use serde::{Deserialize, Serialize};

/// A group chat the bot has seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    /// Bot features are enabled here.
    #[serde(default)]
    pub is_active: bool,
    /// Chat where admin-only commands are allowed.
    #[serde(default)]
    pub is_admin_chat: bool,
    /// Unix timestamp of the last message seen in the chat.
    #[serde(default)]
    pub last_seen: i64,
}

impl Chat {
    /// A newly seen chat: inactive until an admin enables it.
    pub fn new(chat_id: i64, title: Option<String>) -> Self {
        Self {
            chat_id,
            title,
            is_active: false,
            is_admin_chat: false,
            last_seen: chrono::Utc::now().timestamp(),
        }
    }

    pub fn set_flag(&mut self, flag: ChatFlag, value: bool) {
        match flag {
            ChatFlag::Active => self.is_active = value,
            ChatFlag::AdminChat => self.is_admin_chat = value,
        }
    }
}

/// Per-chat switch toggled by admin commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatFlag {
    Active,
    AdminChat,
}

impl ChatFlag {
    /// Stored field name.
    pub fn field(self) -> &'static str {
        match self {
            Self::Active => "is_active",
            Self::AdminChat => "is_admin_chat",
        }
    }

    /// The other switch, defaulted when a chat is created by this one.
    pub fn other(self) -> Self {
        match self {
            Self::Active => Self::AdminChat,
            Self::AdminChat => Self::Active,
        }
    }
}
