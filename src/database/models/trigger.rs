//! Trigger model for automatic replies.

use serde::{Deserialize, Serialize};

/// Kind of media attached to a trigger answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Animation,
    Document,
    Audio,
    Voice,
    Sticker,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Animation => "animation",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Voice => "voice",
            Self::Sticker => "sticker",
        }
    }
}

/// Telegram file reference for a trigger answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMedia {
    pub kind: MediaKind,
    pub file_id: String,
}

/// A chat trigger: when a message matches `pattern`, send `answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: i64,
    pub chat_id: i64,
    /// Literal text to look for.
    pub pattern: String,
    /// Reply text, may contain placeholders.
    pub answer: String,
    /// Match the whole message instead of any occurrence.
    #[serde(default)]
    pub whole_message: bool,
    #[serde(default = "default_true")]
    pub ignore_case: bool,
    /// Only admins set the trigger off.
    #[serde(default)]
    pub admin_only: bool,
    /// Pin the answer after sending.
    #[serde(default)]
    pub pin_after_send: bool,
    /// Send the answer as a reply to the matching message.
    #[serde(default)]
    pub reply_inline: bool,
    #[serde(default)]
    pub media: Option<TriggerMedia>,
    /// Telegram id of whoever created the trigger.
    #[serde(default)]
    pub created_by: i64,
}

fn default_true() -> bool {
    true
}

impl Trigger {
    pub fn new(chat_id: i64, pattern: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: 0,
            chat_id,
            pattern: pattern.into(),
            answer: answer.into(),
            whole_message: false,
            ignore_case: true,
            admin_only: false,
            pin_after_send: false,
            reply_inline: false,
            media: None,
            created_by: 0,
        }
    }
}
