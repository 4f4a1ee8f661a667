//! Outbound messaging.
//!
//! Handlers describe what to send as an [`OutboundMessage`] and hand it to the
//! [`MessageManager`], which delivers it through a [`Messenger`] right away or
//! through its queue. Delivery failures are logged, never retried.

mod manager;
#[cfg(test)]
mod recording;
mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::database::TriggerMedia;

pub use manager::MessageManager;
#[cfg(test)]
pub use recording::{RecordingMessenger, Sent};
pub use telegram::TelegramMessenger;

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Url(String),
    Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }
}

/// A message to deliver. Text is HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub reply_to: Option<i32>,
    pub keyboard: Vec<Vec<InlineButton>>,
    pub media: Option<TriggerMedia>,
    /// Pin the message once sent.
    pub pin: bool,
    /// Deliver through the queue instead of immediately.
    pub queued: bool,
}

impl OutboundMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to: None,
            keyboard: Vec::new(),
            media: None,
            pin: false,
            queued: false,
        }
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: Option<i32>) -> Self {
        self.reply_to = message_id;
        self
    }

    #[must_use]
    pub fn keyboard(mut self, rows: Vec<Vec<InlineButton>>) -> Self {
        self.keyboard = rows;
        self
    }

    #[must_use]
    pub fn media(mut self, media: Option<TriggerMedia>) -> Self {
        self.media = media;
        self
    }

    #[must_use]
    pub fn pinned(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    #[must_use]
    pub fn queued(mut self) -> Self {
        self.queued = true;
        self
    }
}

/// Transport used to talk to users.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message, returning its message id.
    async fn send(&self, message: &OutboundMessage) -> Result<i32>;

    /// Send `media` with the message text as caption.
    async fn send_media(&self, message: &OutboundMessage, media: &TriggerMedia) -> Result<i32>;

    async fn pin(&self, chat_id: i64, message_id: i32) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
