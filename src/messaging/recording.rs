//! In-memory messenger that records deliveries.

use std::sync::atomic::{AtomicI32, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Messenger, OutboundMessage};
use crate::database::TriggerMedia;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message(OutboundMessage),
    Pin { chat_id: i64, message_id: i32 },
    Callback { id: String, text: Option<String> },
}

#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    fail: bool,
}

impl RecordingMessenger {
    /// A messenger whose sends always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }

    pub fn pins(&self) -> Vec<(i64, i32)> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Pin { chat_id, message_id } => Some((chat_id, message_id)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, message: &OutboundMessage) -> Result<i32> {
        if self.fail {
            bail!("recording messenger set to fail");
        }
        self.sent.lock().push(Sent::Message(message.clone()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<i32> {
        self.record(message)
    }

    async fn send_media(&self, message: &OutboundMessage, _media: &TriggerMedia) -> Result<i32> {
        self.record(message)
    }

    async fn pin(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.sent.lock().push(Sent::Pin { chat_id, message_id });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.sent.lock().push(Sent::Callback {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}
