//! Message manager: immediate and queued delivery.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{Messenger, OutboundMessage};

#[derive(Clone)]
pub struct MessageManager {
    messenger: Arc<dyn Messenger>,
    queue: mpsc::UnboundedSender<OutboundMessage>,
}

impl MessageManager {
    /// Create the manager and spawn its queue worker on the current runtime.
    pub fn spawn(messenger: Arc<dyn Messenger>) -> Self {
        let (queue, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let worker = messenger.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                deliver(worker.as_ref(), &message).await;
            }
            debug!("Message queue closed");
        });

        Self { messenger, queue }
    }

    /// Deliver `message`: queued ones go to the worker, others are sent now.
    ///
    /// Returns the sent message id for immediate deliveries that succeeded.
    pub async fn send(&self, message: OutboundMessage) -> Option<i32> {
        if message.queued {
            if let Err(e) = self.queue.send(message) {
                warn!("Message queue is closed, dropping message for {}", e.0.chat_id);
            }
            return None;
        }
        deliver(self.messenger.as_ref(), &message).await
    }

    pub async fn answer_callback(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.messenger.answer_callback(callback_id, text).await {
            warn!("Failed to answer callback {}: {}", callback_id, e);
        }
    }
}

async fn deliver(messenger: &dyn Messenger, message: &OutboundMessage) -> Option<i32> {
    let sent = match &message.media {
        Some(media) => messenger.send_media(message, media).await,
        None => messenger.send(message).await,
    };

    let message_id = match sent {
        Ok(id) => id,
        Err(e) => {
            warn!("Failed to send message to {}: {}", message.chat_id, e);
            return None;
        }
    };

    if message.pin
        && let Err(e) = messenger.pin(message.chat_id, message_id).await
    {
        warn!("Failed to pin message {} in {}: {}", message_id, message.chat_id, e);
    }

    Some(message_id)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::messaging::RecordingMessenger;

    #[tokio::test]
    async fn immediate_send_returns_id_and_pins() {
        let recorder = Arc::new(RecordingMessenger::default());
        let manager = MessageManager::spawn(recorder.clone());

        let id = manager
            .send(OutboundMessage::text(1, "hello").pinned(true))
            .await;
        assert_eq!(id, Some(1));
        assert_eq!(recorder.texts(), vec!["hello".to_string()]);
        assert_eq!(recorder.pins(), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn queued_messages_are_delivered_in_order() {
        let recorder = Arc::new(RecordingMessenger::default());
        let manager = MessageManager::spawn(recorder.clone());

        for n in 0..3 {
            let id = manager
                .send(OutboundMessage::text(1, format!("m{}", n)).queued())
                .await;
            assert!(id.is_none());
        }

        for _ in 0..50 {
            if recorder.texts().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(recorder.texts(), vec!["m0", "m1", "m2"]);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let recorder = Arc::new(RecordingMessenger::failing());
        let manager = MessageManager::spawn(recorder.clone());
        assert!(manager.send(OutboundMessage::text(1, "lost")).await.is_none());
        assert!(recorder.texts().is_empty());
    }
}
