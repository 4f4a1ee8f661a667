//! Chat activity tracking.
//!
//! Runs before every other module for group messages: records the sender's
//! last-seen entry and keeps the chat's title and last-seen time current.

use tracing::info;

use crate::bot::AppState;
use crate::dispatch::filters;
use crate::dispatch::{HandlerResult, InnerUpdate, Module, Registration, Resolve, Route};

/// Minimum seconds between two last-seen writes for an unchanged chat.
const TOUCH_INTERVAL: i64 = 60;

pub fn module() -> Module<AppState> {
    Module::new("activity", 0).on(Registration::new(Route::Any, "track_chat", track_chat)
        .filter(filters::group())
        .resolve(&[Resolve::Invoker, Resolve::Chat]))
}

async fn track_chat(state: AppState, update: InnerUpdate) -> HandlerResult {
    let event = update.event();
    let Some(chat_id) = event.effective_chat_id() else {
        return Ok(());
    };
    let now = event.timestamp.timestamp();
    let title = event.chat_title.as_deref();

    // The resolved chat only decides whether to write; the write itself is
    // field-scoped and leaves the switches to the admin commands.
    match update.chat() {
        Some(chat) => {
            let title_changed = title.is_some() && title != chat.title.as_deref();
            if !title_changed && now - chat.last_seen < TOUCH_INTERVAL {
                return Ok(());
            }
        }
        None => info!("New chat {} ({})", chat_id, title.unwrap_or("chat")),
    }

    state.stores.chats.touch_chat(chat_id, title, now).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::track_chat;
    use crate::database::{Chat, ChatStore};
    use crate::dispatch::{ChatKind, InboundEvent, InnerUpdate, Outcome, Sender, UpdateKind};
    use crate::plugins::testing::{OWNER, TestBot};

    const GROUP: i64 = -100;

    fn sender() -> Sender {
        Sender {
            id: 77,
            username: None,
            first_name: "Scav".into(),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn records_group_chat_and_sender() {
        let bot = TestBot::new();
        let event = InboundEvent::message(-100, ChatKind::Supergroup, sender(), "hello")
            .with_chat_title("Vault 13");
        let report = bot.dispatch(event).await;

        assert!(report.handled().contains(&"track_chat"));
        let chat = bot.store.get_chat(-100).await.unwrap().unwrap();
        assert_eq!(chat.title.as_deref(), Some("Vault 13"));
        assert!(!chat.is_active);
        assert_eq!(bot.store.user_count(), 1);
    }

    #[tokio::test]
    async fn ignores_private_chats() {
        let bot = TestBot::new();
        let report = bot
            .dispatch(InboundEvent::message(77, ChatKind::Private, sender(), "hello"))
            .await;
        assert!(!report.handled().contains(&"track_chat"));
        assert!(bot.store.get_chat(77).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn late_activity_write_keeps_chat_switches() {
        let bot = TestBot::new();
        let mut chat = Chat::new(GROUP, Some("Vault 13".into()));
        chat.is_active = true;
        chat.last_seen = 0;
        bot.store.put_chat(chat.clone());

        // Envelope resolved before the chat was switched off.
        let event = InboundEvent::message(GROUP, ChatKind::Supergroup, sender(), "hello")
            .with_chat_title("Vault 13");
        let seen_at = event.timestamp.timestamp();
        let mut earlier = InnerUpdate::new(event, UpdateKind::Text);
        earlier.chat.set(Some(chat));

        let owner = Sender {
            id: OWNER,
            username: None,
            first_name: "Overseer".into(),
            last_name: None,
        };
        let report = bot
            .dispatch(InboundEvent::message(GROUP, ChatKind::Supergroup, owner, "/chat_off"))
            .await;
        assert_eq!(report.count("chat_off", Outcome::Handled), 1);

        track_chat(bot.state.clone(), earlier).await.unwrap();

        let stored = bot.store.get_chat(GROUP).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.last_seen, seen_at);
        assert_eq!(stored.title.as_deref(), Some("Vault 13"));
    }
}
