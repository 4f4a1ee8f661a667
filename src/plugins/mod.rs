//! Bot features as event-manager modules.
//!
//! Add a plugin by writing a `module()` constructor in a new file and
//! registering it in [`register_all`].

pub mod activity;
pub mod admin;
pub mod raids;
pub mod start;
pub mod stats;
pub mod triggers;

use crate::bot::AppState;
use crate::dispatch::{EventManager, InnerUpdate};
use crate::messaging::OutboundMessage;
use crate::permissions::Permissions;

/// Register every plugin module.
pub fn register_all(manager: &mut EventManager<AppState>, permissions: &Permissions) {
    manager.register(activity::module());
    manager.register(start::module());
    manager.register(stats::module(permissions));
    manager.register(raids::module(permissions));
    manager.register(admin::module(permissions));
    manager.register(triggers::module(permissions));
}

/// Reply to the message behind `update` with HTML text.
pub(crate) async fn reply(state: &AppState, update: &InnerUpdate, text: impl Into<String>) {
    let Some(chat_id) = update.reply_chat_id() else {
        return;
    };
    let message = OutboundMessage::text(chat_id, text).reply_to(update.event().message_id);
    state.messages.send(message).await;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Full plugin stack over in-memory collaborators.

    use std::sync::Arc;

    use crate::bot::AppState;
    use crate::config::Config;
    use crate::database::{MemoryStore, Stores};
    use crate::dispatch::{Classifier, DispatchReport, EventManager, InboundEvent, Resolvers};
    use crate::messaging::{MessageManager, RecordingMessenger};

    pub const BOT: &str = "warden_bot";
    pub const GAME_BOT: i64 = 430_930_191;
    pub const OWNER: i64 = 1;

    pub struct TestBot {
        pub state: AppState,
        pub store: Arc<MemoryStore>,
        pub messenger: Arc<RecordingMessenger>,
        pub manager: EventManager<AppState>,
    }

    impl TestBot {
        pub fn new() -> Self {
            Self::with_stores(|_| {})
        }

        /// Like [`TestBot::new`], with some stores swapped out by `customize`.
        pub fn with_stores(customize: impl FnOnce(&mut Stores)) -> Self {
            let config = Config::from_lookup(|name| match name {
                "BOT_TOKEN" => Some("test".into()),
                "STORAGE" => Some("memory".into()),
                "OWNER_IDS" => Some(OWNER.to_string()),
                "GAME_BOT_ID" => Some(GAME_BOT.to_string()),
                "DARK_ZONE_DISTANCES" => Some("24".into()),
                _ => None,
            })
            .unwrap();

            let store = Arc::new(MemoryStore::new());
            let mut stores = Stores::memory(store.clone());
            customize(&mut stores);
            let messenger = Arc::new(RecordingMessenger::default());
            let messages = MessageManager::spawn(messenger.clone());
            let state = AppState::new(stores.clone(), messages.clone(), Arc::new(config));

            let mut manager = EventManager::new(
                Classifier::new(Some(GAME_BOT)),
                Resolvers::new(stores, BOT),
                messages,
            );
            super::register_all(&mut manager, &state.permissions);

            Self {
                state,
                store,
                messenger,
                manager,
            }
        }

        pub async fn dispatch(&self, event: InboundEvent) -> DispatchReport {
            self.manager.dispatch(&self.state, event).await
        }

        /// Let the message queue worker drain.
        pub async fn settle(&self) {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
        }
    }
}
