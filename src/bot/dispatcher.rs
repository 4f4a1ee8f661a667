//! Message dispatcher setup.
//!
//! teloxide delivers updates; they are converted to [`InboundEvent`]s and
//! handed to the [`EventManager`].

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{Chat as TgChat, User};
use tracing::debug;

use crate::config::Config;
use crate::database::{MediaKind, Stores, TriggerMedia};
use crate::dispatch::{ChatKind, DispatchReport, EventManager, InboundEvent, RepliedMessage, Sender};
use crate::messaging::MessageManager;
use crate::permissions::Permissions;
use crate::raid::RaidService;
use crate::triggers::TriggerIndex;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state handed to every handler and job.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub raids: RaidService,
    pub triggers: Arc<TriggerIndex>,
    pub messages: MessageManager,
    pub permissions: Permissions,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(stores: Stores, messages: MessageManager, config: Arc<Config>) -> Self {
        let clock = crate::raid::RaidClock::new(config.raid_grid_offset_hours, config.server_utc_offset_hours);
        Self {
            raids: RaidService::new(stores.raids.clone(), clock),
            triggers: Arc::new(TriggerIndex::new()),
            permissions: Permissions::with_owners(config.owner_ids.clone()),
            stores,
            messages,
            config,
        }
    }
}

/// Build the teloxide dispatcher feeding the event manager.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
    manager: Arc<EventManager<AppState>>,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state, manager])
        .enable_ctrlc_handler()
        .build()
}

fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback))
}

async fn on_message(
    msg: Message,
    state: AppState,
    manager: Arc<EventManager<AppState>>,
) -> anyhow::Result<()> {
    if let Some(event) = message_event(&msg) {
        log_report(&manager.dispatch(&state, event).await);
    }
    Ok(())
}

async fn on_callback(
    q: CallbackQuery,
    state: AppState,
    manager: Arc<EventManager<AppState>>,
) -> anyhow::Result<()> {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let chat_id = q.message.as_ref().map_or(q.from.id.0 as i64, |m| m.chat().id.0);
    let mut event = InboundEvent::callback(chat_id, sender(&q.from), q.id.clone(), data);
    if let Some(message) = &q.message {
        event = event.with_message_id(message.id().0);
        event.chat_kind = Some(chat_kind(message.chat()));
    }
    log_report(&manager.dispatch(&state, event).await);
    Ok(())
}

fn log_report(report: &DispatchReport) {
    if !report.is_empty() {
        debug!("{:?} update handled by {:?}", report.kind, report.handled());
    }
}

fn message_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let mut event = InboundEvent::message(msg.chat.id.0, chat_kind(&msg.chat), sender(user), "")
        .with_message_id(msg.id.0);
    event.text = msg.text().or_else(|| msg.caption()).map(String::from);
    event.timestamp = msg.date;
    if let Some(title) = msg.chat.title() {
        event = event.with_chat_title(title);
    }
    if let Some(origin) = msg.forward_from_user() {
        event = event.forwarded_from(origin.id.0 as i64);
    }
    if let Some(reply) = msg.reply_to_message() {
        event = event.replying_to(RepliedMessage {
            message_id: reply.id.0,
            text: reply.text().or_else(|| reply.caption()).map(String::from),
            media: extract_media(reply),
        });
    }
    Some(event)
}

fn sender(user: &User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

fn chat_kind(chat: &TgChat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_channel() {
        ChatKind::Channel
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Group
    }
}

/// Media file id and kind of a message, if any.
fn extract_media(msg: &Message) -> Option<TriggerMedia> {
    let (kind, file_id) = if let Some(photo) = msg.photo() {
        let largest = photo.iter().max_by_key(|p| p.width * p.height)?;
        (MediaKind::Photo, largest.file.id.clone())
    } else if let Some(video) = msg.video() {
        (MediaKind::Video, video.file.id.clone())
    } else if let Some(animation) = msg.animation() {
        (MediaKind::Animation, animation.file.id.clone())
    } else if let Some(sticker) = msg.sticker() {
        (MediaKind::Sticker, sticker.file.id.clone())
    } else if let Some(document) = msg.document() {
        (MediaKind::Document, document.file.id.clone())
    } else if let Some(audio) = msg.audio() {
        (MediaKind::Audio, audio.file.id.clone())
    } else if let Some(voice) = msg.voice() {
        (MediaKind::Voice, voice.file.id.clone())
    } else {
        return None;
    };
    Some(TriggerMedia { kind, file_id })
}
