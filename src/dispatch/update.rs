//! Inbound events and the per-event envelope.

use chrono::{DateTime, Utc};

use super::command::Command;
use crate::database::{Chat, Invoker, Player, TriggerMedia};

/// Kind of chat an event arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}

/// Whoever sent the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Sender {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// The message an event replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepliedMessage {
    pub message_id: i32,
    pub text: Option<String>,
    pub media: Option<TriggerMedia>,
}

/// A raw chat message or callback, as handed over by the transport.
///
/// Immutable once received.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: Option<i64>,
    pub chat_kind: Option<ChatKind>,
    pub chat_title: Option<String>,
    pub sender: Option<Sender>,
    pub message_id: Option<i32>,
    pub text: Option<String>,
    /// Id of the user or bot the message was forwarded from.
    pub forward_from: Option<i64>,
    pub callback_id: Option<String>,
    pub callback_data: Option<String>,
    pub reply_to: Option<Box<RepliedMessage>>,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    /// Text message from `sender` in `chat_id`.
    pub fn message(chat_id: i64, chat_kind: ChatKind, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id),
            chat_kind: Some(chat_kind),
            chat_title: None,
            sender: Some(sender),
            message_id: None,
            text: Some(text.into()),
            forward_from: None,
            callback_id: None,
            callback_data: None,
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    /// Inline-button press carrying `data`.
    pub fn callback(chat_id: i64, sender: Sender, id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id),
            chat_kind: None,
            chat_title: None,
            sender: Some(sender),
            message_id: None,
            text: None,
            forward_from: None,
            callback_id: Some(id.into()),
            callback_data: Some(data.into()),
            reply_to: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn forwarded_from(mut self, source_id: i64) -> Self {
        self.forward_from = Some(source_id);
        self
    }

    #[must_use]
    pub fn with_message_id(mut self, message_id: i32) -> Self {
        self.message_id = Some(message_id);
        self
    }

    #[must_use]
    pub fn replying_to(mut self, message: RepliedMessage) -> Self {
        self.reply_to = Some(Box::new(message));
        self
    }

    #[must_use]
    pub fn with_chat_title(mut self, title: impl Into<String>) -> Self {
        self.chat_title = Some(title.into());
        self
    }

    pub fn effective_chat_id(&self) -> Option<i64> {
        self.chat_id
    }

    pub fn effective_user_id(&self) -> Option<i64> {
        self.sender.as_ref().map(|s| s.id)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_forwarded_from(&self, source_id: i64) -> bool {
        self.forward_from == Some(source_id)
    }

    pub fn is_private(&self) -> bool {
        self.chat_kind == Some(ChatKind::Private)
    }

    pub fn is_group(&self) -> bool {
        self.chat_kind.is_some_and(ChatKind::is_group)
    }
}

/// Tag attached by the classifier before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Text starting with the command sigil.
    Command,
    /// Inline keyboard press.
    Callback,
    /// Forwarded Pip-Boy profile from the game bot.
    PipBoy,
    /// Any other forward from the game bot.
    GameForward,
    /// Plain text.
    Text,
    /// Nothing the bot understands (stickers, service messages, ...).
    Other,
}

/// State of a lazily resolved envelope field.
#[derive(Debug, Clone, Default)]
pub enum Resolution<T> {
    #[default]
    Unresolved,
    Resolved(Option<T>),
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The resolved value, `None` when unresolved or resolved as absent.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => value.as_ref(),
            Self::Unresolved => None,
        }
    }

    /// Store the resolved value. Returns `false` if already resolved.
    pub fn set(&mut self, value: Option<T>) -> bool {
        if self.is_resolved() {
            return false;
        }
        *self = Self::Resolved(value);
        true
    }
}

/// One inbound event plus whatever has been resolved about it so far.
#[derive(Debug, Clone)]
pub struct InnerUpdate {
    event: InboundEvent,
    kind: UpdateKind,
    pub(crate) invoker: Resolution<Invoker>,
    pub(crate) chat: Resolution<Chat>,
    pub(crate) player: Resolution<Player>,
    pub(crate) command: Resolution<Command>,
}

impl InnerUpdate {
    pub fn new(event: InboundEvent, kind: UpdateKind) -> Self {
        Self {
            event,
            kind,
            invoker: Resolution::Unresolved,
            chat: Resolution::Unresolved,
            player: Resolution::Unresolved,
            command: Resolution::Unresolved,
        }
    }

    pub fn event(&self) -> &InboundEvent {
        &self.event
    }

    pub fn kind(&self) -> UpdateKind {
        self.kind
    }

    pub fn invoker(&self) -> Option<&Invoker> {
        self.invoker.get()
    }

    pub fn chat(&self) -> Option<&Chat> {
        self.chat.get()
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.get()
    }

    pub fn command(&self) -> Option<&Command> {
        self.command.get()
    }

    /// Chat id to reply into.
    pub fn reply_chat_id(&self) -> Option<i64> {
        self.event.chat_id.or_else(|| self.event.effective_user_id())
    }

    /// Command argument, or an empty string.
    pub fn argument(&self) -> &str {
        self.command().map(|c| c.argument.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Sender {
        Sender {
            id: 7,
            username: Some("vault_dweller".into()),
            first_name: "Vault".into(),
            last_name: Some("Dweller".into()),
        }
    }

    #[test]
    fn resolution_is_set_once() {
        let mut field: Resolution<i32> = Resolution::Unresolved;
        assert!(!field.is_resolved());
        assert!(field.set(Some(1)));
        assert!(!field.set(Some(2)));
        assert_eq!(field.get(), Some(&1));
    }

    #[test]
    fn absent_resolution_counts_as_resolved() {
        let mut field: Resolution<i32> = Resolution::Unresolved;
        assert!(field.set(None));
        assert!(field.is_resolved());
        assert!(field.get().is_none());
        assert!(!field.set(Some(3)));
    }

    #[test]
    fn event_accessors() {
        let event = InboundEvent::message(-100, ChatKind::Supergroup, sender(), "hi").forwarded_from(42);
        assert_eq!(event.effective_chat_id(), Some(-100));
        assert_eq!(event.effective_user_id(), Some(7));
        assert!(event.is_forwarded_from(42));
        assert!(!event.is_forwarded_from(43));
        assert!(event.is_group());
        assert!(!event.is_private());
        assert_eq!(sender().full_name(), "Vault Dweller");
    }

    #[test]
    fn reply_chat_falls_back_to_sender() {
        let mut event = InboundEvent::message(5, ChatKind::Private, sender(), "x");
        event.chat_id = None;
        let update = InnerUpdate::new(event, UpdateKind::Text);
        assert_eq!(update.reply_chat_id(), Some(7));
        assert_eq!(update.argument(), "");
    }
}
