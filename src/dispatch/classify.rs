//! Update classification.

use super::command::Command;
use super::update::{InboundEvent, UpdateKind};
use crate::utils::parse_pipboy;

/// Tags inbound events before routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    /// Telegram id of the game bot whose forwards carry game data.
    game_bot_id: Option<i64>,
}

impl Classifier {
    pub fn new(game_bot_id: Option<i64>) -> Self {
        Self { game_bot_id }
    }

    pub fn classify(&self, event: &InboundEvent) -> UpdateKind {
        if event.callback_data.is_some() {
            return UpdateKind::Callback;
        }

        let Some(text) = event.text() else {
            return UpdateKind::Other;
        };

        if Command::looks_like_command(text) && event.forward_from.is_none() {
            return UpdateKind::Command;
        }

        if let Some(game_bot) = self.game_bot_id
            && event.is_forwarded_from(game_bot)
        {
            return if parse_pipboy(text).is_some() {
                UpdateKind::PipBoy
            } else {
                UpdateKind::GameForward
            };
        }

        UpdateKind::Text
    }
}
