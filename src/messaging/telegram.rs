//! Telegram messenger over the throttled bot.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode, ReplyParameters,
};
use tracing::warn;

use super::{ButtonAction, InlineButton, Messenger, OutboundMessage};
use crate::bot::ThrottledBot;
use crate::database::{MediaKind, TriggerMedia};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: ThrottledBot,
}

impl TelegramMessenger {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

/// Build inline keyboard from buttons. Buttons with a malformed URL are dropped.
fn build_keyboard(rows: &[Vec<InlineButton>]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|btn| match &btn.action {
                    ButtonAction::Url(url) => match url.parse() {
                        Ok(url) => Some(InlineKeyboardButton::url(&btn.text, url)),
                        Err(_) => {
                            warn!("Dropping button '{}' with invalid url", btn.text);
                            None
                        }
                    },
                    ButtonAction::Callback(data) => {
                        Some(InlineKeyboardButton::callback(&btn.text, data))
                    }
                })
                .collect()
        })
        .filter(|row: &Vec<InlineKeyboardButton>| !row.is_empty())
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, message: &OutboundMessage) -> Result<i32> {
        let mut req = self
            .bot
            .send_message(ChatId(message.chat_id), &message.text)
            .parse_mode(ParseMode::Html);
        if !message.keyboard.is_empty() {
            req = req.reply_markup(build_keyboard(&message.keyboard));
        }
        if let Some(reply_to) = message.reply_to {
            req = req.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }
        Ok(req.await?.id.0)
    }

    async fn send_media(&self, message: &OutboundMessage, media: &TriggerMedia) -> Result<i32> {
        let chat_id = ChatId(message.chat_id);
        let file = InputFile::file_id(&media.file_id);
        let caption = message.text.clone();
        let reply = message
            .reply_to
            .map(|id| ReplyParameters::new(MessageId(id)));
        let keyboard = (!message.keyboard.is_empty()).then(|| build_keyboard(&message.keyboard));

        // Each media request has its own payload type, so the options are
        // applied per arm.
        macro_rules! with_options {
            ($req:expr, caption) => {{
                let mut req = $req;
                if !caption.is_empty() {
                    req = req.caption(caption.clone()).parse_mode(ParseMode::Html);
                }
                with_options!(req)
            }};
            ($req:expr) => {{
                let mut req = $req;
                if let Some(markup) = keyboard.clone() {
                    req = req.reply_markup(markup);
                }
                if let Some(reply) = reply.clone() {
                    req = req.reply_parameters(reply);
                }
                req.await?.id.0
            }};
        }

        let id = match media.kind {
            MediaKind::Photo => with_options!(self.bot.send_photo(chat_id, file), caption),
            MediaKind::Video => with_options!(self.bot.send_video(chat_id, file), caption),
            MediaKind::Animation => with_options!(self.bot.send_animation(chat_id, file), caption),
            MediaKind::Document => with_options!(self.bot.send_document(chat_id, file), caption),
            MediaKind::Audio => with_options!(self.bot.send_audio(chat_id, file), caption),
            MediaKind::Voice => with_options!(self.bot.send_voice(chat_id, file), caption),
            MediaKind::Sticker => {
                let id = with_options!(self.bot.send_sticker(chat_id, file));
                if !caption.is_empty() {
                    self.bot
                        .send_message(chat_id, caption)
                        .parse_mode(ParseMode::Html)
                        .await?;
                }
                id
            }
        };
        Ok(id)
    }

    async fn pin(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.bot
            .pin_chat_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id);
        if let Some(text) = text {
            req = req.text(text);
        }
        req.await?;
        Ok(())
    }
}
