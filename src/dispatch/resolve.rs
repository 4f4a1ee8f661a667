//! Envelope resolution.
//!
//! Each [`Resolve`] step owns one [`InnerUpdate`] field. A [`ResolvePlan`] is
//! built once per registration from everything the route, filters and handler
//! read, closed over step dependencies and put in dependency order.

use anyhow::Result;
use tracing::debug;

use super::command::Command;
use super::update::{InnerUpdate, UpdateKind};
use crate::database::Stores;

/// One resolvable envelope field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolve {
    /// Sender's last-seen record. Upserts on resolution.
    Invoker,
    Chat,
    /// Linked, active player of the invoker.
    Player,
    Command,
}

impl Resolve {
    pub fn dependencies(self) -> &'static [Resolve] {
        match self {
            Self::Chat | Self::Player => &[Self::Invoker],
            Self::Invoker | Self::Command => &[],
        }
    }
}

/// Dependency-ordered list of steps to run for one registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvePlan {
    steps: Vec<Resolve>,
}

impl ResolvePlan {
    pub fn new(fields: impl IntoIterator<Item = Resolve>) -> Self {
        let mut plan = Self::default();
        for field in fields {
            plan.visit(field);
        }
        plan
    }

    fn visit(&mut self, field: Resolve) {
        if self.steps.contains(&field) {
            return;
        }
        for dep in field.dependencies() {
            self.visit(*dep);
        }
        self.steps.push(field);
    }

    pub fn steps(&self) -> &[Resolve] {
        &self.steps
    }

    pub fn contains(&self, field: Resolve) -> bool {
        self.steps.contains(&field)
    }
}

/// Runs plans against the stores.
#[derive(Clone)]
pub struct Resolvers {
    stores: Stores,
    bot_username: String,
}

impl Resolvers {
    pub fn new(stores: Stores, bot_username: impl Into<String>) -> Self {
        Self {
            stores,
            bot_username: bot_username.into(),
        }
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Resolve every step of `plan` not yet resolved on `update`.
    pub async fn run(&self, plan: &ResolvePlan, update: &mut InnerUpdate) -> Result<()> {
        for step in plan.steps() {
            match step {
                Resolve::Invoker => self.resolve_invoker(update).await?,
                Resolve::Chat => self.resolve_chat(update).await?,
                Resolve::Player => self.resolve_player(update).await?,
                Resolve::Command => self.resolve_command(update),
            }
        }
        Ok(())
    }

    async fn resolve_invoker(&self, update: &mut InnerUpdate) -> Result<()> {
        if update.invoker.is_resolved() {
            return Ok(());
        }
        let seen_at = update.event().timestamp;
        let invoker = match update.event().sender.as_ref() {
            Some(sender) => Some(self.stores.users.touch(sender, seen_at).await?),
            None => None,
        };
        update.invoker.set(invoker);
        Ok(())
    }

    async fn resolve_chat(&self, update: &mut InnerUpdate) -> Result<()> {
        if update.chat.is_resolved() {
            return Ok(());
        }
        let chat = match update.event().effective_chat_id() {
            Some(chat_id) => self.stores.chats.get_chat(chat_id).await?,
            None => None,
        };
        update.chat.set(chat);
        Ok(())
    }

    async fn resolve_player(&self, update: &mut InnerUpdate) -> Result<()> {
        if update.player.is_resolved() {
            return Ok(());
        }
        let player = match update.invoker().map(|i| i.user_id) {
            Some(user_id) => self
                .stores
                .players
                .player_by_telegram_id(user_id)
                .await?
                .filter(|p| p.is_active),
            None => None,
        };
        update.player.set(player);
        Ok(())
    }

    /// Parse the command. Rejections (foreign bot, empty name) resolve as absent.
    pub fn resolve_command(&self, update: &mut InnerUpdate) {
        if update.command.is_resolved() {
            return;
        }
        let command = match (update.kind(), update.event().text()) {
            (UpdateKind::Command, Some(text)) => match Command::parse(text, &self.bot_username) {
                Ok(command) => Some(command),
                Err(e) => {
                    debug!("Ignoring command text: {}", e);
                    None
                }
            },
            _ => None,
        };
        update.command.set(command);
    }
}
