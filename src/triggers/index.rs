use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use tracing::{info, warn};

use crate::database::{Trigger, TriggerStore};

type ChatTriggers = HashMap<i64, Vec<Arc<CompiledTrigger>>>;

/// A trigger with its pattern compiled.
#[derive(Debug)]
pub struct CompiledTrigger {
    pub trigger: Trigger,
    matcher: Regex,
}

impl CompiledTrigger {
    /// The pattern is literal text; flags decide anchoring and case.
    pub fn compile(trigger: Trigger) -> Result<Self, regex::Error> {
        let escaped = regex::escape(&trigger.pattern);
        let source = if trigger.whole_message {
            format!("^{escaped}$")
        } else {
            escaped
        };
        let matcher = RegexBuilder::new(&source)
            .case_insensitive(trigger.ignore_case)
            .build()?;
        Ok(Self { trigger, matcher })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text.trim())
    }
}

/// Per-chat compiled triggers.
///
/// Readers take a snapshot of the whole map; [`refresh`](Self::refresh)
/// builds a new map and swaps it in, so a reader never sees a partial one.
#[derive(Debug, Default)]
pub struct TriggerIndex {
    chats: RwLock<Arc<ChatTriggers>>,
}

impl TriggerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload every trigger from the store.
    pub async fn refresh(&self, store: &dyn TriggerStore) -> Result<usize> {
        let triggers = store.all_triggers().await?;
        let count = self.replace(triggers);
        info!("Trigger index rebuilt with {} triggers", count);
        Ok(count)
    }

    /// Build an index from `triggers` and swap it in. Returns how many compiled.
    pub fn replace(&self, triggers: Vec<Trigger>) -> usize {
        let mut chats = ChatTriggers::new();
        let mut count = 0;

        for trigger in triggers {
            if trigger.pattern.trim().is_empty() {
                warn!("Skipping trigger {} with empty pattern", trigger.id);
                continue;
            }
            let (id, chat_id) = (trigger.id, trigger.chat_id);
            match CompiledTrigger::compile(trigger) {
                Ok(compiled) => {
                    chats.entry(chat_id).or_default().push(Arc::new(compiled));
                    count += 1;
                }
                Err(e) => warn!("Skipping trigger {}: {}", id, e),
            }
        }

        *self.chats.write() = Arc::new(chats);
        count
    }

    pub fn snapshot(&self) -> Arc<HashMap<i64, Vec<Arc<CompiledTrigger>>>> {
        self.chats.read().clone()
    }

    /// Triggers of `chat_id` matching `text`, in id order.
    pub fn matches(&self, chat_id: i64, text: &str) -> Vec<Arc<CompiledTrigger>> {
        self.snapshot()
            .get(&chat_id)
            .map(|list| list.iter().filter(|t| t.is_match(text)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.chats.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
