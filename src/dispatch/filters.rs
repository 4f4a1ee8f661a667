//! Filters and permission gates.
//!
//! A registration carries a list of filters, all of which must pass (AND).
//! [`Or`] passes when any child passes. Filters that produce a denial text
//! are permission filters; the rest are routing filters and fail silently.
//! Routing filters are always evaluated first, so a message that is not meant
//! for a handler never triggers a denial.

use std::sync::Arc;

use super::resolve::Resolve;
use super::update::InnerUpdate;
use crate::permissions::Permissions;

/// A pure predicate over the envelope.
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, update: &InnerUpdate) -> bool;

    /// Permission filters explain a failure to the user.
    fn is_permission(&self) -> bool {
        false
    }

    /// Message sent when this permission filter fails.
    fn denial(&self, _update: &InnerUpdate) -> Option<String> {
        None
    }

    /// Envelope fields read by `evaluate`.
    fn requires(&self) -> Vec<Resolve> {
        Vec::new()
    }
}

pub type FilterRef = Arc<dyn Filter>;

type Check = Box<dyn Fn(&InnerUpdate) -> bool + Send + Sync>;

/// Filter built from a closure.
pub struct FnFilter {
    name: &'static str,
    requires: Vec<Resolve>,
    denial: Option<String>,
    check: Check,
}

impl FnFilter {
    pub fn routing(
        name: &'static str,
        requires: &[Resolve],
        check: impl Fn(&InnerUpdate) -> bool + Send + Sync + 'static,
    ) -> FilterRef {
        Arc::new(Self {
            name,
            requires: requires.to_vec(),
            denial: None,
            check: Box::new(check),
        })
    }

    pub fn permission(
        name: &'static str,
        requires: &[Resolve],
        denial: impl Into<String>,
        check: impl Fn(&InnerUpdate) -> bool + Send + Sync + 'static,
    ) -> FilterRef {
        Arc::new(Self {
            name,
            requires: requires.to_vec(),
            denial: Some(denial.into()),
            check: Box::new(check),
        })
    }
}

impl Filter for FnFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, update: &InnerUpdate) -> bool {
        (self.check)(update)
    }

    fn is_permission(&self) -> bool {
        self.denial.is_some()
    }

    fn denial(&self, _update: &InnerUpdate) -> Option<String> {
        self.denial.clone()
    }

    fn requires(&self) -> Vec<Resolve> {
        self.requires.clone()
    }
}

/// Passes when any child passes.
pub struct Or {
    name: String,
    children: Vec<FilterRef>,
}

impl Or {
    pub fn new(children: Vec<FilterRef>) -> FilterRef {
        let name = children
            .iter()
            .map(|f| f.name().to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        Arc::new(Self { name, children })
    }
}

impl Filter for Or {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, update: &InnerUpdate) -> bool {
        self.children.iter().any(|f| f.evaluate(update))
    }

    fn is_permission(&self) -> bool {
        self.children.iter().any(|f| f.is_permission())
    }

    fn denial(&self, update: &InnerUpdate) -> Option<String> {
        self.children.iter().find_map(|f| f.denial(update))
    }

    fn requires(&self) -> Vec<Resolve> {
        self.children.iter().flat_map(|f| f.requires()).collect()
    }
}

/// Passes when every child passes. Mostly useful inside [`Or`].
pub struct And {
    name: String,
    children: Vec<FilterRef>,
}

impl And {
    pub fn new(children: Vec<FilterRef>) -> FilterRef {
        let name = children
            .iter()
            .map(|f| f.name().to_string())
            .collect::<Vec<_>>()
            .join(" & ");
        Arc::new(Self { name, children })
    }
}

impl Filter for And {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, update: &InnerUpdate) -> bool {
        self.children.iter().all(|f| f.evaluate(update))
    }

    fn is_permission(&self) -> bool {
        self.children.iter().any(|f| f.is_permission())
    }

    fn denial(&self, update: &InnerUpdate) -> Option<String> {
        self.children
            .iter()
            .filter(|f| !f.evaluate(update))
            .find_map(|f| f.denial(update))
    }

    fn requires(&self) -> Vec<Resolve> {
        self.children.iter().flat_map(|f| f.requires()).collect()
    }
}

/// Outcome of a filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// A routing filter failed. Nothing is sent.
    Skip,
    /// A permission filter failed with this message.
    Deny(String),
}

/// A registration's filters, split into routing and permission filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    routing: Vec<FilterRef>,
    permission: Vec<FilterRef>,
}

impl FilterChain {
    pub fn new(filters: impl IntoIterator<Item = FilterRef>) -> Self {
        let (permission, routing): (Vec<FilterRef>, Vec<FilterRef>) =
            filters.into_iter().partition(|f| f.is_permission());
        Self { routing, permission }
    }

    pub fn push(&mut self, filter: FilterRef) {
        if filter.is_permission() {
            self.permission.push(filter);
        } else {
            self.routing.push(filter);
        }
    }

    pub fn requires(&self) -> Vec<Resolve> {
        self.routing
            .iter()
            .chain(&self.permission)
            .flat_map(|f| f.requires())
            .collect()
    }

    pub fn check(&self, update: &InnerUpdate) -> Verdict {
        if !self.routing.iter().all(|f| f.evaluate(update)) {
            return Verdict::Skip;
        }
        match self.permission.iter().find(|f| !f.evaluate(update)) {
            Some(filter) => Verdict::Deny(
                filter
                    .denial(update)
                    .unwrap_or_else(|| format!("Access denied ({}).", filter.name())),
            ),
            None => Verdict::Pass,
        }
    }
}

// Routing filters.

/// Private chat with the bot.
pub fn private() -> FilterRef {
    FnFilter::routing("private", &[], |u| u.event().is_private())
}

/// Group or supergroup.
pub fn group() -> FilterRef {
    FnFilter::routing("group", &[], |u| u.event().is_group())
}

/// Sender is a linked, active and not banned player.
pub fn from_player() -> FilterRef {
    FnFilter::routing("from_player", &[Resolve::Player], |u| {
        u.player().is_some_and(|p| !p.is_banned)
    })
}

/// Chat is known and enabled.
pub fn active_chat() -> FilterRef {
    FnFilter::routing("active_chat", &[Resolve::Chat], |u| {
        u.chat().is_some_and(|c| c.is_active)
    })
}

/// Chat is flagged for admin commands.
pub fn admin_chat() -> FilterRef {
    FnFilter::routing("admin_chat", &[Resolve::Chat], |u| {
        u.chat().is_some_and(|c| c.is_admin_chat)
    })
}

// Permission filters.

pub fn is_admin(permissions: &Permissions) -> FilterRef {
    let permissions = permissions.clone();
    FnFilter::permission(
        "is_admin",
        &[Resolve::Invoker, Resolve::Player],
        "⛔ This command is for admins only.",
        move |u| permissions.is_admin(u),
    )
}

pub fn group_leader(permissions: &Permissions) -> FilterRef {
    let permissions = permissions.clone();
    FnFilter::permission(
        "group_leader",
        &[Resolve::Invoker, Resolve::Player],
        "⛔ Only group leaders can do this.",
        move |u| permissions.is_group_leader(u),
    )
}

/// The command targets the invoker's own player, or the invoker is an admin.
///
/// The target player id comes from the subcommand (`/stats_12`) or the first
/// argument word. A command without a target counts as targeting oneself.
pub fn self_or_admin(permissions: &Permissions) -> FilterRef {
    let permissions = permissions.clone();
    FnFilter::permission(
        "self_or_admin",
        &[Resolve::Invoker, Resolve::Player, Resolve::Command],
        "⛔ You can only do this for yourself.",
        move |u| match command_target(u) {
            Some(target) => permissions.can_act_for(u, target),
            None => true,
        },
    )
}

/// Player id a command is aimed at.
pub fn command_target(update: &InnerUpdate) -> Option<i64> {
    let command = update.command()?;
    command.subcommand_id().or_else(|| {
        command
            .argument
            .split_whitespace()
            .next()
            .and_then(|word| word.parse().ok())
    })
}
