//! Event manager: module registry and router.
//!
//! Modules are dispatched in ascending `group` order, registration order
//! within a group. Every module sees every event (fan-out); inside a module
//! the first registration whose route matches and whose filters pass runs,
//! and nothing else in that module does.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::classify::Classifier;
use super::filters::{FilterChain, FilterRef, Verdict};
use super::handler::{Handler, JobHandler};
use super::resolve::{Resolve, ResolvePlan, Resolvers};
use super::update::{InboundEvent, InnerUpdate, UpdateKind};
use crate::messaging::{MessageManager, OutboundMessage};

/// What a registration reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Command by name. With `family`, `/name_<suffix>` matches as well.
    Command { name: String, family: bool },
    /// Classifier tag.
    Kind(UpdateKind),
    /// Callback whose payload starts with the prefix.
    Callback(String),
    /// Every event.
    Any,
}

impl Route {
    pub fn command(name: &str) -> Self {
        Self::Command {
            name: name.to_lowercase(),
            family: false,
        }
    }

    pub fn command_family(name: &str) -> Self {
        Self::Command {
            name: name.to_lowercase(),
            family: true,
        }
    }

    pub fn callback(prefix: impl Into<String>) -> Self {
        Self::Callback(prefix.into())
    }

    fn requires(&self) -> &'static [Resolve] {
        match self {
            Self::Command { .. } => &[Resolve::Command],
            _ => &[],
        }
    }

    fn matches(&self, update: &InnerUpdate) -> bool {
        match self {
            Self::Command { name, family } => update
                .command()
                .is_some_and(|c| c.name == *name || (*family && c.family() == name)),
            Self::Kind(kind) => update.kind() == *kind,
            Self::Callback(prefix) => update
                .event()
                .callback_data
                .as_deref()
                .is_some_and(|data| data.starts_with(prefix.as_str())),
            Self::Any => true,
        }
    }
}

/// A handler with its route, filters and resolution plan.
pub struct Registration<S> {
    route: Route,
    name: &'static str,
    handler: Arc<dyn Handler<S>>,
    chain: FilterChain,
    declared: Vec<Resolve>,
    plan: ResolvePlan,
    usage: Option<String>,
}

impl<S: 'static> Registration<S> {
    pub fn new(route: Route, name: &'static str, handler: impl Handler<S> + 'static) -> Self {
        Self {
            route,
            name,
            handler: Arc::new(handler),
            chain: FilterChain::default(),
            declared: Vec::new(),
            plan: ResolvePlan::default(),
            usage: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterRef) -> Self {
        self.chain.push(filter);
        self
    }

    /// Envelope fields the handler reads.
    #[must_use]
    pub fn resolve(mut self, fields: &[Resolve]) -> Self {
        self.declared.extend_from_slice(fields);
        self
    }

    /// Sent instead of running the handler when the argument is empty.
    #[must_use]
    pub fn usage(mut self, hint: impl Into<String>) -> Self {
        self.usage = Some(hint.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn plan(&self) -> &ResolvePlan {
        &self.plan
    }

    fn build_plan(&mut self) {
        let fields = self
            .route
            .requires()
            .iter()
            .copied()
            .chain(self.chain.requires())
            .chain(self.declared.iter().copied());
        self.plan = ResolvePlan::new(fields);
    }
}

/// A recurring job owned by a module.
pub struct ScheduledJob<S> {
    pub name: &'static str,
    pub cron: String,
    pub handler: Arc<dyn JobHandler<S>>,
}

impl<S> Clone for ScheduledJob<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cron: self.cron.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// A named group of registrations and jobs.
pub struct Module<S> {
    name: &'static str,
    group: i32,
    registrations: Vec<Registration<S>>,
    jobs: Vec<ScheduledJob<S>>,
}

impl<S: 'static> Module<S> {
    pub fn new(name: &'static str, group: i32) -> Self {
        Self {
            name,
            group,
            registrations: Vec::new(),
            jobs: Vec::new(),
        }
    }

    /// Add a registration. Its resolution plan is fixed here.
    #[must_use]
    pub fn on(mut self, mut registration: Registration<S>) -> Self {
        registration.build_plan();
        self.registrations.push(registration);
        self
    }

    /// Add a job run on the cron schedule `cron` (with seconds field).
    #[must_use]
    pub fn job(
        mut self,
        name: &'static str,
        cron: impl Into<String>,
        handler: impl JobHandler<S> + 'static,
    ) -> Self {
        self.jobs.push(ScheduledJob {
            name,
            cron: cron.into(),
            handler: Arc::new(handler),
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> i32 {
        self.group
    }

    pub fn registrations(&self) -> &[Registration<S>] {
        &self.registrations
    }

    pub fn jobs(&self) -> &[ScheduledJob<S>] {
        &self.jobs
    }
}

/// How a module dealt with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Denied,
    Usage,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOutcome {
    pub module: &'static str,
    pub handler: &'static str,
    pub outcome: Outcome,
}

/// Per-module outcomes of one dispatch, in dispatch order.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub kind: UpdateKind,
    pub outcomes: Vec<ModuleOutcome>,
}

impl DispatchReport {
    /// How many times `handler` ended with `outcome`.
    pub fn count(&self, handler: &str, outcome: Outcome) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.handler == handler && o.outcome == outcome)
            .count()
    }

    pub fn handled(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| o.outcome == Outcome::Handled)
            .map(|o| o.handler)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

pub struct EventManager<S> {
    modules: Vec<Module<S>>,
    classifier: Classifier,
    resolvers: Resolvers,
    messages: MessageManager,
}

impl<S> EventManager<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(classifier: Classifier, resolvers: Resolvers, messages: MessageManager) -> Self {
        Self {
            modules: Vec::new(),
            classifier,
            resolvers,
            messages,
        }
    }

    /// Add a module after every module of the same or a lower group.
    pub fn register(&mut self, module: Module<S>) {
        info!(
            "Registered module '{}' (group {}, {} handlers, {} jobs)",
            module.name,
            module.group,
            module.registrations.len(),
            module.jobs.len()
        );
        let at = self.modules.partition_point(|m| m.group <= module.group);
        self.modules.insert(at, module);
    }

    pub fn modules(&self) -> &[Module<S>] {
        &self.modules
    }

    /// Every job with the name of its module.
    pub fn jobs(&self) -> Vec<(&'static str, ScheduledJob<S>)> {
        self.modules
            .iter()
            .flat_map(|m| m.jobs.iter().map(move |j| (m.name, j.clone())))
            .collect()
    }

    /// Classify `event` and run it through every module.
    pub async fn dispatch(&self, state: &S, event: InboundEvent) -> DispatchReport {
        let kind = self.classifier.classify(&event);
        let mut update = InnerUpdate::new(event, kind);
        let mut report = DispatchReport {
            kind,
            outcomes: Vec::new(),
        };

        // Also classifies foreign-bot commands as absent.
        self.resolvers.resolve_command(&mut update);
        if kind == UpdateKind::Command && update.command().is_none() {
            debug!("Dropping command not addressed to this bot");
            return report;
        }

        for module in &self.modules {
            if let Some(outcome) = self.dispatch_module(module, state, &mut update).await {
                report.outcomes.push(outcome);
            }
        }
        report
    }

    async fn dispatch_module(
        &self,
        module: &Module<S>,
        state: &S,
        update: &mut InnerUpdate,
    ) -> Option<ModuleOutcome> {
        for registration in &module.registrations {
            if !registration.route.matches(update) {
                continue;
            }

            let done = |outcome| {
                Some(ModuleOutcome {
                    module: module.name,
                    handler: registration.name,
                    outcome,
                })
            };

            if let Err(e) = self.resolvers.run(&registration.plan, update).await {
                warn!(
                    "Resolution failed in module '{}' before '{}': {:#}",
                    module.name, registration.name, e
                );
                return done(Outcome::Failed);
            }

            match registration.chain.check(update) {
                Verdict::Skip => continue,
                Verdict::Deny(text) => {
                    debug!("'{}' denied in module '{}'", registration.name, module.name);
                    self.reply(update, text).await;
                    return done(Outcome::Denied);
                }
                Verdict::Pass => {}
            }

            if let Some(hint) = &registration.usage
                && update.argument().is_empty()
            {
                self.reply(update, hint.clone()).await;
                return done(Outcome::Usage);
            }

            let call = registration.handler.call(state.clone(), update.clone());
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(Ok(())) => Outcome::Handled,
                Ok(Err(e)) => {
                    error!(
                        "Handler '{}' in module '{}' failed: {:#}",
                        registration.name, module.name, e
                    );
                    Outcome::Failed
                }
                Err(_) => {
                    error!("Handler '{}' in module '{}' panicked", registration.name, module.name);
                    Outcome::Failed
                }
            };
            return done(outcome);
        }
        None
    }

    /// Denials and usage hints: callback toast or reply in the chat.
    async fn reply(&self, update: &InnerUpdate, text: String) {
        let event = update.event();
        if let Some(callback_id) = &event.callback_id {
            self.messages.answer_callback(callback_id, Some(&text)).await;
            return;
        }
        if let Some(chat_id) = update.reply_chat_id() {
            self.messages
                .send(OutboundMessage::text(chat_id, text).reply_to(event.message_id))
                .await;
        }
    }
}
