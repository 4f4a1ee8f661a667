//! Update dispatching.
//!
//! Inbound events are classified, wrapped in an [`InnerUpdate`] envelope and
//! fanned out to every registered [`Module`]. Envelope fields (invoker, chat,
//! player, command) are resolved lazily, only when a matching registration
//! needs them.

mod classify;
mod command;
pub mod filters;
mod handler;
mod manager;
mod resolve;
mod update;

pub use classify::Classifier;
pub use command::{Command, CommandError};
pub use filters::{And, FilterChain, FilterRef, Filter, FnFilter, Or, Verdict};
pub use handler::{Handler, HandlerFuture, HandlerResult, JobHandler};
pub use manager::{
    DispatchReport, EventManager, Module, ModuleOutcome, Outcome, Registration, Route, ScheduledJob,
};
pub use resolve::{Resolve, ResolvePlan, Resolvers};
pub use update::{ChatKind, InboundEvent, InnerUpdate, RepliedMessage, Resolution, Sender, UpdateKind};
