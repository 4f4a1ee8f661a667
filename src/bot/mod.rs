//! Telegram glue: state, dispatcher and runtime.

pub mod dispatcher;
mod runtime;
pub mod webhook;

pub use dispatcher::{AppState, ThrottledBot, build_dispatcher};
pub use runtime::run;
