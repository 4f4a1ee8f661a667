//! Handler and job handler abstractions.
//!
//! Any `async fn(S, InnerUpdate) -> anyhow::Result<()>` is a [`Handler`];
//! any `async fn(S) -> anyhow::Result<()>` is a [`JobHandler`].

use std::future::Future;

use futures::future::BoxFuture;

use super::update::InnerUpdate;

pub type HandlerResult = anyhow::Result<()>;
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

pub trait Handler<S>: Send + Sync {
    fn call(&self, state: S, update: InnerUpdate) -> HandlerFuture;
}

impl<S, F, Fut> Handler<S> for F
where
    F: Fn(S, InnerUpdate) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, state: S, update: InnerUpdate) -> HandlerFuture {
        Box::pin(self(state, update))
    }
}

/// Scheduled job body. Runs without an envelope.
pub trait JobHandler<S>: Send + Sync {
    fn run(&self, state: S) -> HandlerFuture;
}

impl<S, F, Fut> JobHandler<S> for F
where
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn run(&self, state: S) -> HandlerFuture {
        Box::pin(self(state))
    }
}
