//! Webhook mode.
//!
//! teloxide's axum listener registers the webhook with Telegram, serves
//! updates and deletes the webhook on shutdown.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::info;
use url::Url;

use super::dispatcher::ThrottledBot;
use crate::config::Config;

pub async fn start_webhook(
    config: &Config,
    mut dispatcher: Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey>,
    bot: ThrottledBot,
) -> Result<()> {
    let webhook_url = config
        .webhook_url
        .as_deref()
        .context("WEBHOOK_URL must be set when using webhook mode")?;
    let url = Url::parse(webhook_url).context("Invalid WEBHOOK_URL format")?;

    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let mut options = Options::new(address, url.clone());
    if let Some(secret) = &config.webhook_secret {
        options = options.secret_token(secret.clone());
        info!("Webhook secret token configured");
    }

    info!("Setting webhook URL: {}", url);
    info!("Listening on: {}", address);

    // Webhook setup only needs the plain bot, not the throttled one.
    let listener = webhooks::axum(bot.inner().clone(), options)
        .await
        .context("Failed to set up webhook")?;

    let error_handler = LoggingErrorHandler::with_custom_text("Error from update listener");
    dispatcher
        .dispatch_with_listener(listener, error_handler)
        .await;
    Ok(())
}
