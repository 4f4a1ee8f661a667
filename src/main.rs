use std::sync::Arc;

use anyhow::Context;
use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wasteland_warden::bot::{self, AppState};
use wasteland_warden::cache::CacheRegistry;
use wasteland_warden::config::{Config, StorageKind};
use wasteland_warden::database::{Database, MemoryStore, Stores};
use wasteland_warden::dispatch::{Classifier, EventManager, Resolvers};
use wasteland_warden::messaging::{MessageManager, TelegramMessenger};
use wasteland_warden::plugins;
use wasteland_warden::scheduler::Scheduler;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wasteland_warden=info,teloxide=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Wasteland Warden...");

    let config = Arc::new(Config::from_env()?);
    info!("Configuration loaded (mode {:?}, storage {:?})", config.bot_mode, config.storage);

    let stores = match config.storage {
        StorageKind::Mongo => {
            let uri = config.mongodb_uri.as_deref().context("MONGODB_URI must be set")?;
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            let cache = CacheRegistry::new();
            let stores = Stores::mongo(&db, &cache).await?;
            info!("Database connected");
            stores
        }
        StorageKind::Memory => {
            warn!("Using in-memory storage, nothing will be persisted");
            Stores::memory(Arc::new(MemoryStore::new()))
        }
    };

    // Throttle respects Telegram's global and per-chat rate limits.
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("Using bot username: @{}", bot_username);

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let messages = MessageManager::spawn(Arc::new(TelegramMessenger::new(bot.clone())));
    let state = AppState::new(stores.clone(), messages.clone(), config.clone());

    let count = state.triggers.refresh(stores.triggers.as_ref()).await?;
    info!("Loaded {} triggers", count);

    let mut manager = EventManager::new(
        Classifier::new(config.game_bot_id),
        Resolvers::new(stores, bot_username),
        messages,
    );
    plugins::register_all(&mut manager, &state.permissions);

    let scheduler = Scheduler::new().await?;
    let jobs = scheduler.add_module_jobs(manager.jobs(), state.clone()).await?;
    scheduler.start().await?;
    info!("{} scheduled jobs running", jobs);

    let dispatcher = bot::build_dispatcher(bot.clone(), state, Arc::new(manager));
    bot::run(&config, bot, dispatcher).await
}
