//! Player stats: Pip-Boy registration and stat reports.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::bot::AppState;
use crate::database::Player;
use crate::dispatch::filters::{self, command_target};
use crate::dispatch::{HandlerResult, InnerUpdate, Module, Registration, Resolve, Route, UpdateKind};
use crate::permissions::Permissions;
use crate::utils::{html_escape, parse_pipboy};

use super::reply;

pub fn module(permissions: &Permissions) -> Module<AppState> {
    Module::new("stats", 10)
        .on(Registration::new(Route::command("me"), "me", me)
            .filter(filters::private())
            .filter(filters::from_player()))
        .on(Registration::new(Route::command_family("stats"), "stats", stats)
            .filter(filters::from_player())
            .filter(filters::self_or_admin(permissions)))
        .on(Registration::new(Route::Kind(UpdateKind::PipBoy), "pipboy", pipboy)
            .filter(filters::private())
            .resolve(&[Resolve::Invoker]))
}

/// Stat report of one player.
pub fn stat_report(player: &Player) -> String {
    let s = &player.stats;
    let updated = DateTime::<Utc>::from_timestamp(player.updated_at, 0)
        .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        "👤 <b>{}</b> #{}\n\
         ❤️ Health: {}\n\
         ⚔️ Damage: {}\n\
         🛡 Armor: {}\n\
         💪 Strength: {}\n\
         🎯 Accuracy: {}\n\
         🗣 Charisma: {}\n\
         🤸 Agility: {}\n\
         🔋 Stamina: {}\n\n\
         Total: <b>{}</b>\n\
         Updated: {}",
        html_escape(&player.nickname),
        player.id,
        s.health,
        s.damage,
        s.armor,
        s.strength,
        s.accuracy,
        s.charisma,
        s.agility,
        s.stamina,
        s.total(),
        updated
    )
}

async fn me(state: AppState, update: InnerUpdate) -> HandlerResult {
    if let Some(player) = update.player() {
        reply(&state, &update, stat_report(player)).await;
    }
    Ok(())
}

async fn stats(state: AppState, update: InnerUpdate) -> HandlerResult {
    let target = match command_target(&update) {
        Some(id) => state.stores.players.player(id).await?,
        None => update.player().cloned(),
    };
    let text = match target {
        Some(player) => stat_report(&player),
        None => "Player not found.".to_string(),
    };
    reply(&state, &update, text).await;
    Ok(())
}

/// Register or update the sender from a forwarded profile.
async fn pipboy(state: AppState, update: InnerUpdate) -> HandlerResult {
    let Some(profile) = update.event().text().and_then(parse_pipboy) else {
        return Ok(());
    };
    let Some(telegram_id) = update.event().effective_user_id() else {
        return Ok(());
    };

    let players = &state.stores.players;
    let player = match players.player_by_telegram_id(telegram_id).await? {
        Some(player) if player.is_banned => return Ok(()),
        Some(player) => player,
        None => {
            let player = players.create_player(telegram_id, &profile.nickname).await?;
            info!("Registered player #{} ({}) for {}", player.id, player.nickname, telegram_id);
            player
        }
    };

    // Profile fields only; `is_banned` stays as stored.
    let updated_at = update.event().timestamp.timestamp();
    let Some(player) = players
        .update_profile(player.id, &profile.nickname, &profile.stats, updated_at)
        .await?
    else {
        return Ok(());
    };

    reply(&state, &update, format!("✅ Profile saved.\n\n{}", stat_report(&player))).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::database::{MemoryStore, Player, PlayerStats, PlayerStore};
    use crate::dispatch::{ChatKind, InboundEvent, Outcome, Sender};
    use crate::plugins::testing::{GAME_BOT, TestBot};

    /// Player store where a ban lands right after every lookup.
    struct BannedAfterLookup(Arc<MemoryStore>);

    #[async_trait]
    impl PlayerStore for BannedAfterLookup {
        async fn player(&self, id: i64) -> Result<Option<Player>> {
            self.0.player(id).await
        }

        async fn player_by_telegram_id(&self, telegram_id: i64) -> Result<Option<Player>> {
            let found = self.0.player_by_telegram_id(telegram_id).await?;
            if let Some(player) = &found {
                self.0.set_banned(player.id, true).await?;
            }
            Ok(found)
        }

        async fn create_player(&self, telegram_id: i64, nickname: &str) -> Result<Player> {
            self.0.create_player(telegram_id, nickname).await
        }

        async fn update_profile(
            &self,
            id: i64,
            nickname: &str,
            stats: &PlayerStats,
            updated_at: i64,
        ) -> Result<Option<Player>> {
            self.0.update_profile(id, nickname, stats, updated_at).await
        }

        async fn set_banned(&self, id: i64, banned: bool) -> Result<Option<Player>> {
            self.0.set_banned(id, banned).await
        }
    }

    const PROFILE: &str = "👤Vault Boy\n\
        ├❤️Здоровье: 152/160\n\
        ├⚔️Урон: 120\n\
        ├🛡Броня: 34\n\
        ├💪Сила: 110";

    fn sender(id: i64) -> Sender {
        Sender {
            id,
            username: Some(format!("user{id}")),
            first_name: "Wanderer".into(),
            last_name: None,
        }
    }

    fn private(id: i64, text: &str) -> InboundEvent {
        InboundEvent::message(id, ChatKind::Private, sender(id), text)
    }

    #[tokio::test]
    async fn me_reaches_report_once_for_active_player() {
        let bot = TestBot::new();
        bot.store.put_player(Player::new(3, 42, "Wanderer"));

        let report = bot.dispatch(private(42, "/me")).await;
        assert_eq!(report.count("me", Outcome::Handled), 1);
        let texts = bot.messenger.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("<b>Wanderer</b> #3"));
    }

    #[tokio::test]
    async fn me_is_silent_for_banned_player() {
        let bot = TestBot::new();
        let mut player = Player::new(3, 42, "Wanderer");
        player.is_banned = true;
        bot.store.put_player(player);

        let report = bot.dispatch(private(42, "/me")).await;
        assert_eq!(report.count("me", Outcome::Handled), 0);
        assert!(report.handled().is_empty());
        assert!(bot.messenger.sent().is_empty());
    }

    #[tokio::test]
    async fn stats_of_other_player_needs_admin() {
        let bot = TestBot::new();
        bot.store.put_player(Player::new(3, 42, "Wanderer"));
        bot.store.put_player(Player::new(4, 43, "Raider"));

        let report = bot.dispatch(private(42, "/stats_4")).await;
        assert_eq!(report.count("stats", Outcome::Denied), 1);

        let report = bot.dispatch(private(42, "/stats_3")).await;
        assert_eq!(report.count("stats", Outcome::Handled), 1);
        assert!(bot.messenger.texts()[1].contains("Wanderer"));
    }

    #[tokio::test]
    async fn pipboy_forward_registers_player() {
        let bot = TestBot::new();
        let event = private(42, PROFILE).forwarded_from(GAME_BOT);

        let report = bot.dispatch(event.clone()).await;
        assert_eq!(report.count("pipboy", Outcome::Handled), 1);
        let player = bot.store.player_by_telegram_id(42).await.unwrap().unwrap();
        assert_eq!(player.nickname, "Vault Boy");
        assert_eq!(player.stats.health, 152);

        bot.dispatch(event).await;
        let again = bot.store.player_by_telegram_id(42).await.unwrap().unwrap();
        assert_eq!(again.id, player.id);
    }

    #[tokio::test]
    async fn pipboy_forward_keeps_concurrent_ban() {
        let store = Arc::new(MemoryStore::new());
        store.put_player(Player::new(3, 42, "Wanderer"));
        let players: Arc<dyn PlayerStore> = Arc::new(BannedAfterLookup(store.clone()));
        let bot = TestBot::with_stores(|stores| stores.players = players);

        let report = bot.dispatch(private(42, PROFILE).forwarded_from(GAME_BOT)).await;
        assert_eq!(report.count("pipboy", Outcome::Handled), 1);

        let player = store.player(3).await.unwrap().unwrap();
        assert!(player.is_banned);
        assert_eq!(player.nickname, "Vault Boy");
    }
}
