//! Admin commands: player bans and chat switches.

use crate::bot::AppState;
use crate::database::{Chat, ChatFlag};
use crate::dispatch::filters::{self, command_target};
use crate::dispatch::{HandlerResult, InnerUpdate, Module, Or, Registration, Resolve, Route};
use crate::permissions::Permissions;
use crate::utils::html_escape;

use super::reply;

pub fn module(permissions: &Permissions) -> Module<AppState> {
    // Bans are issued in private or from the admin chat.
    let ban_place = || Or::new(vec![filters::private(), filters::admin_chat()]);

    Module::new("admin", 10)
        .on(Registration::new(Route::command("ban"), "ban", ban)
            .filter(ban_place())
            .filter(filters::is_admin(permissions))
            .usage("Usage: /ban &lt;player_id&gt;"))
        .on(Registration::new(Route::command("unban"), "unban", unban)
            .filter(ban_place())
            .filter(filters::is_admin(permissions))
            .usage("Usage: /unban &lt;player_id&gt;"))
        .on(Registration::new(Route::command("chat_on"), "chat_on", chat_on)
            .filter(filters::group())
            .filter(filters::is_admin(permissions)))
        .on(Registration::new(Route::command("chat_off"), "chat_off", chat_off)
            .filter(filters::group())
            .filter(filters::is_admin(permissions)))
        .on(Registration::new(Route::command("admin_chat"), "admin_chat", admin_chat)
            .filter(filters::group())
            .filter(filters::is_admin(permissions))
            .resolve(&[Resolve::Chat]))
}

async fn ban(state: AppState, update: InnerUpdate) -> HandlerResult {
    set_banned(state, update, true).await
}

async fn unban(state: AppState, update: InnerUpdate) -> HandlerResult {
    set_banned(state, update, false).await
}

async fn set_banned(state: AppState, update: InnerUpdate, banned: bool) -> HandlerResult {
    let Some(player_id) = command_target(&update) else {
        reply(&state, &update, "Player id must be a number.").await;
        return Ok(());
    };
    let Some(player) = state.stores.players.set_banned(player_id, banned).await? else {
        reply(&state, &update, format!("Player #{player_id} not found.")).await;
        return Ok(());
    };

    let verb = if banned { "banned" } else { "unbanned" };
    reply(
        &state,
        &update,
        format!("🔨 {} #{} {}.", html_escape(&player.nickname), player.id, verb),
    )
    .await;
    Ok(())
}

/// Set one switch of the current chat.
async fn set_flag(
    state: &AppState,
    update: &InnerUpdate,
    flag: ChatFlag,
    value: bool,
) -> anyhow::Result<Option<Chat>> {
    let Some(chat_id) = update.event().effective_chat_id() else {
        return Ok(None);
    };
    let chat = state.stores.chats.set_chat_flag(chat_id, flag, value).await?;
    Ok(Some(chat))
}

async fn chat_on(state: AppState, update: InnerUpdate) -> HandlerResult {
    if set_flag(&state, &update, ChatFlag::Active, true).await?.is_some() {
        reply(&state, &update, "✅ Bot features enabled in this chat.").await;
    }
    Ok(())
}

async fn chat_off(state: AppState, update: InnerUpdate) -> HandlerResult {
    if set_flag(&state, &update, ChatFlag::Active, false).await?.is_some() {
        reply(&state, &update, "⏸ Bot features disabled in this chat.").await;
    }
    Ok(())
}

async fn admin_chat(state: AppState, update: InnerUpdate) -> HandlerResult {
    let enable = !update.chat().is_some_and(|c| c.is_admin_chat);
    if let Some(chat) = set_flag(&state, &update, ChatFlag::AdminChat, enable).await? {
        let text = if chat.is_admin_chat {
            "🛡 This is now an admin chat."
        } else {
            "This is no longer an admin chat."
        };
        reply(&state, &update, text).await;
    }
    Ok(())
}
