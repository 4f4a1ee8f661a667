//! /start and /help.

use crate::bot::AppState;
use crate::dispatch::{HandlerResult, InnerUpdate, Module, Registration, Route};
use crate::utils::html_escape;

use super::reply;

const HELP: &str = "<b>Commands</b>

<b>Players</b>
/me - your stats (private chat)
/stats_&lt;id&gt; - stats of a player
/raid - your next raid
/raidstat - confirmed raids this interval (/raidstat_1 for the previous one)

<b>Leaders</b>
/assign &lt;player_id&gt; &lt;km&gt; - assign a player to the next raid

<b>Admins</b>
/trigger &lt;text&gt; - reply to a message to make it the answer
/triggers - list triggers of this chat
/trrem_&lt;id&gt; - remove a trigger
/ban &lt;id&gt;, /unban &lt;id&gt;
/chat_on, /chat_off, /admin_chat

Forward your Pip-Boy profile from the game bot to register or update your stats.";

pub fn module() -> Module<AppState> {
    Module::new("start", 10)
        .on(Registration::new(Route::command("start"), "start", start))
        .on(Registration::new(Route::command("help"), "help", help))
}

async fn start(state: AppState, update: InnerUpdate) -> HandlerResult {
    let name = update
        .event()
        .sender
        .as_ref()
        .map(|s| html_escape(&s.first_name))
        .unwrap_or_default();
    let text = format!(
        "Hi, {name}! 👋\n\nI keep track of players, raids and chat triggers for the Wasteland.\nForward your Pip-Boy profile to get started, or see /help."
    );
    reply(&state, &update, text).await;
    Ok(())
}

async fn help(state: AppState, update: InnerUpdate) -> HandlerResult {
    reply(&state, &update, HELP).await;
    Ok(())
}
