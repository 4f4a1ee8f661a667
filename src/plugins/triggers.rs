//! Chat triggers: management commands and message matching.

use anyhow::Result;

use crate::bot::AppState;
use crate::database::Trigger;
use crate::dispatch::filters;
use crate::dispatch::{HandlerResult, InnerUpdate, Module, Registration, Resolve, Route, UpdateKind};
use crate::messaging::OutboundMessage;
use crate::permissions::Permissions;
use crate::utils::{Fillings, apply_fillings, html_escape, parse_tags};

use super::reply;

const TRIGGER_USAGE: &str = "Reply to the answer message with /trigger &lt;text&gt;.\n\
Tags: {exact} whole message, {case} case-sensitive, {admin} admins only, {pin} pin the answer, {reply} answer as a reply.";
const REMOVE_USAGE: &str = "Usage: /trrem_&lt;id&gt;";

pub fn module(permissions: &Permissions) -> Module<AppState> {
    let matcher = |kind, name| {
        Registration::new(Route::Kind(kind), name, match_triggers)
            .filter(filters::group())
            .filter(filters::active_chat())
            .resolve(&[Resolve::Invoker, Resolve::Player])
    };

    Module::new("triggers", 20)
        .on(Registration::new(Route::command("trigger"), "add_trigger", add_trigger)
            .filter(filters::group())
            .filter(filters::is_admin(permissions))
            .usage(TRIGGER_USAGE))
        .on(Registration::new(Route::command("triggers"), "list_triggers", list_triggers)
            .filter(filters::group()))
        .on(Registration::new(Route::command_family("trrem"), "remove_trigger", remove_trigger)
            .filter(filters::group())
            .filter(filters::is_admin(permissions)))
        .on(matcher(UpdateKind::Text, "match_text"))
        .on(matcher(UpdateKind::GameForward, "match_forward"))
        .on(matcher(UpdateKind::PipBoy, "match_profile"))
        .job("refresh_triggers", "0 */5 * * * *", refresh)
}

async fn refresh_index(state: &AppState) -> Result<usize> {
    state.triggers.refresh(state.stores.triggers.as_ref()).await
}

async fn refresh(state: AppState) -> HandlerResult {
    refresh_index(&state).await?;
    Ok(())
}

async fn add_trigger(state: AppState, update: InnerUpdate) -> HandlerResult {
    let event = update.event();
    let (Some(chat_id), Some(answer)) = (event.effective_chat_id(), event.reply_to.as_deref()) else {
        reply(&state, &update, TRIGGER_USAGE).await;
        return Ok(());
    };

    let (pattern, tags) = parse_tags(update.argument());
    let text = answer.text.clone().unwrap_or_default();
    if pattern.is_empty() || (text.is_empty() && answer.media.is_none()) {
        reply(&state, &update, TRIGGER_USAGE).await;
        return Ok(());
    }

    let trigger = Trigger {
        whole_message: tags.exact,
        ignore_case: !tags.case_sensitive,
        admin_only: tags.admin_only,
        pin_after_send: tags.pin,
        reply_inline: tags.reply,
        media: answer.media.clone(),
        created_by: event.effective_user_id().unwrap_or_default(),
        ..Trigger::new(chat_id, pattern, text)
    };
    let saved = state.stores.triggers.insert_trigger(trigger).await?;
    refresh_index(&state).await?;

    reply(
        &state,
        &update,
        format!("✅ Trigger #{} saved for <code>{}</code>.", saved.id, html_escape(&saved.pattern)),
    )
    .await;
    Ok(())
}

async fn list_triggers(state: AppState, update: InnerUpdate) -> HandlerResult {
    let Some(chat_id) = update.event().effective_chat_id() else {
        return Ok(());
    };
    let triggers = state.stores.triggers.triggers_for_chat(chat_id).await?;

    let text = if triggers.is_empty() {
        "No triggers in this chat.".to_string()
    } else {
        let lines: Vec<String> = triggers
            .iter()
            .map(|t| format!("#{}: <code>{}</code>", t.id, html_escape(&t.pattern)))
            .collect();
        format!("<b>Triggers</b>\n{}", lines.join("\n"))
    };
    reply(&state, &update, text).await;
    Ok(())
}

async fn remove_trigger(state: AppState, update: InnerUpdate) -> HandlerResult {
    let chat_id = update.event().effective_chat_id();
    let id = filters::command_target(&update);
    let (Some(chat_id), Some(id)) = (chat_id, id) else {
        reply(&state, &update, REMOVE_USAGE).await;
        return Ok(());
    };

    let text = if state.stores.triggers.delete_trigger(chat_id, id).await? {
        refresh_index(&state).await?;
        format!("🗑 Trigger #{id} removed.")
    } else {
        format!("Trigger #{id} not found.")
    };
    reply(&state, &update, text).await;
    Ok(())
}

/// Send the answer of every trigger of the chat matching the message.
async fn match_triggers(state: AppState, update: InnerUpdate) -> HandlerResult {
    let event = update.event();
    let (Some(chat_id), Some(text)) = (event.effective_chat_id(), event.text()) else {
        return Ok(());
    };

    let matched = state.triggers.matches(chat_id, text);
    if matched.is_empty() {
        return Ok(());
    }

    let chat_name = event
        .chat_title
        .as_deref()
        .or_else(|| update.chat().and_then(|c| c.title.as_deref()))
        .unwrap_or_default();
    let fillings = Fillings {
        sender: event.sender.as_ref(),
        chat_id,
        chat_name,
    };

    for compiled in matched {
        let trigger = &compiled.trigger;
        if trigger.admin_only && !state.permissions.is_admin(&update) {
            continue;
        }
        let reply_to = if trigger.reply_inline { event.message_id } else { None };
        let message = OutboundMessage::text(chat_id, apply_fillings(&trigger.answer, &fillings))
            .media(trigger.media.clone())
            .pinned(trigger.pin_after_send)
            .reply_to(reply_to);
        state.messages.send(message).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::database::{Chat, MediaKind, Trigger, TriggerMedia, TriggerStore};
    use crate::dispatch::{ChatKind, InboundEvent, Outcome, RepliedMessage, Sender, UpdateKind};
    use crate::messaging::Sent;
    use crate::plugins::testing::{GAME_BOT, OWNER, TestBot};

    const GROUP: i64 = -200;

    fn sender(id: i64, username: Option<&str>) -> Sender {
        Sender {
            id,
            username: username.map(String::from),
            first_name: "Rad".into(),
            last_name: Some("Roach".into()),
        }
    }

    fn group_message(from: Sender, text: &str) -> InboundEvent {
        InboundEvent::message(GROUP, ChatKind::Supergroup, from, text)
            .with_chat_title("Wasteland")
            .with_message_id(9)
    }

    fn active_group() -> Chat {
        let mut chat = Chat::new(GROUP, Some("Wasteland".into()));
        chat.is_active = true;
        chat
    }

    async fn with_triggers(triggers: Vec<Trigger>) -> TestBot {
        let bot = TestBot::new();
        bot.store.put_chat(active_group());
        for trigger in triggers {
            bot.store.insert_trigger(trigger).await.unwrap();
        }
        bot.state.triggers.refresh(bot.store.as_ref()).await.unwrap();
        bot
    }

    #[tokio::test]
    async fn forwarded_match_sends_once_per_trigger_with_fillings() {
        let mut second = Trigger::new(GROUP, "rad", "{mention} in {chat_name} ({user_id})");
        second.reply_inline = true;
        let bot = with_triggers(vec![
            Trigger::new(GROUP, "rad", "Hi {username}, {full_name}! {unknown_tag}"),
            second,
            Trigger::new(GROUP, "stims", "never"),
            Trigger::new(-1, "rad", "other chat"),
        ])
        .await;

        let event = group_message(sender(55, Some("roach")), "RAD storm incoming").forwarded_from(999);
        let report = bot.dispatch(event).await;
        assert_eq!(report.count("match_text", Outcome::Handled), 1);

        let sent = bot.messenger.messages();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "Hi @roach, Rad Roach! ");
        assert_eq!(sent[0].reply_to, None);
        assert_eq!(
            sent[1].text,
            "<a href=\"tg://user?id=55\">Rad</a> in Wasteland (55)"
        );
        assert_eq!(sent[1].reply_to, Some(9));
        assert!(sent.iter().all(|m| !m.text.contains('{')));
    }

    #[tokio::test]
    async fn inactive_chat_and_admin_only_are_respected() {
        let mut guarded = Trigger::new(GROUP, "loot", "admin loot");
        guarded.admin_only = true;
        let bot = with_triggers(vec![guarded]).await;

        bot.dispatch(group_message(sender(55, None), "loot")).await;
        assert!(bot.messenger.sent().is_empty());

        bot.dispatch(group_message(sender(OWNER, None), "loot")).await;
        assert_eq!(bot.messenger.texts(), vec!["admin loot".to_string()]);

        let mut chat = active_group();
        chat.is_active = false;
        bot.store.put_chat(chat);
        bot.dispatch(group_message(sender(OWNER, None), "loot")).await;
        assert_eq!(bot.messenger.texts().len(), 1);
    }

    #[tokio::test]
    async fn profile_forward_in_group_fires_triggers() {
        let bot = with_triggers(vec![Trigger::new(GROUP, "vault boy", "Welcome back, {first_name}")]).await;

        let profile = "👤Vault Boy\n├❤️Здоровье: 152/160\n├⚔️Урон: 120\n├🛡Броня: 34\n├💪Сила: 110";
        let event = group_message(sender(55, None), profile).forwarded_from(GAME_BOT);
        let report = bot.dispatch(event).await;

        assert_eq!(report.kind, UpdateKind::PipBoy);
        assert_eq!(report.count("match_profile", Outcome::Handled), 1);
        assert_eq!(bot.messenger.texts(), vec!["Welcome back, Rad".to_string()]);
        assert_eq!(report.count("pipboy", Outcome::Handled), 0);
    }

    #[tokio::test]
    async fn pin_and_media_are_carried() {
        let mut trigger = Trigger::new(GROUP, "map", "here");
        trigger.pin_after_send = true;
        trigger.media = Some(TriggerMedia {
            kind: MediaKind::Photo,
            file_id: "file".into(),
        });
        let bot = with_triggers(vec![trigger]).await;

        bot.dispatch(group_message(sender(55, None), "map?")).await;
        let sent = bot.messenger.messages();
        assert_eq!(sent[0].media.as_ref().map(|m| m.kind), Some(MediaKind::Photo));
        assert_eq!(bot.messenger.pins(), vec![(GROUP, 1)]);
    }

    #[tokio::test]
    async fn admin_adds_lists_and_removes_triggers() {
        let bot = with_triggers(Vec::new()).await;
        let answer = RepliedMessage {
            message_id: 3,
            text: Some("Stay out of the crater".into()),
            media: None,
        };

        let add = group_message(sender(OWNER, None), "/trigger {exact}{pin} crater").replying_to(answer.clone());
        let report = bot.dispatch(add).await;
        assert_eq!(report.count("add_trigger", Outcome::Handled), 1);

        let stored = bot.store.triggers_for_chat(GROUP).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].pattern, "crater");
        assert!(stored[0].whole_message && stored[0].pin_after_send);
        assert_eq!(bot.state.triggers.matches(GROUP, "Crater").len(), 1);

        let report = bot
            .dispatch(group_message(sender(55, None), "/trigger x").replying_to(answer))
            .await;
        assert_eq!(report.count("add_trigger", Outcome::Denied), 1);

        bot.dispatch(group_message(sender(55, None), "/triggers")).await;
        assert!(bot.messenger.texts().last().unwrap().contains("#1: <code>crater</code>"));

        bot.dispatch(group_message(sender(OWNER, None), "/trrem_1")).await;
        assert!(bot.state.triggers.is_empty());
        assert!(bot.store.triggers_for_chat(GROUP).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_without_reply_sends_usage() {
        let bot = with_triggers(Vec::new()).await;
        bot.dispatch(group_message(sender(OWNER, None), "/trigger crater")).await;
        let sent = bot.messenger.sent();
        assert!(matches!(&sent[0], Sent::Message(m) if m.text.starts_with("Reply to the answer message")));
    }
}
