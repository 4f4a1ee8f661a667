//! Raid assignments, player responses, reports and reminders.
//!
//! Callback payloads look like `raid:<action>:<slot key>`.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use tracing::info;

use crate::bot::AppState;
use crate::database::{AssignOutcome, RaidAssignment};
use crate::dispatch::filters;
use crate::dispatch::{HandlerResult, InnerUpdate, Module, Registration, Route};
use crate::messaging::{InlineButton, OutboundMessage};
use crate::permissions::Permissions;
use crate::raid::{RaidAction, RaidError, RaidSlot, RaidStatus};
use crate::utils::html_escape;

use super::reply;

const ASSIGN_USAGE: &str = "Usage: /assign &lt;player_id&gt; &lt;km&gt;";
const CALLBACK_PREFIX: &str = "raid:";

/// Reminders go out during the last hour before a raid.
const REMINDER_WINDOW_MINUTES: i64 = 60;

/// Dark-zone reminders go out once, 20 to 30 minutes before a raid.
const DARK_ZONE_WINDOW_MINUTES: (i64, i64) = (20, 30);

pub fn module(permissions: &Permissions) -> Module<AppState> {
    Module::new("raids", 10)
        .on(Registration::new(Route::command("assign"), "assign", assign)
            .filter(filters::group())
            .filter(filters::group_leader(permissions))
            .usage(ASSIGN_USAGE))
        .on(Registration::new(Route::command("raid"), "my_raid", my_raid)
            .filter(filters::from_player()))
        .on(Registration::new(Route::command_family("raidstat"), "raid_stat", raid_stat)
            .filter(filters::from_player()))
        .on(Registration::new(Route::callback(CALLBACK_PREFIX), "raid_action", raid_action)
            .filter(filters::from_player()))
        .job("raid_reminder", "0 */10 * * * *", raid_reminder)
        .job("dark_zone_reminder", "0 */10 * * * *", dark_zone_reminder)
}

fn callback_data(action: RaidAction, slot: RaidSlot) -> String {
    format!("{}{}:{}", CALLBACK_PREFIX, action.as_str(), slot.key())
}

fn parse_callback(data: &str) -> Option<(RaidAction, RaidSlot)> {
    let mut parts = data.strip_prefix(CALLBACK_PREFIX)?.split(':');
    let action = RaidAction::parse(parts.next()?)?;
    let slot = RaidSlot::from_key(parts.next()?.parse().ok()?)?;
    Some((action, slot))
}

/// One button per action available from `status`.
fn action_keyboard(slot: RaidSlot, status: RaidStatus) -> Vec<Vec<InlineButton>> {
    let row: Vec<InlineButton> = status
        .actions()
        .iter()
        .map(|action| {
            let label = match action {
                RaidAction::Accept => "✅ Accept",
                RaidAction::Reject => "❌ Reject",
            };
            InlineButton::callback(label, callback_data(*action, slot))
        })
        .collect();
    if row.is_empty() { Vec::new() } else { vec![row] }
}

fn distance_label(assignment: &RaidAssignment) -> String {
    assignment
        .assigned_distance
        .map_or_else(|| "?".to_string(), |km| format!("{km} km"))
}

fn assignment_text(slot: RaidSlot, assignment: &RaidAssignment) -> String {
    format!(
        "⚔️ Raid at <b>{}</b>\nDistance: <b>{}</b>\nStatus: {}",
        slot,
        distance_label(assignment),
        assignment.status
    )
}

async fn assign(state: AppState, update: InnerUpdate) -> HandlerResult {
    let mut args = update.argument().split_whitespace();
    let player_id = args.next().and_then(|a| a.parse::<i64>().ok());
    let distance = args.next().and_then(|a| a.parse::<i32>().ok());
    let (Some(player_id), Some(distance)) = (player_id, distance) else {
        reply(&state, &update, ASSIGN_USAGE).await;
        return Ok(());
    };

    let Some(player) = state.stores.players.player(player_id).await? else {
        reply(&state, &update, format!("Player #{player_id} not found.")).await;
        return Ok(());
    };

    let slot = state.raids.next_slot(update.event().timestamp);
    let outcome = state.raids.assign(slot, player.id, Some(distance)).await?;
    let nick = html_escape(&player.nickname);
    let text = match outcome {
        AssignOutcome::Created => format!("📌 {nick} assigned to {distance} km for the raid at {slot}."),
        AssignOutcome::Reassigned => format!("🔁 {nick} reassigned to {distance} km for the raid at {slot}."),
        AssignOutcome::Unchanged => format!("{nick} is already assigned to {distance} km for the raid at {slot}."),
    };
    reply(&state, &update, text).await;

    if outcome != AssignOutcome::Unchanged
        && let Some(assignment) = state.raids.assignment(slot, player.id).await?
    {
        let notice = OutboundMessage::text(player.telegram_id, assignment_text(slot, &assignment))
            .keyboard(action_keyboard(slot, assignment.status))
            .queued();
        state.messages.send(notice).await;
    }
    Ok(())
}

async fn my_raid(state: AppState, update: InnerUpdate) -> HandlerResult {
    let Some(player) = update.player() else {
        return Ok(());
    };
    let Some(chat_id) = update.reply_chat_id() else {
        return Ok(());
    };

    let slot = state.raids.next_slot(update.event().timestamp);
    let message = match state.raids.assignment(slot, player.id).await? {
        Some(assignment) => OutboundMessage::text(chat_id, assignment_text(slot, &assignment))
            .keyboard(action_keyboard(slot, assignment.status)),
        None => OutboundMessage::text(chat_id, format!("No assignment for the raid at {slot}.")),
    };
    state.messages.send(message.reply_to(update.event().message_id)).await;
    Ok(())
}

async fn raid_action(state: AppState, update: InnerUpdate) -> HandlerResult {
    let event = update.event();
    let (Some(callback_id), Some(player)) = (event.callback_id.as_deref(), update.player()) else {
        return Ok(());
    };

    let Some((action, slot)) = event.callback_data.as_deref().and_then(parse_callback) else {
        state.messages.answer_callback(callback_id, Some("Unknown action.")).await;
        return Ok(());
    };

    let answer = match state.raids.apply_action(slot, player.id, action).await {
        Ok(assignment) => format!("Raid {}: {}", slot, assignment.status),
        Err(RaidError::InvalidTransition { .. }) => "no such action available for current status".to_string(),
        Err(RaidError::NotAssigned { .. }) => "You are not assigned to this raid.".to_string(),
        Err(RaidError::Conflict) => "Status changed meanwhile, try again.".to_string(),
        Err(e) => return Err(e.into()),
    };
    state.messages.answer_callback(callback_id, Some(&answer)).await;
    Ok(())
}

async fn raid_stat(state: AppState, update: InnerUpdate) -> HandlerResult {
    let Some(player) = update.player() else {
        return Ok(());
    };
    let offset = update
        .command()
        .and_then(|c| c.subcommand_id())
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);

    let now = state.raids.clock().local(update.event().timestamp);
    let Some(interval) = state.raids.interval_by_date(now, offset).await? else {
        reply(&state, &update, "No reporting interval found.").await;
        return Ok(());
    };

    let assignments = state.raids.assignments_in(player.id, &interval).await?;
    let confirmed = assignments
        .iter()
        .filter(|a| a.status == RaidStatus::Confirmed)
        .count();

    let text = format!(
        "📊 {}, raids {} - {}: <b>{}</b> confirmed of {} assigned.",
        html_escape(&player.nickname),
        interval.start_date.format("%d.%m"),
        interval.last_date.format("%d.%m"),
        confirmed,
        assignments.len()
    );
    reply(&state, &update, text).await;
    Ok(())
}

async fn raid_reminder(state: AppState) -> HandlerResult {
    let now = state.raids.clock().now();
    send_reminders(&state, now).await?;
    Ok(())
}

async fn dark_zone_reminder(state: AppState) -> HandlerResult {
    let now = state.raids.clock().now();
    send_dark_zone_reminders(&state, now).await?;
    Ok(())
}

/// Remind players of the upcoming raid once. Returns how many were queued.
pub async fn send_reminders(state: &AppState, now: NaiveDateTime) -> Result<usize> {
    let slot = state.raids.clock().next_slot(now);
    if slot.at() - now > Duration::minutes(REMINDER_WINDOW_MINUTES) {
        return Ok(0);
    }

    let mut sent = 0;
    for assignment in state.raids.pending_reminders(slot).await? {
        let Some(player) = state.stores.players.player(assignment.player_id).await? else {
            continue;
        };
        if player.is_banned || !player.is_active {
            continue;
        }

        let text = format!("⏰ Raid soon!\n\n{}", assignment_text(slot, &assignment));
        let message = OutboundMessage::text(player.telegram_id, text)
            .keyboard(action_keyboard(slot, assignment.status))
            .queued();
        state.messages.send(message).await;
        state.raids.mark_reminded(slot, assignment.player_id).await?;
        sent += 1;
    }

    if sent > 0 {
        info!("Queued {} raid reminders for {}", sent, slot);
    }
    Ok(sent)
}

/// Warn players sent to a dark-zone distance. Returns how many were queued.
pub async fn send_dark_zone_reminders(state: &AppState, now: NaiveDateTime) -> Result<usize> {
    let distances = &state.config.dark_zone_distances;
    if distances.is_empty() {
        return Ok(0);
    }

    let slot = state.raids.clock().next_slot(now);
    let left = slot.at() - now;
    let (from, to) = DARK_ZONE_WINDOW_MINUTES;
    if left <= Duration::minutes(from) || left > Duration::minutes(to) {
        return Ok(0);
    }

    let mut sent = 0;
    for assignment in state.raids.dark_zone_assignments(slot, distances).await? {
        let Some(player) = state.stores.players.player(assignment.player_id).await? else {
            continue;
        };
        let text = format!(
            "☢️ Raid at {} goes to {} in the dark zone. Stock up before you leave.",
            slot,
            distance_label(&assignment)
        );
        state
            .messages
            .send(OutboundMessage::text(player.telegram_id, text).queued())
            .await;
        sent += 1;
    }

    if sent > 0 {
        info!("Queued {} dark-zone reminders for {}", sent, slot);
    }
    Ok(sent)
}
