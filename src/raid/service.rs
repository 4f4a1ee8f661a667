//! Raid assignment operations on top of a [`RaidStore`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use super::{RaidAction, RaidClock, RaidError, RaidSlot, RaidStatus, interval_by_date};
use crate::database::{AssignOutcome, RaidAssignment, RaidStore, RaidsInterval};

/// Statuses that still get a reminder before the raid.
const REMINDABLE: [RaidStatus; 2] = [RaidStatus::Assigned, RaidStatus::Accepted];

#[derive(Clone)]
pub struct RaidService {
    store: Arc<dyn RaidStore>,
    clock: RaidClock,
}

impl RaidService {
    pub fn new(store: Arc<dyn RaidStore>, clock: RaidClock) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &RaidClock {
        &self.clock
    }

    /// Next raid after the instant `at`.
    pub fn next_slot(&self, at: DateTime<Utc>) -> RaidSlot {
        self.clock.next_slot(self.clock.local(at))
    }

    /// Most recent raid before the instant `at`.
    pub fn last_slot(&self, at: DateTime<Utc>) -> RaidSlot {
        self.clock.last_slot(self.clock.local(at))
    }

    /// Assign `player_id` to `slot` with a fresh [`RaidStatus::Assigned`].
    pub async fn assign(
        &self,
        slot: RaidSlot,
        player_id: i64,
        distance: Option<i32>,
    ) -> Result<AssignOutcome, RaidError> {
        self.assign_with_status(slot, player_id, distance, RaidStatus::Assigned)
            .await
    }

    /// Idempotent upsert: an unchanged distance keeps the stored status,
    /// otherwise the status is reset to `default_status`.
    pub async fn assign_with_status(
        &self,
        slot: RaidSlot,
        player_id: i64,
        distance: Option<i32>,
        default_status: RaidStatus,
    ) -> Result<AssignOutcome, RaidError> {
        let outcome = self
            .store
            .upsert_assignment(slot, player_id, distance, default_status, Utc::now().timestamp())
            .await?;
        debug!("Assignment {} for player {}: {:?}", slot, player_id, outcome);
        Ok(outcome)
    }

    pub async fn assignment(
        &self,
        slot: RaidSlot,
        player_id: i64,
    ) -> Result<Option<RaidAssignment>, RaidError> {
        Ok(self.store.assignment(slot, player_id).await?)
    }

    /// Apply an operator action, persisting with compare-and-set on the
    /// status that was read.
    pub async fn apply_action(
        &self,
        slot: RaidSlot,
        player_id: i64,
        action: RaidAction,
    ) -> Result<RaidAssignment, RaidError> {
        let current = self
            .store
            .assignment(slot, player_id)
            .await?
            .ok_or(RaidError::NotAssigned { slot, player_id })?;

        let target = current.status.apply(action)?;
        let now = Utc::now().timestamp();

        if !self
            .store
            .compare_and_set_status(slot, player_id, current.status, target, now)
            .await?
        {
            return Err(RaidError::Conflict);
        }

        debug!("Raid {} player {}: {} -> {}", slot, player_id, current.status, target);
        Ok(RaidAssignment {
            status: target,
            last_update: now,
            ..current
        })
    }

    /// Assignments that still need a reminder for `slot`.
    pub async fn pending_reminders(&self, slot: RaidSlot) -> Result<Vec<RaidAssignment>, RaidError> {
        let assignments = self.store.assignments_for_slot(slot).await?;
        Ok(assignments
            .into_iter()
            .filter(|a| !a.is_reported && REMINDABLE.contains(&a.status))
            .collect())
    }

    pub async fn mark_reminded(&self, slot: RaidSlot, player_id: i64) -> Result<(), RaidError> {
        Ok(self.store.mark_reported(slot, player_id).await?)
    }

    /// Active assignments for `slot` sent to one of the `distances`.
    pub async fn dark_zone_assignments(
        &self,
        slot: RaidSlot,
        distances: &[i32],
    ) -> Result<Vec<RaidAssignment>, RaidError> {
        let assignments = self.store.assignments_for_slot(slot).await?;
        Ok(assignments
            .into_iter()
            .filter(|a| REMINDABLE.contains(&a.status))
            .filter(|a| a.assigned_distance.is_some_and(|d| distances.contains(&d)))
            .collect())
    }

    pub async fn interval_by_date(
        &self,
        date: NaiveDateTime,
        offset: usize,
    ) -> Result<Option<RaidsInterval>, RaidError> {
        let intervals = self.store.intervals().await?;
        Ok(interval_by_date(&intervals, date, offset).cloned())
    }

    /// Assignments of a player whose slot falls into `interval`.
    pub async fn assignments_in(
        &self,
        player_id: i64,
        interval: &RaidsInterval,
    ) -> Result<Vec<RaidAssignment>, RaidError> {
        Ok(self
            .store
            .assignments_for_player(
                player_id,
                RaidSlot::new(interval.start_date),
                RaidSlot::new(interval.last_date),
            )
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use chrono::NaiveDate;

    fn slot(hour: u32) -> RaidSlot {
        RaidSlot::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap())
    }

    fn service() -> (Arc<MemoryStore>, RaidService) {
        let store = Arc::new(MemoryStore::new());
        let service = RaidService::new(store.clone(), RaidClock::default());
        (store, service)
    }

    #[tokio::test]
    async fn reassigning_same_distance_keeps_status() {
        let (_, raids) = service();
        assert_eq!(raids.assign(slot(8), 1, Some(24)).await.unwrap(), AssignOutcome::Created);
        raids.apply_action(slot(8), 1, RaidAction::Accept).await.unwrap();

        assert_eq!(raids.assign(slot(8), 1, Some(24)).await.unwrap(), AssignOutcome::Unchanged);
        let stored = raids.assignment(slot(8), 1).await.unwrap().unwrap();
        assert_eq!(stored.status, RaidStatus::Accepted);
    }

    #[tokio::test]
    async fn new_distance_resets_status_to_default() {
        let (_, raids) = service();
        raids.assign(slot(8), 1, Some(24)).await.unwrap();
        raids.apply_action(slot(8), 1, RaidAction::Accept).await.unwrap();

        let outcome = raids
            .assign_with_status(slot(8), 1, Some(32), RaidStatus::Change)
            .await
            .unwrap();
        assert_eq!(outcome, AssignOutcome::Reassigned);
        let stored = raids.assignment(slot(8), 1).await.unwrap().unwrap();
        assert_eq!(stored.status, RaidStatus::Change);
        assert_eq!(stored.assigned_distance, Some(32));
    }

    #[tokio::test]
    async fn invalid_action_is_reported() {
        let (_, raids) = service();
        raids
            .assign_with_status(slot(16), 2, Some(5), RaidStatus::Confirmed)
            .await
            .unwrap();
        let err = raids
            .apply_action(slot(16), 2, RaidAction::Accept)
            .await
            .unwrap_err();
        assert!(matches!(err, RaidError::InvalidTransition { .. }));

        let rejected = raids.apply_action(slot(16), 2, RaidAction::Reject).await.unwrap();
        assert_eq!(rejected.status, RaidStatus::Rejected);
    }

    #[tokio::test]
    async fn action_without_assignment_fails() {
        let (_, raids) = service();
        let err = raids.apply_action(slot(0), 9, RaidAction::Accept).await.unwrap_err();
        assert!(matches!(err, RaidError::NotAssigned { player_id: 9, .. }));
    }

    #[tokio::test]
    async fn reminders_skip_reported_and_rejected() {
        let (_, raids) = service();
        raids.assign(slot(8), 1, Some(10)).await.unwrap();
        raids.assign(slot(8), 2, Some(20)).await.unwrap();
        raids.assign(slot(8), 3, Some(30)).await.unwrap();
        raids.apply_action(slot(8), 2, RaidAction::Reject).await.unwrap();
        raids.mark_reminded(slot(8), 3).await.unwrap();

        let due: Vec<i64> = raids
            .pending_reminders(slot(8))
            .await
            .unwrap()
            .iter()
            .map(|a| a.player_id)
            .collect();
        assert_eq!(due, vec![1]);

        let dark: Vec<i64> = raids
            .dark_zone_assignments(slot(8), &[20, 30])
            .await
            .unwrap()
            .iter()
            .map(|a| a.player_id)
            .collect();
        assert_eq!(dark, vec![3]);
    }

    #[tokio::test]
    async fn interval_lookup_goes_through_store() {
        let (store, raids) = service();
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
        store.add_interval(RaidsInterval { id: 1, start_date: day(1), last_date: day(7) });
        store.add_interval(RaidsInterval { id: 2, start_date: day(8), last_date: day(14) });

        let current = raids.interval_by_date(day(9), 0).await.unwrap().unwrap();
        assert_eq!(current.id, 2);
        let previous = raids.interval_by_date(day(9), 1).await.unwrap().unwrap();
        assert_eq!(previous.id, 1);

        raids.assign_with_status(slot(8), 4, Some(5), RaidStatus::Confirmed).await.unwrap();
        assert_eq!(raids.assignments_in(4, &previous).await.unwrap().len(), 1);
        assert!(raids.assignments_in(4, &current).await.unwrap().is_empty());
    }
}
