//! Permission checks over a resolved envelope.

use std::sync::Arc;

use tracing::debug;

use crate::dispatch::InnerUpdate;

/// Role checks used by the permission filters.
///
/// Bot owners (from OWNER_IDS env) pass every check. Otherwise admin rights
/// and group leadership come from the invoker's player record.
#[derive(Clone, Debug, Default)]
pub struct Permissions {
    owner_ids: Arc<[i64]>,
}

impl Permissions {
    pub fn with_owners(owner_ids: Vec<i64>) -> Self {
        Self {
            owner_ids: owner_ids.into(),
        }
    }

    #[inline]
    pub fn is_bot_owner(&self, user_id: i64) -> bool {
        self.owner_ids.contains(&user_id)
    }

    pub fn owner_ids(&self) -> &[i64] {
        &self.owner_ids
    }

    /// Owner, or a player flagged as admin who is not banned.
    pub fn is_admin(&self, update: &InnerUpdate) -> bool {
        if let Some(invoker) = update.invoker()
            && self.is_bot_owner(invoker.user_id)
        {
            debug!("User {} is bot owner, granting admin", invoker.user_id);
            return true;
        }
        update
            .player()
            .is_some_and(|p| p.is_admin && !p.is_banned)
    }

    /// Admin, or a player leading at least one group.
    pub fn is_group_leader(&self, update: &InnerUpdate) -> bool {
        self.is_admin(update)
            || update
                .player()
                .is_some_and(|p| p.is_leader() && !p.is_banned)
    }

    /// Whether the invoker may act on player `target_player_id`.
    pub fn can_act_for(&self, update: &InnerUpdate, target_player_id: i64) -> bool {
        self.is_admin(update) || update.player().is_some_and(|p| p.id == target_player_id)
    }
}
