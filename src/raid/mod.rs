//! Raid cycle: slot arithmetic, assignment status machine and the service
//! that persists assignments.

mod interval;
mod service;
mod slot;
mod status;

use thiserror::Error;

pub use interval::interval_by_date;
pub use service::RaidService;
pub use slot::{BLACKOUT_HOUR, RaidClock, RaidSlot, SLOT_HOURS};
pub use status::{RaidAction, RaidStatus};

/// Failures of raid operations that callers react to.
#[derive(Debug, Error)]
pub enum RaidError {
    #[error("no such action available for current status ({action:?} from {from})")]
    InvalidTransition { from: RaidStatus, action: RaidAction },

    #[error("unknown raid status code {0}")]
    UnknownStatusCode(i32),

    #[error("player {player_id} has no assignment for raid {slot}")]
    NotAssigned { slot: RaidSlot, player_id: i64 },

    /// The stored status changed between read and write.
    #[error("assignment was changed concurrently, try again")]
    Conflict,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
