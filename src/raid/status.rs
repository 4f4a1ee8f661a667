//! Raid assignment status and the operator action table.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RaidError;

/// Where a player stands for one raid slot.
///
/// The numeric codes are what gets persisted. Ordering of the codes carries no
/// meaning for transitions; see [`RaidStatus::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum RaidStatus {
    Unknown = -100,
    Rejected = -10,
    HasNotSeen = -5,
    Lefted = -4,
    Change = -3,
    Assigned = 0,
    Accepted = 10,
    OnPlace = 20,
    InProcess = 30,
    Confirmed = 35,
}

/// What a player (or leader on their behalf) can do with an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RaidAction {
    Accept,
    Reject,
}

impl RaidAction {
    pub fn target(self) -> RaidStatus {
        match self {
            Self::Accept => RaidStatus::Accepted,
            Self::Reject => RaidStatus::Rejected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl RaidStatus {
    pub const ALL: [RaidStatus; 10] = [
        Self::Unknown,
        Self::Rejected,
        Self::HasNotSeen,
        Self::Lefted,
        Self::Change,
        Self::Assigned,
        Self::Accepted,
        Self::OnPlace,
        Self::InProcess,
        Self::Confirmed,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Actions available from this status.
    pub fn actions(self) -> &'static [RaidAction] {
        match self {
            Self::Assigned => &[RaidAction::Accept, RaidAction::Reject],
            Self::Accepted => &[RaidAction::Reject],
            Self::Rejected => &[RaidAction::Accept],
            Self::Confirmed | Self::InProcess | Self::OnPlace | Self::Lefted => &[RaidAction::Reject],
            Self::Unknown | Self::HasNotSeen | Self::Change => &[],
        }
    }

    pub fn can_transition_to(self, target: RaidStatus) -> bool {
        self.actions().iter().any(|a| a.target() == target)
    }

    /// Status after `action`, or [`RaidError::InvalidTransition`].
    pub fn apply(self, action: RaidAction) -> Result<RaidStatus, RaidError> {
        if self.can_transition_to(action.target()) {
            Ok(action.target())
        } else {
            Err(RaidError::InvalidTransition { from: self, action })
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Rejected => "rejected",
            Self::HasNotSeen => "has not seen",
            Self::Lefted => "left",
            Self::Change => "changed",
            Self::Assigned => "assigned",
            Self::Accepted => "accepted",
            Self::OnPlace => "on place",
            Self::InProcess => "in process",
            Self::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for RaidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RaidStatus> for i32 {
    fn from(status: RaidStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for RaidStatus {
    type Error = RaidError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(RaidError::UnknownStatusCode(code))
    }
}
