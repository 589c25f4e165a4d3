//! Task lifecycle status, per-responder fulfilment status and accept decisions.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been persisted and is waiting for the responder search.
    Creating,
    /// The responder search failed; no retry is attempted.
    SearchResponderFailed,
    /// The responder search found no candidates.
    SearchResponderNone,
    /// Candidates were notified and the task waits for acceptances.
    WaitingAccept,
    /// At least one responder accepted; the requester may choose.
    WaitingChoose,
    /// Chosen responders are working on the task.
    Processing,
    /// Every chosen responder finished the task.
    Fulfilled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::SearchResponderFailed => "search_responder_failed",
            Self::SearchResponderNone => "search_responder_none",
            Self::WaitingAccept => "waiting_accept",
            Self::WaitingChoose => "waiting_choose",
            Self::Processing => "processing",
            Self::Fulfilled => "fulfilled",
        }
    }

    /// Returns whether the lifecycle permits moving from `self` to `target`.
    ///
    /// `WaitingChoose` and `Processing` may re-enter themselves: further
    /// acceptances and partial fulfilment keep the task where it is.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Creating,
                Self::SearchResponderFailed | Self::SearchResponderNone | Self::WaitingAccept
            ) | (Self::WaitingAccept | Self::WaitingChoose, Self::WaitingChoose)
                | (Self::WaitingChoose | Self::Processing, Self::Processing)
                | (Self::Processing, Self::Fulfilled)
        )
    }

    /// Returns whether no further transition can leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::SearchResponderFailed | Self::SearchResponderNone | Self::Fulfilled
        )
    }

    /// Returns whether chosen responders are visible in query views.
    #[must_use]
    pub const fn exposes_chosen_responders(self) -> bool {
        matches!(self, Self::Processing | Self::Fulfilled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "creating" => Ok(Self::Creating),
            "search_responder_failed" => Ok(Self::SearchResponderFailed),
            "search_responder_none" => Ok(Self::SearchResponderNone),
            "waiting_accept" => Ok(Self::WaitingAccept),
            "waiting_choose" => Ok(Self::WaitingChoose),
            "processing" => Ok(Self::Processing),
            "fulfilled" => Ok(Self::Fulfilled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Completion flag of one chosen responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfilStatus {
    /// The responder is still working.
    Doing,
    /// The responder reported completion.
    Finished,
}

/// A responder's answer to a task notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The responder wants to be considered for the task.
    Accept,
    /// The responder is not interested in the task.
    Decline,
}
