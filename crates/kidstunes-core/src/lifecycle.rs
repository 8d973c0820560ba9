// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request lifecycle FSM shared by the approval gate and the download runner.
//!
//! ```text
//! pending ──► approved ──► downloading ──► complete
//!    │            ▲              │
//!    ▼            └── failed ◄───┘
//! rejected
//! ```
//!
//! `failed -> approved` is the only back-edge and is taken by an explicit,
//! authorized retry. Any other pair is not a transition; callers treat an
//! attempt as a no-op rather than an error.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// States a request moves through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for a moderator decision.
    Pending,
    /// Accepted by a moderator; the download job has not started yet.
    Approved,
    /// Declined by a moderator.
    Rejected,
    /// The download job owns the record.
    Downloading,
    /// The file is in the library.
    Complete,
    /// The download attempt failed; may be re-armed by a retry.
    Failed,
}

/// Every valid edge of the lifecycle graph.
pub const TRANSITIONS: [(RequestStatus, RequestStatus); 6] = [
    (RequestStatus::Pending, RequestStatus::Approved),
    (RequestStatus::Pending, RequestStatus::Rejected),
    (RequestStatus::Approved, RequestStatus::Downloading),
    (RequestStatus::Downloading, RequestStatus::Complete),
    (RequestStatus::Downloading, RequestStatus::Failed),
    (RequestStatus::Failed, RequestStatus::Approved),
];

/// All states, in declaration order.
pub const ALL_STATUSES: [RequestStatus; 6] = [
    RequestStatus::Pending,
    RequestStatus::Approved,
    RequestStatus::Rejected,
    RequestStatus::Downloading,
    RequestStatus::Complete,
    RequestStatus::Failed,
];

impl RequestStatus {
    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        TRANSITIONS.contains(&(self, next))
    }

    /// Terminal states never change again. `failed` is excluded because a retry
    /// may re-arm it.
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Complete)
    }

    /// Whether a moderator signal can still act on a record in this state.
    pub fn awaits_decision(self) -> bool {
        self == RequestStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exactly_six_edges_are_valid() {
        let valid = ALL_STATUSES
            .iter()
            .flat_map(|from| ALL_STATUSES.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(valid, 6);
    }

    #[test]
    fn pending_cannot_jump_to_downloading() {
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Downloading));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Complete));
    }

    #[test]
    fn retry_is_the_only_back_edge() {
        assert!(RequestStatus::Failed.can_transition_to(RequestStatus::Approved));
        assert!(!RequestStatus::Complete.can_transition_to(RequestStatus::Approved));
        assert!(!RequestStatus::Rejected.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Downloading.can_transition_to(RequestStatus::Approved));
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for status in ALL_STATUSES.iter().filter(|s| s.is_terminal()) {
            assert!(ALL_STATUSES.iter().all(|next| !status.can_transition_to(*next)));
        }
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in ALL_STATUSES {
            let text = status.to_string();
            assert_eq!(text, text.to_lowercase());
            assert_eq!(RequestStatus::from_str(&text).unwrap(), status);
        }
    }

    fn any_status() -> impl Strategy<Value = RequestStatus> {
        prop::sample::select(ALL_STATUSES.to_vec())
    }

    proptest! {
        #[test]
        fn walks_never_leave_the_graph(steps in prop::collection::vec(any_status(), 0..32)) {
            let mut current = RequestStatus::Pending;
            for next in steps {
                if current.can_transition_to(next) {
                    prop_assert!(TRANSITIONS.contains(&(current, next)));
                    current = next;
                }
            }
            prop_assert!(ALL_STATUSES.contains(&current));
        }
    }
}
