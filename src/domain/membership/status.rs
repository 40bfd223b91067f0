//! Membership status state machine.
//!
//! Defines all possible membership states and valid transitions
//! according to the subscription lifecycle. The four states are explicit;
//! there is no boolean-plus-end-date encoding anywhere in the crate.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Subscription in good standing. The only state in which quota may be
    /// consumed.
    Active,

    /// Temporarily suspended by the subscriber. Resumable.
    Paused,

    /// Ended by the subscriber. Reactivation starts a new period.
    Cancelled,

    /// Ended by the system because the period lapsed. Reactivation starts
    /// a new period.
    Expired,
}

impl MembershipStatus {
    /// Returns true if quota consumption is permitted in this state.
    pub fn can_consume(&self) -> bool {
        matches!(self, MembershipStatus::Active)
    }

    /// Returns true for non-terminal states. A subscriber may hold at most
    /// one live membership.
    pub fn is_live(&self) -> bool {
        matches!(self, MembershipStatus::Active | MembershipStatus::Paused)
    }

    /// Storage representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Paused => "paused",
            MembershipStatus::Cancelled => "cancelled",
            MembershipStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for MembershipStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MembershipStatus::*;
        matches!(
            (self, target),
            // From ACTIVE
            (Active, Active) // renewal / tier change
                | (Active, Paused)
                | (Active, Cancelled)
                | (Active, Expired)
            // From PAUSED
                | (Paused, Active) // resume
                | (Paused, Cancelled)
            // From CANCELLED
                | (Cancelled, Active) // reactivate
            // From EXPIRED
                | (Expired, Active) // reactivate
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MembershipStatus::*;
        match self {
            Active => vec![Active, Paused, Cancelled, Expired],
            Paused => vec![Active, Cancelled],
            Cancelled => vec![Active],
            Expired => vec![Active],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_can_renew_to_active() {
        assert_eq!(
            MembershipStatus::Active.transition_to(MembershipStatus::Active),
            Ok(MembershipStatus::Active)
        );
    }

    #[test]
    fn active_can_pause_cancel_expire() {
        let active = MembershipStatus::Active;
        assert!(active.can_transition_to(&MembershipStatus::Paused));
        assert!(active.can_transition_to(&MembershipStatus::Cancelled));
        assert!(active.can_transition_to(&MembershipStatus::Expired));
    }

    #[test]
    fn paused_can_resume_or_cancel() {
        let paused = MembershipStatus::Paused;
        assert!(paused.can_transition_to(&MembershipStatus::Active));
        assert!(paused.can_transition_to(&MembershipStatus::Cancelled));
        assert!(!paused.can_transition_to(&MembershipStatus::Expired));
    }

    #[test]
    fn cancelled_cannot_cancel_again() {
        assert!(!MembershipStatus::Cancelled.can_transition_to(&MembershipStatus::Cancelled));
    }

    #[test]
    fn cancelled_can_reactivate() {
        assert!(MembershipStatus::Cancelled.can_transition_to(&MembershipStatus::Active));
    }

    #[test]
    fn expired_can_reactivate_only() {
        let expired = MembershipStatus::Expired;
        assert_eq!(expired.valid_transitions(), vec![MembershipStatus::Active]);
    }

    #[test]
    fn paused_cannot_pause_again() {
        assert!(!MembershipStatus::Paused.can_transition_to(&MembershipStatus::Paused));
    }

    #[test]
    fn only_active_can_consume() {
        assert!(MembershipStatus::Active.can_consume());
        assert!(!MembershipStatus::Paused.can_consume());
        assert!(!MembershipStatus::Cancelled.can_consume());
        assert!(!MembershipStatus::Expired.can_consume());
    }

    #[test]
    fn no_state_is_terminal() {
        for status in [
            MembershipStatus::Active,
            MembershipStatus::Paused,
            MembershipStatus::Cancelled,
            MembershipStatus::Expired,
        ] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn valid_transitions_are_consistent_with_can_transition_to() {
        for status in [
            MembershipStatus::Active,
            MembershipStatus::Paused,
            MembershipStatus::Cancelled,
            MembershipStatus::Expired,
        ] {
            for target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    target
                );
            }
        }
    }
}
