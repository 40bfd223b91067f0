//! Membership lifecycle domain.
//!
//! The [`Membership`] aggregate owns all state transitions; every tier or
//! state change emits a [`ChangeLogEntry`] for the append-only history.

mod aggregate;
mod change_log;
mod errors;
mod status;

pub use aggregate::Membership;
pub use change_log::{ChangeLogEntry, ChangeReason};
pub use errors::MembershipError;
pub use status::MembershipStatus;
