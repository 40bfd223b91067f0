//! Membership lifecycle handlers.
//!
//! One command handler per lifecycle operation:
//! - Create, cancel, renew
//! - Pause and resume
//! - Reactivate after cancellation or expiry
//! - Tier changes with proration
//! - The batch expiration sweep

mod cancel_membership;
mod change_tier;
mod create_membership;
mod expire_memberships;
mod pause_membership;
mod reactivate_membership;
mod renew_membership;
mod resume_membership;

pub use cancel_membership::{
    CancelMembershipCommand, CancelMembershipHandler, CancelMembershipResult,
};
pub use change_tier::{ChangeTierCommand, ChangeTierHandler, ChangeTierResult, TierChangeDirection};
pub use create_membership::{
    CreateMembershipCommand, CreateMembershipHandler, CreateMembershipResult,
};
pub use expire_memberships::{
    ExpireMembershipsCommand, ExpireMembershipsHandler, ExpireMembershipsResult,
};
pub use pause_membership::{PauseMembershipCommand, PauseMembershipHandler, PauseMembershipResult};
pub use reactivate_membership::{
    ReactivateMembershipCommand, ReactivateMembershipHandler, ReactivateMembershipResult,
};
pub use renew_membership::{RenewMembershipCommand, RenewMembershipHandler, RenewMembershipResult};
pub use resume_membership::{
    ResumeMembershipCommand, ResumeMembershipHandler, ResumeMembershipResult,
};
