//! Application layer - commands and their handlers.
//!
//! Orchestrates domain operations and coordinates between ports. Each
//! use case is one handler struct with a single `handle` method.

pub mod handlers;

pub use handlers::coupon::{ApplyCouponCommand, ApplyCouponHandler, ApplyCouponResult};
pub use handlers::membership::{
    CancelMembershipCommand, CancelMembershipHandler, CancelMembershipResult, ChangeTierCommand,
    ChangeTierHandler, ChangeTierResult, CreateMembershipCommand, CreateMembershipHandler,
    CreateMembershipResult, ExpireMembershipsCommand, ExpireMembershipsHandler,
    ExpireMembershipsResult, PauseMembershipCommand, PauseMembershipHandler,
    PauseMembershipResult, ReactivateMembershipCommand, ReactivateMembershipHandler,
    ReactivateMembershipResult, RenewMembershipCommand, RenewMembershipHandler,
    RenewMembershipResult, ResumeMembershipCommand, ResumeMembershipHandler,
    ResumeMembershipResult, TierChangeDirection,
};
pub use handlers::quota::{
    CheckQuotaCommand, CheckQuotaHandler, ConsumeQuotaCommand, ConsumeQuotaHandler,
};
