//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the membership domain.

mod billing_cycle;
mod errors;
mod ids;
mod money;
mod percentage;
mod state_machine;
mod timestamp;

pub use billing_cycle::BillingCycle;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    ActorId, ChangeLogId, CouponId, LedgerId, MembershipId, RedemptionId, SubscriberId, TierId,
};
pub use money::{Currency, Money};
pub use percentage::Percentage;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
