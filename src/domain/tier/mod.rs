//! Tier catalog domain module.
//!
//! # Module Structure
//!
//! - `catalog` - MembershipTier catalog entity
//! - `quota` - QuotaResource enumeration and per-tier allowances

mod catalog;
mod quota;

pub use catalog::MembershipTier;
pub use quota::{QuotaAllowances, QuotaResource};
