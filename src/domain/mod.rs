//! Domain layer.
//!
//! Pure business logic with no I/O. Foundation types are shared value
//! objects; the membership, tier, quota, and coupon modules each own one
//! aggregate.

pub mod coupon;
pub mod foundation;
pub mod membership;
pub mod quota;
pub mod tier;
