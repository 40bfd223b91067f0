//! Coupon handlers.

mod apply_coupon;

pub use apply_coupon::{ApplyCouponCommand, ApplyCouponHandler, ApplyCouponResult};
