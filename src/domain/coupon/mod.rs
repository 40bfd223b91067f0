//! Coupon and redemption domain.

mod code;

pub use code::{Coupon, Redemption};
