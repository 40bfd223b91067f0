//! Coupon aggregate.
//!
//! A coupon grants a percentage discount on the membership price for one
//! billing charge. Codes are stored normalized to uppercase so lookup is
//! case-insensitive. Each membership may redeem a given coupon at most
//! once; that uniqueness is enforced by the redemption store, not here.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CouponId, MembershipId, Money, Percentage, RedemptionId, Timestamp, ValidationError,
};
use crate::domain::membership::MembershipError;

/// Percentage-discount coupon with a validity window and optional global
/// usage cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub discount: Percentage,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    /// `None` means no global cap.
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Coupon {
    /// Creates a new coupon, normalizing the code to uppercase.
    pub fn new(
        code: &str,
        discount: Percentage,
        valid_from: Timestamp,
        valid_until: Timestamp,
        usage_limit: Option<u32>,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let code = Self::normalize_code(code)?;
        if !valid_from.is_before(&valid_until) {
            return Err(ValidationError::invalid_format(
                "valid_until",
                "validity window must end after it starts",
            ));
        }
        Ok(Coupon {
            id: CouponId::new(),
            code,
            discount,
            valid_from,
            valid_until,
            usage_limit,
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Uppercases and trims a raw code. Rejects empty input.
    pub fn normalize_code(code: &str) -> Result<String, ValidationError> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("code"));
        }
        Ok(normalized)
    }

    /// Checks whether this coupon can be applied at `now`.
    ///
    /// Each failure mode maps to a distinct error so the caller can tell
    /// an inactive code from an exhausted or out-of-window one.
    pub fn validate_for(&self, now: Timestamp) -> Result<(), MembershipError> {
        if !self.is_active {
            return Err(MembershipError::invalid_coupon(
                self.code.clone(),
                "coupon is inactive",
            ));
        }
        if now.is_before(&self.valid_from) {
            return Err(MembershipError::invalid_coupon(
                self.code.clone(),
                "coupon is not yet valid",
            ));
        }
        if !now.is_before(&self.valid_until) {
            return Err(MembershipError::invalid_coupon(
                self.code.clone(),
                "coupon has expired",
            ));
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(MembershipError::coupon_exhausted(self.code.clone()));
            }
        }
        Ok(())
    }

    /// Discount amount for the given price, rounded half-up.
    pub fn discount_amount(&self, price: Money) -> Money {
        price.percentage_of(self.discount)
    }

    /// Records one redemption against the global counter.
    ///
    /// Callers must run [`Coupon::validate_for`] first; this saturates
    /// rather than re-checking the cap.
    pub fn mark_redeemed(&mut self, now: Timestamp) {
        self.used_count = self.used_count.saturating_add(1);
        self.updated_at = now;
    }
}

/// Record of one membership redeeming one coupon.
///
/// The pair `(membership_id, coupon_id)` is unique; inserting a duplicate
/// is the conflict that enforces single use per membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    pub id: RedemptionId,
    pub membership_id: MembershipId,
    pub coupon_id: CouponId,
    pub discount_applied: Money,
    pub redeemed_at: Timestamp,
}

impl Redemption {
    pub fn new(
        membership_id: MembershipId,
        coupon_id: CouponId,
        discount_applied: Money,
        redeemed_at: Timestamp,
    ) -> Self {
        Redemption {
            id: RedemptionId::new(),
            membership_id,
            coupon_id,
            discount_applied,
            redeemed_at,
        }
    }
}
