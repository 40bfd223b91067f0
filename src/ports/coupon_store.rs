//! Coupon store port.
//!
//! Lookup is by normalized code; the global used count only moves inside
//! the unit of work.

use crate::domain::foundation::{CouponId, DomainError, MembershipId};
use crate::domain::coupon::{Coupon, Redemption};
use async_trait::async_trait;

/// Store port for coupons.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Save a new coupon.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate code
    async fn save(&self, coupon: &Coupon) -> Result<(), DomainError>;

    /// Find a coupon by its ID.
    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, DomainError>;

    /// Find a coupon by its normalized code.
    ///
    /// Callers pass the code through [`Coupon::normalize_code`] first.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError>;
}

/// Store port for coupon redemptions.
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    /// Find the redemption of a coupon by a membership, if any.
    async fn find(
        &self,
        membership_id: &MembershipId,
        coupon_id: &CouponId,
    ) -> Result<Option<Redemption>, DomainError>;

    /// List all redemptions by a membership.
    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<Redemption>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupon_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn CouponStore) {}
    }

    #[test]
    fn redemption_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn RedemptionStore) {}
    }
}
