//! ApplyCouponHandler - Single-use coupon redemption against a membership.

use std::sync::Arc;

use crate::domain::coupon::{Coupon, Redemption};
use crate::domain::foundation::{MembershipId, Money, Timestamp};
use crate::domain::membership::{MembershipError, MembershipStatus};
use crate::ports::{MembershipStore, UnitOfWork};

/// Command to redeem a coupon code for a membership.
#[derive(Debug, Clone)]
pub struct ApplyCouponCommand {
    pub membership_id: MembershipId,
    /// Raw code as entered; matched case-insensitively.
    pub code: String,
}

/// Result of a successful redemption.
#[derive(Debug, Clone)]
pub struct ApplyCouponResult {
    pub redemption: Redemption,
    /// Current period price after the discount.
    pub discounted_price: Money,
}

/// Handler for coupon redemption.
///
/// Validity, the global cap, and the one-redemption-per-pair rule are
/// all enforced inside the unit of work under a row lock; this handler
/// only guards membership state and normalizes the code.
pub struct ApplyCouponHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl ApplyCouponHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: ApplyCouponCommand,
    ) -> Result<ApplyCouponResult, MembershipError> {
        let code = Coupon::normalize_code(&cmd.code)
            .map_err(|e| MembershipError::validation("code", e.to_string()))?;

        let membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;
        if membership.status != MembershipStatus::Active {
            return Err(MembershipError::invalid_state(
                membership.status.to_string(),
                "redeem a coupon for",
            ));
        }

        let redemption = self
            .uow
            .redeem_coupon(&membership.id, &code, Timestamp::now())
            .await?;

        let discounted_price = membership
            .price
            .diff(&redemption.discount_applied)
            .map_err(|e| MembershipError::infrastructure(e.to_string()))?;

        tracing::info!(
            membership_id = %membership.id,
            code = %code,
            discount_cents = redemption.discount_applied.amount_cents,
            "coupon redeemed"
        );

        Ok(ApplyCouponResult {
            redemption,
            discounted_price,
        })
    }
}
