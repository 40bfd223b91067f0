//! Membership tier entity.
//!
//! Tiers are catalog data: read-mostly from the core's perspective, managed
//! through an external catalog-administration path.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BillingCycle, Money, TierId};

use super::QuotaAllowances;

/// A subscription tier: price, billing cycle, and quota allowances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipTier {
    /// Unique identifier for this tier.
    pub id: TierId,

    /// Stable machine name (e.g. "basic").
    pub name: String,

    /// Human-readable name (e.g. "Basic").
    pub display_name: String,

    /// Price per billing period.
    pub price: Money,

    /// Billing period length.
    pub billing_cycle: BillingCycle,

    /// Per-resource quota allowances. None entries mean unlimited.
    pub quotas: QuotaAllowances,

    /// Marketing benefit descriptions.
    pub benefits: Vec<String>,

    /// Whether new subscriptions to this tier are accepted.
    pub is_active: bool,
}

impl MembershipTier {
    /// Returns true if this tier can currently be subscribed to.
    pub fn is_subscribable(&self) -> bool {
        self.is_active
    }
}
