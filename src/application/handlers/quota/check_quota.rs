//! CheckQuotaHandler - Read-only quota standing for one resource.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::MembershipError;
use crate::domain::quota::QuotaCheck;
use crate::domain::tier::QuotaResource;
use crate::ports::{MembershipStore, QuotaLedgerStore, TierCatalog};

/// Query for a membership's standing on one quota resource.
#[derive(Debug, Clone)]
pub struct CheckQuotaCommand {
    pub membership_id: MembershipId,
    pub resource: QuotaResource,
}

/// Handler for quota standing queries.
///
/// Pure read: reports used/limit/remaining against the tier the
/// membership is on right now. Never mutates the ledger.
pub struct CheckQuotaHandler {
    memberships: Arc<dyn MembershipStore>,
    tiers: Arc<dyn TierCatalog>,
    ledgers: Arc<dyn QuotaLedgerStore>,
}

impl CheckQuotaHandler {
    pub fn new(
        memberships: Arc<dyn MembershipStore>,
        tiers: Arc<dyn TierCatalog>,
        ledgers: Arc<dyn QuotaLedgerStore>,
    ) -> Self {
        Self {
            memberships,
            tiers,
            ledgers,
        }
    }

    pub async fn handle(&self, cmd: CheckQuotaCommand) -> Result<QuotaCheck, MembershipError> {
        let membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;
        let tier = self
            .tiers
            .find_by_id(&membership.tier_id)
            .await?
            .ok_or(MembershipError::TierNotFound(membership.tier_id))?;
        // Ledgers open lazily on first consumption, so a missing period
        // simply means nothing has been used yet
        let standing = match self
            .ledgers
            .find_current(&membership.id, Timestamp::now())
            .await?
        {
            Some(ledger) => ledger.check(cmd.resource, &tier.quotas),
            None => QuotaCheck {
                resource: cmd.resource,
                used: 0,
                limit: tier.quotas.limit_for(cmd.resource),
                remaining: tier.quotas.limit_for(cmd.resource),
            },
        };

        Ok(standing)
    }
}
