//! CreateMembershipHandler - Command handler for starting a membership.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, SubscriberId, TierId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::domain::quota::QuotaLedger;
use crate::ports::{MembershipStore, TierCatalog, UnitOfWork};

/// Command to create a new membership.
#[derive(Debug, Clone)]
pub struct CreateMembershipCommand {
    pub subscriber_id: SubscriberId,
    pub tier_id: TierId,
    /// Defaults to now.
    pub start_date: Option<Timestamp>,
}

/// Result of successful membership creation.
#[derive(Debug, Clone)]
pub struct CreateMembershipResult {
    pub membership: Membership,
    pub ledger: QuotaLedger,
}

/// Handler for creating memberships.
///
/// A new membership starts Active on the chosen tier with one fully paid
/// billing period and a zeroed quota ledger covering it.
pub struct CreateMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
    tiers: Arc<dyn TierCatalog>,
    uow: Arc<dyn UnitOfWork>,
}

impl CreateMembershipHandler {
    pub fn new(
        memberships: Arc<dyn MembershipStore>,
        tiers: Arc<dyn TierCatalog>,
        uow: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            memberships,
            tiers,
            uow,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateMembershipCommand,
    ) -> Result<CreateMembershipResult, MembershipError> {
        // 1. Resolve the tier
        let tier = self
            .tiers
            .find_by_id(&cmd.tier_id)
            .await?
            .ok_or(MembershipError::TierNotFound(cmd.tier_id))?;
        if !tier.is_subscribable() {
            return Err(MembershipError::tier_not_subscribable(tier.id));
        }

        // 2. Reject a second live membership up front; the unit of work
        //    enforces the same rule under concurrency
        if let Some(existing) = self
            .memberships
            .find_by_subscriber_id(&cmd.subscriber_id)
            .await?
        {
            if existing.status.is_live() {
                return Err(MembershipError::already_exists(cmd.subscriber_id));
            }
        }

        // 3. Build the aggregate and its first ledger
        let now = Timestamp::now();
        let start_date = cmd.start_date.unwrap_or(now);
        let membership = Membership::create(
            MembershipId::new(),
            cmd.subscriber_id,
            tier.id,
            tier.price,
            tier.billing_cycle,
            start_date,
        );
        let period_end = membership
            .end_date
            .ok_or_else(|| MembershipError::infrastructure("new membership has no end date"))?;
        let ledger = QuotaLedger::open(membership.id, start_date, period_end, now);

        // 4. Persist both in one transaction
        self.uow.create_membership(&membership, &ledger).await?;

        tracing::info!(
            membership_id = %membership.id,
            subscriber_id = %membership.subscriber_id,
            tier = %tier.name,
            "membership created"
        );

        Ok(CreateMembershipResult { membership, ledger })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{BillingCycle, Currency, Money};
    use crate::domain::membership::MembershipStatus;
    use crate::domain::tier::{MembershipTier, QuotaAllowances, QuotaResource};

    fn basic_tier(active: bool) -> MembershipTier {
        MembershipTier {
            id: TierId::new(),
            name: "basic".to_string(),
            display_name: "Basic".to_string(),
            price: Money::from_cents(200_00, Currency::USD),
            billing_cycle: BillingCycle::Monthly,
            quotas: QuotaAllowances::unlimited().with_limit(QuotaResource::Consultations, 5),
            benefits: vec![],
            is_active: active,
        }
    }

    fn handler(store: &Arc<InMemoryStore>) -> CreateMembershipHandler {
        CreateMembershipHandler::new(store.clone(), store.clone(), store.clone())
    }

    fn subscriber() -> SubscriberId {
        SubscriberId::new("sub-test-123").unwrap()
    }

    #[tokio::test]
    async fn creates_active_membership_with_ledger() {
        let store = Arc::new(InMemoryStore::new());
        let tier = basic_tier(true);
        store.insert_tier(tier.clone()).await;

        let result = handler(&store)
            .handle(CreateMembershipCommand {
                subscriber_id: subscriber(),
                tier_id: tier.id,
                start_date: None,
            })
            .await
            .unwrap();

        assert_eq!(result.membership.status, MembershipStatus::Active);
        assert_eq!(result.membership.tier_id, tier.id);
        assert_eq!(result.membership.price, tier.price);
        assert!(result.membership.auto_renew);
        assert_eq!(result.ledger.membership_id, result.membership.id);
        assert_eq!(result.ledger.usage.consultations, 0);

        let ledgers = store.ledgers_for(&result.membership.id).await;
        assert_eq!(ledgers.len(), 1);
    }

    #[tokio::test]
    async fn fails_when_tier_not_found() {
        let store = Arc::new(InMemoryStore::new());

        let result = handler(&store)
            .handle(CreateMembershipCommand {
                subscriber_id: subscriber(),
                tier_id: TierId::new(),
                start_date: None,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::TierNotFound(_))));
    }

    #[tokio::test]
    async fn fails_when_tier_retired() {
        let store = Arc::new(InMemoryStore::new());
        let tier = basic_tier(false);
        store.insert_tier(tier.clone()).await;

        let result = handler(&store)
            .handle(CreateMembershipCommand {
                subscriber_id: subscriber(),
                tier_id: tier.id,
                start_date: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::TierNotSubscribable(_))
        ));
    }

    #[tokio::test]
    async fn fails_when_subscriber_already_has_live_membership() {
        let store = Arc::new(InMemoryStore::new());
        let tier = basic_tier(true);
        store.insert_tier(tier.clone()).await;
        let h = handler(&store);

        h.handle(CreateMembershipCommand {
            subscriber_id: subscriber(),
            tier_id: tier.id,
            start_date: None,
        })
        .await
        .unwrap();

        let result = h
            .handle(CreateMembershipCommand {
                subscriber_id: subscriber(),
                tier_id: tier.id,
                start_date: None,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn cancelled_membership_does_not_block_creation() {
        let store = Arc::new(InMemoryStore::new());
        let tier = basic_tier(true);
        store.insert_tier(tier.clone()).await;
        let h = handler(&store);

        let first = h
            .handle(CreateMembershipCommand {
                subscriber_id: subscriber(),
                tier_id: tier.id,
                start_date: None,
            })
            .await
            .unwrap();

        let mut cancelled = first.membership;
        let entry = cancelled.cancel(Timestamp::now()).unwrap();
        store
            .commit_transition(&cancelled, &entry, None)
            .await
            .unwrap();

        let result = h
            .handle(CreateMembershipCommand {
                subscriber_id: subscriber(),
                tier_id: tier.id,
                start_date: None,
            })
            .await;
        assert!(result.is_ok());
    }
}
