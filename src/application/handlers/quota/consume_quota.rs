//! ConsumeQuotaHandler - Atomic check-and-consume for metered resources.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::MembershipError;
use crate::domain::quota::QuotaCheck;
use crate::domain::tier::QuotaResource;
use crate::ports::{MembershipStore, TierCatalog, UnitOfWork};

/// Command to consume units of a metered resource.
#[derive(Debug, Clone)]
pub struct ConsumeQuotaCommand {
    pub membership_id: MembershipId,
    pub resource: QuotaResource,
    pub amount: u32,
}

/// Handler for quota consumption.
///
/// Allowances come from the tier the membership is on at consumption
/// time; the actual check-and-increment happens inside the unit of work
/// so two concurrent consumers of the last unit cannot both win.
pub struct ConsumeQuotaHandler {
    memberships: Arc<dyn MembershipStore>,
    tiers: Arc<dyn TierCatalog>,
    uow: Arc<dyn UnitOfWork>,
}

impl ConsumeQuotaHandler {
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

    pub async fn handle(&self, cmd: ConsumeQuotaCommand) -> Result<QuotaCheck, MembershipError> {
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

        let check = self
            .uow
            .consume_quota(
                &membership.id,
                cmd.resource,
                cmd.amount,
                &tier.quotas,
                Timestamp::now(),
            )
            .await?;

        tracing::info!(
            membership_id = %membership.id,
            resource = %cmd.resource,
            amount = cmd.amount,
            used = check.used,
            "quota consumed"
        );

        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{BillingCycle, Currency, Money, SubscriberId, TierId};
    use crate::domain::membership::Membership;
    use crate::domain::quota::QuotaLedger;
    use crate::domain::tier::{MembershipTier, QuotaAllowances};

    fn limited_tier() -> MembershipTier {
        MembershipTier {
            id: TierId::new(),
            name: "basic".to_string(),
            display_name: "Basic".to_string(),
            price: Money::from_cents(200_00, Currency::USD),
            billing_cycle: BillingCycle::Monthly,
            quotas: QuotaAllowances::unlimited().with_limit(QuotaResource::Consultations, 5),
            benefits: vec![],
            is_active: true,
        }
    }

    async fn membership_on(store: &Arc<InMemoryStore>, tier: &MembershipTier) -> Membership {
        let membership = Membership::create(
            MembershipId::new(),
            SubscriberId::new("sub-test-123").unwrap(),
            tier.id,
            tier.price,
            tier.billing_cycle,
            Timestamp::now(),
        );
        let ledger = QuotaLedger::open(
            membership.id,
            membership.start_date,
            membership.end_date.unwrap(),
            Timestamp::now(),
        );
        store.create_membership(&membership, &ledger).await.unwrap();
        membership
    }

    fn handler(store: &Arc<InMemoryStore>) -> ConsumeQuotaHandler {
        ConsumeQuotaHandler::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn consumes_up_to_the_limit() {
        let store = Arc::new(InMemoryStore::new());
        let tier = limited_tier();
        store.insert_tier(tier.clone()).await;
        let membership = membership_on(&store, &tier).await;
        let h = handler(&store);

        for expected_used in 1..=5u32 {
            let check = h
                .handle(ConsumeQuotaCommand {
                    membership_id: membership.id,
                    resource: QuotaResource::Consultations,
                    amount: 1,
                })
                .await
                .unwrap();
            assert_eq!(check.used, expected_used);
        }

        let result = h
            .handle(ConsumeQuotaCommand {
                membership_id: membership.id,
                resource: QuotaResource::Consultations,
                amount: 1,
            })
            .await;
        assert!(matches!(
            result,
            Err(MembershipError::QuotaExceeded {
                resource: QuotaResource::Consultations,
                limit: 5,
                used: 5,
            })
        ));
    }

    #[tokio::test]
    async fn over_limit_leaves_counter_unchanged() {
        let store = Arc::new(InMemoryStore::new());
        let tier = limited_tier();
        store.insert_tier(tier.clone()).await;
        let membership = membership_on(&store, &tier).await;
        let h = handler(&store);

        h.handle(ConsumeQuotaCommand {
            membership_id: membership.id,
            resource: QuotaResource::Consultations,
            amount: 4,
        })
        .await
        .unwrap();

        let result = h
            .handle(ConsumeQuotaCommand {
                membership_id: membership.id,
                resource: QuotaResource::Consultations,
                amount: 2,
            })
            .await;
        assert!(matches!(result, Err(MembershipError::QuotaExceeded { .. })));

        let ledgers = store.ledgers_for(&membership.id).await;
        assert_eq!(ledgers[0].usage.consultations, 4);
    }

    #[tokio::test]
    async fn rejects_zero_amount() {
        let store = Arc::new(InMemoryStore::new());
        let tier = limited_tier();
        store.insert_tier(tier.clone()).await;
        let membership = membership_on(&store, &tier).await;

        let result = handler(&store)
            .handle(ConsumeQuotaCommand {
                membership_id: membership.id,
                resource: QuotaResource::Consultations,
                amount: 0,
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::ValidationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn cancelled_membership_cannot_consume() {
        let store = Arc::new(InMemoryStore::new());
        let tier = limited_tier();
        store.insert_tier(tier.clone()).await;
        let mut membership = membership_on(&store, &tier).await;
        let entry = membership.cancel(Timestamp::now()).unwrap();
        store
            .commit_transition(&membership, &entry, None)
            .await
            .unwrap();

        let result = handler(&store)
            .handle(ConsumeQuotaCommand {
                membership_id: membership.id,
                resource: QuotaResource::Consultations,
                amount: 1,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn concurrent_consumers_of_last_unit_get_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let tier = limited_tier();
        store.insert_tier(tier.clone()).await;
        let membership = membership_on(&store, &tier).await;
        let h = handler(&store);

        h.handle(ConsumeQuotaCommand {
            membership_id: membership.id,
            resource: QuotaResource::Consultations,
            amount: 4,
        })
        .await
        .unwrap();

        let h = Arc::new(h);
        let mut tasks = Vec::new();
        for _ in 0..2 {
            let h = h.clone();
            let membership_id = membership.id;
            tasks.push(tokio::spawn(async move {
                h.handle(ConsumeQuotaCommand {
                    membership_id,
                    resource: QuotaResource::Consultations,
                    amount: 1,
                })
                .await
            }));
        }
        let mut successes = 0;
        let mut exceeded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(MembershipError::QuotaExceeded { .. }) => exceeded += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(exceeded, 1);

        let ledgers = store.ledgers_for(&membership.id).await;
        assert_eq!(ledgers[0].usage.consultations, 5);
    }
}
