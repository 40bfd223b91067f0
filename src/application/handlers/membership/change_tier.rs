//! ChangeTierHandler - Command handler for moving a membership between tiers.

use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::{ActorId, MembershipId, Money, TierId, Timestamp};
use crate::domain::membership::{ChangeLogEntry, ChangeReason, Membership, MembershipError};
use crate::ports::{MembershipStore, TierCatalog, UnitOfWork};

/// Which way a tier change moves, judged by price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChangeDirection {
    Upgrade,
    Downgrade,
}

impl TierChangeDirection {
    fn as_str(&self) -> &'static str {
        match self {
            TierChangeDirection::Upgrade => "upgrade",
            TierChangeDirection::Downgrade => "downgrade",
        }
    }
}

/// Command to change a membership's tier, effective immediately.
#[derive(Debug, Clone)]
pub struct ChangeTierCommand {
    pub membership_id: MembershipId,
    pub new_tier_id: TierId,
    /// When set, the change is rejected unless the price moves this way.
    pub expected_direction: Option<TierChangeDirection>,
    /// Deferred changes are not supported; `false` is rejected.
    pub apply_immediately: bool,
    pub actor: Option<ActorId>,
}

/// Result of a successful tier change.
#[derive(Debug, Clone)]
pub struct ChangeTierResult {
    pub membership: Membership,
    pub direction: TierChangeDirection,
    /// Signed price difference prorated over the remaining period. Positive
    /// means the subscriber owes, negative means credit. Informational only.
    pub prorated_amount: Money,
}

/// Handler for tier changes.
///
/// The change applies immediately: price and cycle switch to the new
/// tier, quota counters carry over unchanged and are judged against the
/// new tier's allowances from the next consumption on.
pub struct ChangeTierHandler {
    memberships: Arc<dyn MembershipStore>,
    tiers: Arc<dyn TierCatalog>,
    uow: Arc<dyn UnitOfWork>,
}

impl ChangeTierHandler {
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
        cmd: ChangeTierCommand,
    ) -> Result<ChangeTierResult, MembershipError> {
        if !cmd.apply_immediately {
            return Err(MembershipError::validation(
                "apply_immediately",
                "deferred tier changes are not supported",
            ));
        }

        // 1. Load membership and target tier
        let mut membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;
        if membership.tier_id == cmd.new_tier_id {
            return Err(MembershipError::same_tier(cmd.new_tier_id));
        }
        let new_tier = self
            .tiers
            .find_by_id(&cmd.new_tier_id)
            .await?
            .ok_or(MembershipError::TierNotFound(cmd.new_tier_id))?;
        if !new_tier.is_subscribable() {
            return Err(MembershipError::tier_not_subscribable(new_tier.id));
        }

        // 2. Direction by strict price comparison; equal prices have no
        // direction and are rejected
        let price_diff = new_tier.price.diff(&membership.price).map_err(|e| {
            MembershipError::validation("price", e.to_string())
        })?;
        let direction = if price_diff.amount_cents > 0 {
            TierChangeDirection::Upgrade
        } else if price_diff.amount_cents < 0 {
            TierChangeDirection::Downgrade
        } else {
            return Err(MembershipError::validation(
                "new_tier_id",
                "target tier costs the same as the current tier",
            ));
        };
        if let Some(expected) = cmd.expected_direction {
            if expected != direction {
                return Err(MembershipError::validation(
                    "new_tier_id",
                    format!(
                        "price moves as a {}, not a {}",
                        direction.as_str(),
                        expected.as_str()
                    ),
                ));
            }
        }

        // 3. Prorate the price difference over the remaining period
        let now = Timestamp::now();
        let old_cycle = membership.billing_cycle;
        let prorated_amount = match membership.end_date {
            Some(end) if now.is_before(&end) => {
                let period_start = end.minus_months(old_cycle.months());
                let total_days = period_start.days_until(&end);
                let remaining_days = now.days_until(&end);
                price_diff.prorate(remaining_days, total_days)
            }
            _ => Money::zero(price_diff.currency),
        };

        // 4. Apply and record
        let old_tier_id = membership.tier_id;
        membership.apply_tier(new_tier.id, new_tier.price, new_tier.billing_cycle)?;
        let reason = match direction {
            TierChangeDirection::Upgrade => ChangeReason::Upgrade,
            TierChangeDirection::Downgrade => ChangeReason::Downgrade,
        };
        let mut entry = ChangeLogEntry::tier_change(membership.id, reason, old_tier_id, new_tier.id)
            .with_metadata(json!({
                "prorated_amount_cents": prorated_amount.amount_cents,
                "applied_immediately": true,
                "new_price_cents": new_tier.price.amount_cents,
            }));
        if let Some(actor) = cmd.actor {
            entry = entry.by(actor);
        }
        self.uow.commit_transition(&membership, &entry, None).await?;

        tracing::info!(
            membership_id = %membership.id,
            old_tier_id = %old_tier_id,
            new_tier_id = %new_tier.id,
            direction = direction.as_str(),
            prorated_cents = prorated_amount.amount_cents,
            "membership tier changed"
        );

        Ok(ChangeTierResult {
            membership,
            direction,
            prorated_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{BillingCycle, Currency, SubscriberId};
    use crate::domain::quota::QuotaLedger;
    use crate::domain::tier::{MembershipTier, QuotaAllowances, QuotaResource};

    fn tier(name: &str, price_cents: i64, active: bool) -> MembershipTier {
        MembershipTier {
            id: TierId::new(),
            name: name.to_string(),
            display_name: name.to_string(),
            price: Money::from_cents(price_cents, Currency::USD),
            billing_cycle: BillingCycle::Monthly,
            quotas: QuotaAllowances::unlimited().with_limit(QuotaResource::Consultations, 5),
            benefits: vec![],
            is_active: active,
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

    fn handler(store: &Arc<InMemoryStore>) -> ChangeTierHandler {
        ChangeTierHandler::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn upgrade_applies_new_price_and_logs_upgrade() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        let premium = tier("premium", 500_00, true);
        store.insert_tier(basic.clone()).await;
        store.insert_tier(premium.clone()).await;
        let membership = membership_on(&store, &basic).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: premium.id,
                expected_direction: None,
                apply_immediately: true,
                actor: None,
            })
            .await
            .unwrap();

        assert_eq!(result.direction, TierChangeDirection::Upgrade);
        assert_eq!(result.membership.tier_id, premium.id);
        assert_eq!(result.membership.price, premium.price);
        // A full period remains, so roughly the whole difference is owed
        assert!(result.prorated_amount.amount_cents > 0);
        assert!(result.prorated_amount.amount_cents <= 300_00);

        let log = store.change_log_entries(&membership.id).await;
        let entry = log.last().unwrap();
        assert_eq!(entry.reason, ChangeReason::Upgrade);
        assert_eq!(entry.old_tier_id, Some(basic.id));
        assert_eq!(entry.new_tier_id, Some(premium.id));
        assert_eq!(entry.metadata["applied_immediately"], true);
    }

    #[tokio::test]
    async fn downgrade_yields_negative_proration() {
        let store = Arc::new(InMemoryStore::new());
        let premium = tier("premium", 500_00, true);
        let basic = tier("basic", 200_00, true);
        store.insert_tier(premium.clone()).await;
        store.insert_tier(basic.clone()).await;
        let membership = membership_on(&store, &premium).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: basic.id,
                expected_direction: Some(TierChangeDirection::Downgrade),
                apply_immediately: true,
                actor: None,
            })
            .await
            .unwrap();

        assert_eq!(result.direction, TierChangeDirection::Downgrade);
        assert!(result.prorated_amount.amount_cents < 0);

        let log = store.change_log_entries(&membership.id).await;
        assert_eq!(log.last().unwrap().reason, ChangeReason::Downgrade);
    }

    #[tokio::test]
    async fn rejects_wrong_expected_direction() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        let premium = tier("premium", 500_00, true);
        store.insert_tier(basic.clone()).await;
        store.insert_tier(premium.clone()).await;
        let membership = membership_on(&store, &basic).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: premium.id,
                expected_direction: Some(TierChangeDirection::Downgrade),
                apply_immediately: true,
                actor: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::ValidationFailed { .. })
        ));
        // Membership untouched
        let reloaded = MembershipStore::find_by_id(store.as_ref(), &membership.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.tier_id, basic.id);
    }

    #[tokio::test]
    async fn rejects_deferred_change() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        let premium = tier("premium", 500_00, true);
        store.insert_tier(basic.clone()).await;
        store.insert_tier(premium.clone()).await;
        let membership = membership_on(&store, &basic).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: premium.id,
                expected_direction: None,
                apply_immediately: false,
                actor: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::ValidationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_equal_priced_tier() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        let twin = tier("basic-annualized", 200_00, true);
        store.insert_tier(basic.clone()).await;
        store.insert_tier(twin.clone()).await;
        let membership = membership_on(&store, &basic).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: twin.id,
                expected_direction: None,
                apply_immediately: true,
                actor: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::ValidationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_same_tier() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        store.insert_tier(basic.clone()).await;
        let membership = membership_on(&store, &basic).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: basic.id,
                expected_direction: None,
                apply_immediately: true,
                actor: None,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::SameTier(_))));
    }

    #[tokio::test]
    async fn rejects_retired_target_tier() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        let retired = tier("legacy", 500_00, false);
        store.insert_tier(basic.clone()).await;
        store.insert_tier(retired.clone()).await;
        let membership = membership_on(&store, &basic).await;

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: retired.id,
                expected_direction: None,
                apply_immediately: true,
                actor: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(MembershipError::TierNotSubscribable(_))
        ));
    }

    #[tokio::test]
    async fn fails_when_membership_cancelled() {
        let store = Arc::new(InMemoryStore::new());
        let basic = tier("basic", 200_00, true);
        let premium = tier("premium", 500_00, true);
        store.insert_tier(basic.clone()).await;
        store.insert_tier(premium.clone()).await;
        let mut membership = membership_on(&store, &basic).await;
        let entry = membership.cancel(Timestamp::now()).unwrap();
        store
            .commit_transition(&membership, &entry, None)
            .await
            .unwrap();

        let result = handler(&store)
            .handle(ChangeTierCommand {
                membership_id: membership.id,
                new_tier_id: premium.id,
                expected_direction: None,
                apply_immediately: true,
                actor: None,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InvalidState { .. })));
    }
}
