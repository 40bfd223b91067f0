//! ExpireMembershipsHandler - Batch expiration of lapsed memberships.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::MembershipError;
use crate::ports::{MembershipStore, UnitOfWork};

/// Command to expire every Active membership whose paid period has lapsed.
#[derive(Debug, Clone, Default)]
pub struct ExpireMembershipsCommand {
    /// Defaults to now. Lets the sweep binary pin a cutoff for the whole run.
    pub as_of: Option<Timestamp>,
}

/// Outcome of one sweep.
#[derive(Debug, Clone)]
pub struct ExpireMembershipsResult {
    pub expired: Vec<MembershipId>,
    pub failed: Vec<MembershipId>,
}

/// Handler for the expiration sweep.
///
/// Each membership is expired in its own transaction. A failure on one
/// record is logged and skipped so the rest of the batch still runs.
pub struct ExpireMembershipsHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl ExpireMembershipsHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: ExpireMembershipsCommand,
    ) -> Result<ExpireMembershipsResult, MembershipError> {
        let as_of = cmd.as_of.unwrap_or_else(Timestamp::now);
        let lapsed = self.memberships.find_lapsed(as_of).await?;

        let mut expired = Vec::new();
        let mut failed = Vec::new();
        for mut membership in lapsed {
            let entry = match membership.expire(as_of) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(
                        membership_id = %membership.id,
                        error = %err,
                        "skipping membership that cannot expire"
                    );
                    failed.push(membership.id);
                    continue;
                }
            };
            match self.uow.commit_transition(&membership, &entry, None).await {
                Ok(()) => expired.push(membership.id),
                Err(err) => {
                    tracing::warn!(
                        membership_id = %membership.id,
                        error = %err,
                        "failed to persist expiration"
                    );
                    failed.push(membership.id);
                }
            }
        }

        tracing::info!(
            expired = expired.len(),
            failed = failed.len(),
            "expiration sweep finished"
        );

        Ok(ExpireMembershipsResult { expired, failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{BillingCycle, Currency, Money, SubscriberId, TierId};
    use crate::domain::membership::{ChangeReason, Membership, MembershipStatus};
    use crate::domain::quota::QuotaLedger;

    async fn membership_started(
        store: &Arc<InMemoryStore>,
        subscriber: &str,
        start: Timestamp,
    ) -> Membership {
        let membership = Membership::create(
            MembershipId::new(),
            SubscriberId::new(subscriber).unwrap(),
            TierId::new(),
            Money::from_cents(200_00, Currency::USD),
            BillingCycle::Monthly,
            start,
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

    fn handler(store: &Arc<InMemoryStore>) -> ExpireMembershipsHandler {
        ExpireMembershipsHandler::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn expires_lapsed_and_leaves_current_alone() {
        let store = Arc::new(InMemoryStore::new());
        let lapsed = membership_started(&store, "sub-old-1", Timestamp::now().minus_months(2)).await;
        let current = membership_started(&store, "sub-new-1", Timestamp::now()).await;

        let result = handler(&store)
            .handle(ExpireMembershipsCommand::default())
            .await
            .unwrap();

        assert_eq!(result.expired, vec![lapsed.id]);
        assert!(result.failed.is_empty());

        let reloaded = MembershipStore::find_by_id(store.as_ref(), &lapsed.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.status, MembershipStatus::Expired);
        assert!(!reloaded.auto_renew);

        let untouched = MembershipStore::find_by_id(store.as_ref(), &current.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn expiration_entry_is_attributed_to_system() {
        let store = Arc::new(InMemoryStore::new());
        let lapsed = membership_started(&store, "sub-old-1", Timestamp::now().minus_months(2)).await;

        handler(&store)
            .handle(ExpireMembershipsCommand::default())
            .await
            .unwrap();

        let log = store.change_log_entries(&lapsed.id).await;
        let entry = log.last().unwrap();
        assert_eq!(entry.reason, ChangeReason::Expiration);
        assert_eq!(entry.changed_by.as_ref().unwrap().as_str(), "system");
    }

    #[tokio::test]
    async fn empty_sweep_reports_nothing() {
        let store = Arc::new(InMemoryStore::new());

        let result = handler(&store)
            .handle(ExpireMembershipsCommand::default())
            .await
            .unwrap();

        assert!(result.expired.is_empty());
        assert!(result.failed.is_empty());
    }

    #[tokio::test]
    async fn cutoff_controls_what_lapses() {
        let store = Arc::new(InMemoryStore::new());
        let membership = membership_started(&store, "sub-test-1", Timestamp::now()).await;

        let result = handler(&store)
            .handle(ExpireMembershipsCommand {
                as_of: Some(Timestamp::now().add_months(2)),
            })
            .await
            .unwrap();

        assert_eq!(result.expired, vec![membership.id]);
    }
}
