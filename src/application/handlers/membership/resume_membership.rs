//! ResumeMembershipHandler - Command handler for resuming paused memberships.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::ports::{MembershipStore, UnitOfWork};

/// Command to resume a paused membership.
#[derive(Debug, Clone)]
pub struct ResumeMembershipCommand {
    pub membership_id: MembershipId,
    /// Push the end date out by the paused time, rounded to whole months.
    pub extend_for_paused_time: bool,
}

/// Result of successful resume.
#[derive(Debug, Clone)]
pub struct ResumeMembershipResult {
    pub membership: Membership,
}

/// Handler for resuming memberships.
pub struct ResumeMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl ResumeMembershipHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: ResumeMembershipCommand,
    ) -> Result<ResumeMembershipResult, MembershipError> {
        let mut membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;

        let entry = membership.resume(Timestamp::now(), cmd.extend_for_paused_time)?;
        self.uow.commit_transition(&membership, &entry, None).await?;

        tracing::info!(membership_id = %membership.id, "membership resumed");

        Ok(ResumeMembershipResult { membership })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{BillingCycle, Currency, Money, SubscriberId, TierId};
    use crate::domain::membership::{ChangeReason, MembershipStatus};
    use crate::domain::quota::QuotaLedger;

    async fn paused_membership(store: &Arc<InMemoryStore>) -> Membership {
        let mut membership = Membership::create(
            MembershipId::new(),
            SubscriberId::new("sub-test-123").unwrap(),
            TierId::new(),
            Money::from_cents(200_00, Currency::USD),
            BillingCycle::Monthly,
            Timestamp::now(),
        );
        let ledger = QuotaLedger::open(
            membership.id,
            membership.start_date,
            membership.end_date.unwrap(),
            Timestamp::now(),
        );
        store.create_membership(&membership, &ledger).await.unwrap();
        let entry = membership.pause(Timestamp::now(), None, None).unwrap();
        store
            .commit_transition(&membership, &entry, None)
            .await
            .unwrap();
        membership
    }

    fn handler(store: &Arc<InMemoryStore>) -> ResumeMembershipHandler {
        ResumeMembershipHandler::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn resumes_paused_membership() {
        let store = Arc::new(InMemoryStore::new());
        let membership = paused_membership(&store).await;
        let old_end = membership.end_date;

        let result = handler(&store)
            .handle(ResumeMembershipCommand {
                membership_id: membership.id,
                extend_for_paused_time: false,
            })
            .await
            .unwrap();

        assert_eq!(result.membership.status, MembershipStatus::Active);
        assert!(result.membership.paused_at.is_none());
        assert_eq!(result.membership.end_date, old_end);

        let log = store.change_log_entries(&membership.id).await;
        assert_eq!(log.last().unwrap().reason, ChangeReason::Resume);
    }

    #[tokio::test]
    async fn short_pause_with_extension_changes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let membership = paused_membership(&store).await;
        let old_end = membership.end_date;

        // Paused moments ago; rounds to zero extra months
        let result = handler(&store)
            .handle(ResumeMembershipCommand {
                membership_id: membership.id,
                extend_for_paused_time: true,
            })
            .await
            .unwrap();

        assert_eq!(result.membership.end_date, old_end);
    }

    #[tokio::test]
    async fn fails_when_not_paused() {
        let store = Arc::new(InMemoryStore::new());
        let membership = paused_membership(&store).await;
        let h = handler(&store);

        h.handle(ResumeMembershipCommand {
            membership_id: membership.id,
            extend_for_paused_time: false,
        })
        .await
        .unwrap();

        let result = h
            .handle(ResumeMembershipCommand {
                membership_id: membership.id,
                extend_for_paused_time: false,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn fails_when_membership_not_found() {
        let store = Arc::new(InMemoryStore::new());

        let result = handler(&store)
            .handle(ResumeMembershipCommand {
                membership_id: MembershipId::new(),
                extend_for_paused_time: false,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::NotFound(_))));
    }
}
