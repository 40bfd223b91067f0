//! PauseMembershipHandler - Command handler for pausing memberships.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::ports::{MembershipStore, UnitOfWork};

/// Command to pause a membership.
#[derive(Debug, Clone)]
pub struct PauseMembershipCommand {
    pub membership_id: MembershipId,
    pub reason: Option<String>,
    /// Advisory date by which the subscriber intends to resume.
    pub resume_by: Option<Timestamp>,
}

/// Result of successful pause.
#[derive(Debug, Clone)]
pub struct PauseMembershipResult {
    pub membership: Membership,
}

/// Handler for pausing memberships.
///
/// Pausing freezes quota consumption but keeps the period clock running;
/// the resume path decides whether to compensate for paused time.
pub struct PauseMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl PauseMembershipHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: PauseMembershipCommand,
    ) -> Result<PauseMembershipResult, MembershipError> {
        let mut membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;

        let entry = membership.pause(Timestamp::now(), cmd.reason, cmd.resume_by)?;
        self.uow.commit_transition(&membership, &entry, None).await?;

        tracing::info!(membership_id = %membership.id, "membership paused");

        Ok(PauseMembershipResult { membership })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{BillingCycle, Currency, Money, SubscriberId, TierId};
    use crate::domain::membership::{ChangeReason, MembershipStatus};
    use crate::domain::quota::QuotaLedger;

    async fn seeded_membership(store: &Arc<InMemoryStore>) -> Membership {
        let membership = Membership::create(
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
        membership
    }

    fn handler(store: &Arc<InMemoryStore>) -> PauseMembershipHandler {
        PauseMembershipHandler::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn pauses_active_membership() {
        let store = Arc::new(InMemoryStore::new());
        let membership = seeded_membership(&store).await;

        let result = handler(&store)
            .handle(PauseMembershipCommand {
                membership_id: membership.id,
                reason: Some("travel".to_string()),
                resume_by: None,
            })
            .await
            .unwrap();

        assert_eq!(result.membership.status, MembershipStatus::Paused);
        assert!(result.membership.paused_at.is_some());

        let log = store.change_log_entries(&membership.id).await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].reason, ChangeReason::Pause);
        assert_eq!(log[0].metadata["reason"], "travel");
    }

    #[tokio::test]
    async fn fails_when_already_paused() {
        let store = Arc::new(InMemoryStore::new());
        let membership = seeded_membership(&store).await;
        let h = handler(&store);

        h.handle(PauseMembershipCommand {
            membership_id: membership.id,
            reason: None,
            resume_by: None,
        })
        .await
        .unwrap();

        let result = h
            .handle(PauseMembershipCommand {
                membership_id: membership.id,
                reason: None,
                resume_by: None,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn fails_when_membership_not_found() {
        let store = Arc::new(InMemoryStore::new());

        let result = handler(&store)
            .handle(PauseMembershipCommand {
                membership_id: MembershipId::new(),
                reason: None,
                resume_by: None,
            })
            .await;

        assert!(matches!(result, Err(MembershipError::NotFound(_))));
    }
}
