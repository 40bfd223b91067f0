//! CancelMembershipHandler - Command handler for cancelling memberships.

use std::sync::Arc;

use crate::domain::foundation::{ActorId, MembershipId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::ports::{MembershipStore, UnitOfWork};

/// Command to cancel a membership.
#[derive(Debug, Clone)]
pub struct CancelMembershipCommand {
    pub membership_id: MembershipId,
    pub actor: Option<ActorId>,
}

/// Result of successful membership cancellation.
#[derive(Debug, Clone)]
pub struct CancelMembershipResult {
    pub membership: Membership,
    /// When access ends. Cancellation is immediate.
    pub effective_at: Timestamp,
}

/// Handler for cancelling memberships.
///
/// Cancellation takes effect immediately: the end date moves to now and
/// auto-renewal stops. History survives in the change log.
pub struct CancelMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl CancelMembershipHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: CancelMembershipCommand,
    ) -> Result<CancelMembershipResult, MembershipError> {
        let mut membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;

        let now = Timestamp::now();
        let mut entry = membership.cancel(now)?;
        if let Some(actor) = cmd.actor {
            entry = entry.by(actor);
        }

        self.uow.commit_transition(&membership, &entry, None).await?;

        tracing::info!(membership_id = %membership.id, "membership cancelled");

        Ok(CancelMembershipResult {
            membership,
            effective_at: now,
        })
    }
}
