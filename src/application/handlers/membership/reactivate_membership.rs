//! ReactivateMembershipHandler - Command handler for reviving ended memberships.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::domain::quota::QuotaLedger;
use crate::ports::{MembershipStore, UnitOfWork};

const MAX_REACTIVATION_MONTHS: u32 = 12;

/// Command to reactivate a cancelled or expired membership.
#[derive(Debug, Clone)]
pub struct ReactivateMembershipCommand {
    pub membership_id: MembershipId,
    /// Paid duration of the revived membership, 1 to 12 months.
    pub months: u32,
}

/// Result of successful reactivation.
#[derive(Debug, Clone)]
pub struct ReactivateMembershipResult {
    pub membership: Membership,
    pub ledger: QuotaLedger,
}

/// Handler for reactivating memberships.
///
/// Reactivation starts a fresh paid period from now. Old ledgers stay
/// untouched; the new period gets a zeroed ledger of its own.
pub struct ReactivateMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl ReactivateMembershipHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: ReactivateMembershipCommand,
    ) -> Result<ReactivateMembershipResult, MembershipError> {
        if cmd.months == 0 || cmd.months > MAX_REACTIVATION_MONTHS {
            return Err(MembershipError::validation(
                "months",
                format!("must be between 1 and {}", MAX_REACTIVATION_MONTHS),
            ));
        }

        let mut membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;

        let now = Timestamp::now();
        let entry = membership.reactivate(now, cmd.months)?;
        let period_end = membership
            .end_date
            .ok_or_else(|| MembershipError::infrastructure("reactivated membership has no end date"))?;
        let ledger = QuotaLedger::open(membership.id, now, period_end, now);

        self.uow
            .commit_transition(&membership, &entry, Some(&ledger))
            .await?;

        tracing::info!(
            membership_id = %membership.id,
            months = cmd.months,
            "membership reactivated"
        );

        Ok(ReactivateMembershipResult { membership, ledger })
    }
}
