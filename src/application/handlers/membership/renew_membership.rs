//! RenewMembershipHandler - Command handler for renewing memberships.

use std::sync::Arc;

use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::{Membership, MembershipError};
use crate::domain::quota::QuotaLedger;
use crate::ports::{MembershipStore, UnitOfWork};

/// Longest renewal a single command may buy.
const MAX_RENEWAL_MONTHS: u32 = 12;

/// Command to renew a membership.
#[derive(Debug, Clone)]
pub struct RenewMembershipCommand {
    pub membership_id: MembershipId,
    /// Whole months to extend by, 1 through 12. Defaults to the length of
    /// the membership's billing cycle.
    pub months: Option<u32>,
}

/// Result of successful renewal.
#[derive(Debug, Clone)]
pub struct RenewMembershipResult {
    pub membership: Membership,
    /// Fresh ledger for the purchased period.
    pub ledger: QuotaLedger,
}

/// Handler for renewing memberships.
///
/// The end date advances by exactly the purchased number of calendar
/// months from the prior end date, and a zeroed ledger opens for the new
/// period. A lapsed-but-Active membership renews from its old end date,
/// so late renewal does not grant free days.
pub struct RenewMembershipHandler {
    memberships: Arc<dyn MembershipStore>,
    uow: Arc<dyn UnitOfWork>,
}

impl RenewMembershipHandler {
    pub fn new(memberships: Arc<dyn MembershipStore>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { memberships, uow }
    }

    pub async fn handle(
        &self,
        cmd: RenewMembershipCommand,
    ) -> Result<RenewMembershipResult, MembershipError> {
        if let Some(months) = cmd.months {
            if months == 0 || months > MAX_RENEWAL_MONTHS {
                return Err(MembershipError::validation(
                    "months",
                    format!("Renewal must be 1 to {} months", MAX_RENEWAL_MONTHS),
                ));
            }
        }

        let mut membership = self
            .memberships
            .find_by_id(&cmd.membership_id)
            .await?
            .ok_or(MembershipError::NotFound(cmd.membership_id))?;

        let months = cmd.months.unwrap_or(membership.billing_cycle.months());
        let now = Timestamp::now();
        let period_start = membership.end_date.unwrap_or(now);
        let entry = membership.renew(now, months)?;
        let period_end = membership
            .end_date
            .ok_or_else(|| MembershipError::infrastructure("renewed membership has no end date"))?;
        let ledger = QuotaLedger::open(membership.id, period_start, period_end, now);

        self.uow
            .commit_transition(&membership, &entry, Some(&ledger))
            .await?;

        tracing::info!(
            membership_id = %membership.id,
            months,
            new_end_date = %period_end,
            "membership renewed"
        );

        Ok(RenewMembershipResult { membership, ledger })
    }
}
