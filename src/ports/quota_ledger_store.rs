//! Quota ledger store port.
//!
//! Read access to per-period ledgers. All writes that change usage
//! counters go through the unit of work so check-and-consume stays
//! atomic; this port only creates empty ledgers and reads.

use crate::domain::foundation::{DomainError, MembershipId, Timestamp};
use crate::domain::quota::QuotaLedger;
use async_trait::async_trait;

/// Store port for quota ledgers.
#[async_trait]
pub trait QuotaLedgerStore: Send + Sync {
    /// Save a freshly opened ledger.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or overlapping period
    async fn save(&self, ledger: &QuotaLedger) -> Result<(), DomainError>;

    /// Find the ledger covering `at` for a membership.
    ///
    /// Returns `None` when no period covers the instant.
    async fn find_current(
        &self,
        membership_id: &MembershipId,
        at: Timestamp,
    ) -> Result<Option<QuotaLedger>, DomainError>;

    /// List all ledgers for a membership, newest period first.
    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<QuotaLedger>, DomainError>;
}
