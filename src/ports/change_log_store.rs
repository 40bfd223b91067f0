//! Change log store port.
//!
//! The change log is append-only. There is no update or delete; history
//! must survive every lifecycle event including expiration.

use crate::domain::foundation::{DomainError, MembershipId};
use crate::domain::membership::ChangeLogEntry;
use async_trait::async_trait;

/// Store port for the membership change log.
#[async_trait]
pub trait ChangeLogStore: Send + Sync {
    /// Append an entry.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn append(&self, entry: &ChangeLogEntry) -> Result<(), DomainError>;

    /// List a membership's history, oldest first.
    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<ChangeLogEntry>, DomainError>;
}
