//! Tier catalog port (read side).
//!
//! The catalog is reference data managed out of band; handlers only ever
//! read it.

use crate::domain::foundation::{DomainError, TierId};
use crate::domain::tier::MembershipTier;
use async_trait::async_trait;

/// Read port for the membership tier catalog.
#[async_trait]
pub trait TierCatalog: Send + Sync {
    /// Find a tier by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &TierId) -> Result<Option<MembershipTier>, DomainError>;

    /// List tiers currently open for subscription.
    async fn list_subscribable(&self) -> Result<Vec<MembershipTier>, DomainError>;
}
