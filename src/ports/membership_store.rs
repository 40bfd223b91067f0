//! Membership store port (write side).
//!
//! Defines the contract for persisting and retrieving Membership aggregates.
//! Implementations handle the actual database operations.
//!
//! # Design
//!
//! - **Write-focused**: Optimized for aggregate persistence
//! - **Unique constraint**: At most one non-terminal membership per subscriber
//! - **No deletes**: Memberships transition to Expired, they are never removed

use crate::domain::foundation::{DomainError, MembershipId, SubscriberId, Timestamp};
use crate::domain::membership::Membership;
use async_trait::async_trait;

/// Store port for Membership aggregate persistence.
///
/// Implementations must ensure:
/// - At most one Active or Paused membership per subscriber
/// - Updates persist the full aggregate state, not a diff
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Save a new membership.
    ///
    /// # Errors
    ///
    /// - `MembershipExists` if the subscriber already has a live membership
    /// - `DatabaseError` on persistence failure
    async fn save(&self, membership: &Membership) -> Result<(), DomainError>;

    /// Update an existing membership.
    ///
    /// # Errors
    ///
    /// - `MembershipNotFound` if membership doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, membership: &Membership) -> Result<(), DomainError>;

    /// Find a membership by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError>;

    /// Find a subscriber's membership.
    ///
    /// Returns `None` if the subscriber has none. This is the primary
    /// lookup since each subscriber has at most one live membership.
    async fn find_by_subscriber_id(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<Option<Membership>, DomainError>;

    /// Find active memberships whose end date has passed as of `now`.
    ///
    /// Used by the expiration sweep.
    async fn find_lapsed(&self, now: Timestamp) -> Result<Vec<Membership>, DomainError>;

    /// Find active memberships whose end date falls within the next
    /// `days` days of `now`. Feeds renewal reminders.
    async fn find_expiring_within(
        &self,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<Membership>, DomainError>;
}
