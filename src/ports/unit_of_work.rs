//! Unit of work port.
//!
//! Each method is one atomic transaction. Handlers do their reads and
//! in-memory domain mutations first, then hand the results here; the
//! adapter wraps the writes in a single database transaction with row
//! locking where a read feeds a write.
//!
//! Check-and-consume and coupon redemption cannot be split across
//! separate store calls without racing, so those two run their checks
//! inside the transaction as well. Unlike the read-side stores this port
//! speaks [`MembershipError`]; the compound operations produce the full
//! business failure modes, not just persistence errors.

use crate::domain::coupon::Redemption;
use crate::domain::foundation::{MembershipId, Timestamp};
use crate::domain::membership::{ChangeLogEntry, Membership, MembershipError};
use crate::domain::quota::{QuotaCheck, QuotaLedger};
use crate::domain::tier::{QuotaAllowances, QuotaResource};
use async_trait::async_trait;

/// Transactional boundary for compound writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Insert a new membership together with its first quota ledger.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the subscriber already has a live membership
    /// - `Infrastructure` on persistence failure
    async fn create_membership(
        &self,
        membership: &Membership,
        ledger: &QuotaLedger,
    ) -> Result<(), MembershipError>;

    /// Persist a lifecycle transition: update the membership row, append
    /// the change log entry, and open a fresh ledger when the transition
    /// starts a new billing period.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the membership row is gone
    /// - `Infrastructure` on persistence failure
    async fn commit_transition(
        &self,
        membership: &Membership,
        entry: &ChangeLogEntry,
        new_ledger: Option<&QuotaLedger>,
    ) -> Result<(), MembershipError>;

    /// Atomically check and consume quota against the current ledger.
    ///
    /// The implementation locks the ledger row covering `now`, verifies
    /// `used + amount` stays within the allowance, and increments the
    /// counter, all in one transaction. When no ledger covers `now` a
    /// fresh period is opened first, running to the membership's end date
    /// or one billing cycle out. Under concurrent consumption of the last
    /// unit, exactly one caller succeeds.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the membership does not exist
    /// - `InvalidState` if the membership cannot consume
    /// - `QuotaExceeded` when the allowance would be overrun
    async fn consume_quota(
        &self,
        membership_id: &MembershipId,
        resource: QuotaResource,
        amount: u32,
        allowances: &QuotaAllowances,
        now: Timestamp,
    ) -> Result<QuotaCheck, MembershipError>;

    /// Atomically redeem a coupon for a membership.
    ///
    /// The implementation locks the coupon row, re-validates the window,
    /// activity flag, and global cap under the lock, inserts the
    /// redemption, and bumps the used count. The unique
    /// `(membership_id, coupon_id)` pair enforces single use per
    /// membership.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the membership does not exist
    /// - `CouponNotFound` if no coupon has this code
    /// - `InvalidCoupon` / `CouponExhausted` when validation fails
    /// - `AlreadyRedeemed` on a repeat redemption
    async fn redeem_coupon(
        &self,
        membership_id: &MembershipId,
        code: &str,
        now: Timestamp,
    ) -> Result<Redemption, MembershipError>;
}
