//! Membership aggregate entity.
//!
//! The Membership aggregate represents one subscriber's subscription to a
//! pricing tier and its position in the lifecycle state machine.
//!
//! # Design Decisions
//!
//! - **One active per subscriber**: enforced by the creation use case and a
//!   partial unique index at the database level
//! - **Money in cents**: all monetary values stored as i64 cents (not floats)
//! - **Never deleted**: cancellation and expiration are state changes
//! - **Audited transitions**: every lifecycle mutation produces the
//!   ChangeLogEntry that must be persisted alongside it

use crate::domain::foundation::{
    ActorId, BillingCycle, DomainError, ErrorCode, MembershipId, Money, StateMachine,
    SubscriberId, TierId, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ChangeLogEntry, ChangeReason, MembershipStatus};

/// Days used when rounding a paused stretch to whole months.
const DAYS_PER_MONTH: i64 = 30;

/// Membership aggregate - one subscriber's subscription record.
///
/// # Invariants
///
/// - `id` is globally unique
/// - at most one membership per subscriber is Active at any instant
/// - status transitions follow the MembershipStatus state machine
/// - `start_date <= end_date` whenever an end date exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Unique identifier for this membership.
    pub id: MembershipId,

    /// Subscriber who owns this membership.
    pub subscriber_id: SubscriberId,

    /// Tier the subscriber is on.
    pub tier_id: TierId,

    /// Price per billing period, captured from the tier at subscription
    /// or tier-change time.
    pub price: Money,

    /// Billing period length.
    pub billing_cycle: BillingCycle,

    /// Current lifecycle state.
    pub status: MembershipStatus,

    /// When the membership began.
    pub start_date: Timestamp,

    /// When the current period ends. None means open-ended.
    pub end_date: Option<Timestamp>,

    /// Whether the membership renews automatically at period end.
    pub auto_renew: bool,

    /// When the membership was created.
    pub created_at: Timestamp,

    /// When the membership was last updated.
    pub updated_at: Timestamp,

    /// When the membership was cancelled (if cancelled).
    pub cancelled_at: Option<Timestamp>,

    /// When the membership was paused (if paused).
    pub paused_at: Option<Timestamp>,
}

impl Membership {
    /// Create a new active membership on the given tier.
    ///
    /// The end date is the start date plus one billing period.
    pub fn create(
        id: MembershipId,
        subscriber_id: SubscriberId,
        tier_id: TierId,
        price: Money,
        billing_cycle: BillingCycle,
        start_date: Timestamp,
    ) -> Self {
        let now = Timestamp::now();
        let end_date = start_date.add_months(billing_cycle.months());
        Self {
            id,
            subscriber_id,
            tier_id,
            price,
            billing_cycle,
            status: MembershipStatus::Active,
            start_date,
            end_date: Some(end_date),
            auto_renew: true,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            paused_at: None,
        }
    }

    /// Returns true if the period has lapsed (end date in the past).
    pub fn is_lapsed(&self, now: Timestamp) -> bool {
        self.end_date.map(|end| end.is_before(&now)).unwrap_or(false)
    }

    /// Days remaining in the current period. 0 if lapsed or open-ended.
    pub fn days_remaining(&self, now: Timestamp) -> i64 {
        self.end_date.map(|end| now.days_until(&end)).unwrap_or(0)
    }

    /// Total length of the current billing period in days.
    pub fn period_total_days(&self) -> i64 {
        match self.end_date {
            Some(end) => end.minus_months(self.billing_cycle.months()).days_until(&end),
            None => 0,
        }
    }

    /// Cancel this membership, effective immediately.
    ///
    /// Sets the end date to now and disables auto-renewal.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if not Active or Paused.
    pub fn cancel(&mut self, now: Timestamp) -> Result<ChangeLogEntry, DomainError> {
        self.transition_to(MembershipStatus::Cancelled)?;
        self.end_date = Some(now);
        self.auto_renew = false;
        self.cancelled_at = Some(now);
        self.paused_at = None;
        self.touch();

        Ok(ChangeLogEntry::new(self.id, ChangeReason::Cancellation)
            .with_metadata(json!({ "end_date": now })))
    }

    /// Pause this membership.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if not Active.
    pub fn pause(
        &mut self,
        now: Timestamp,
        reason: Option<String>,
        resume_by: Option<Timestamp>,
    ) -> Result<ChangeLogEntry, DomainError> {
        self.transition_to(MembershipStatus::Paused)?;
        self.paused_at = Some(now);
        self.touch();

        Ok(ChangeLogEntry::new(self.id, ChangeReason::Pause)
            .with_metadata(json!({ "reason": reason, "resume_by": resume_by })))
    }

    /// Resume a paused membership.
    ///
    /// When `extend_for_paused_time` is set and an end date exists, the end
    /// date moves forward by the paused duration rounded to whole months.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if not Paused.
    pub fn resume(
        &mut self,
        now: Timestamp,
        extend_for_paused_time: bool,
    ) -> Result<ChangeLogEntry, DomainError> {
        // Active -> Active exists for renewal; resume must start from Paused
        if self.status != MembershipStatus::Paused {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot resume membership in {:?} state", self.status),
            ));
        }
        self.transition_to(MembershipStatus::Active)?;

        let mut extended_months = 0u32;
        if extend_for_paused_time {
            if let (Some(paused_at), Some(end)) = (self.paused_at, self.end_date) {
                let paused_days = paused_at.days_until(&now);
                extended_months =
                    ((paused_days + DAYS_PER_MONTH / 2) / DAYS_PER_MONTH).max(0) as u32;
                if extended_months > 0 {
                    self.end_date = Some(end.add_months(extended_months));
                }
            }
        }
        self.paused_at = None;
        self.touch();

        Ok(ChangeLogEntry::new(self.id, ChangeReason::Resume)
            .with_metadata(json!({ "extended_months": extended_months })))
    }

    /// Renew for the given number of months.
    ///
    /// The end date advances by exactly `months` calendar months from the
    /// prior end date, or from now when no end date existed. A lapsed
    /// membership still renews as long as the status is Active.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if not Active.
    pub fn renew(&mut self, now: Timestamp, months: u32) -> Result<ChangeLogEntry, DomainError> {
        // Cancelled/Expired -> Active exists for reactivate; renewal only
        // extends a membership that is still Active
        if self.status != MembershipStatus::Active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot renew membership in {:?} state", self.status),
            ));
        }
        self.transition_to(MembershipStatus::Active)?;
        let base = self.end_date.unwrap_or(now);
        self.end_date = Some(base.add_months(months));
        self.touch();

        Ok(ChangeLogEntry::new(self.id, ChangeReason::Renewal)
            .with_metadata(json!({ "months": months, "new_end_date": self.end_date })))
    }

    /// Reactivate a cancelled or expired membership for an explicit duration.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if already Active or Paused.
    pub fn reactivate(&mut self, now: Timestamp, months: u32) -> Result<ChangeLogEntry, DomainError> {
        if !matches!(
            self.status,
            MembershipStatus::Cancelled | MembershipStatus::Expired
        ) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot reactivate membership in {:?} state", self.status),
            ));
        }
        self.transition_to(MembershipStatus::Active)?;
        self.end_date = Some(now.add_months(months));
        self.cancelled_at = None;
        self.auto_renew = true;
        self.touch();

        Ok(ChangeLogEntry::new(self.id, ChangeReason::Reactivation)
            .with_metadata(json!({ "months": months, "new_end_date": self.end_date })))
    }

    /// Move this membership onto a different tier.
    ///
    /// The caller decides direction and proration; this only applies the
    /// tier, price, and cycle.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if not Active; SameTier if the tier is
    /// unchanged.
    pub fn apply_tier(
        &mut self,
        new_tier_id: TierId,
        new_price: Money,
        new_cycle: BillingCycle,
    ) -> Result<(), DomainError> {
        if new_tier_id == self.tier_id {
            return Err(DomainError::new(
                ErrorCode::SameTier,
                "Membership is already on this tier",
            ));
        }
        if self.status != MembershipStatus::Active {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot change tier of membership in {:?} state", self.status),
            ));
        }
        self.transition_to(MembershipStatus::Active)?;
        self.tier_id = new_tier_id;
        self.price = new_price;
        self.billing_cycle = new_cycle;
        self.touch();
        Ok(())
    }

    /// Mark this membership expired. System-batch only.
    ///
    /// # Errors
    ///
    /// InvalidStateTransition if not Active.
    pub fn expire(&mut self, now: Timestamp) -> Result<ChangeLogEntry, DomainError> {
        self.transition_to(MembershipStatus::Expired)?;
        self.auto_renew = false;
        self.touch();

        Ok(ChangeLogEntry::new(self.id, ChangeReason::Expiration)
            .by(ActorId::system())
            .with_metadata(json!({ "expired_at": now, "end_date": self.end_date })))
    }

    fn transition_to(&mut self, target: MembershipStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition membership from {:?} to {:?}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
