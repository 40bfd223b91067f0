//! Per-period quota ledger.
//!
//! One [`QuotaLedger`] row exists per membership per billing period. It
//! carries the usage counters for every metered resource; the period limits
//! come from the tier's [`QuotaAllowances`] at consumption time.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LedgerId, MembershipId, Timestamp};
use crate::domain::membership::MembershipError;
use crate::domain::tier::{QuotaAllowances, QuotaResource};

/// Usage counters for one billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub consultations: u32,
    pub opinions: u32,
    pub services: u32,
    pub cases: u32,
    pub call_minutes: u32,
}

impl QuotaUsage {
    pub fn used(&self, resource: QuotaResource) -> u32 {
        match resource {
            QuotaResource::Consultations => self.consultations,
            QuotaResource::Opinions => self.opinions,
            QuotaResource::Services => self.services,
            QuotaResource::Cases => self.cases,
            QuotaResource::CallMinutes => self.call_minutes,
        }
    }

    fn counter_mut(&mut self, resource: QuotaResource) -> &mut u32 {
        match resource {
            QuotaResource::Consultations => &mut self.consultations,
            QuotaResource::Opinions => &mut self.opinions,
            QuotaResource::Services => &mut self.services,
            QuotaResource::Cases => &mut self.cases,
            QuotaResource::CallMinutes => &mut self.call_minutes,
        }
    }
}

/// Snapshot of one resource's standing within a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaCheck {
    pub resource: QuotaResource,
    pub used: u32,
    /// `None` means unlimited.
    pub limit: Option<u32>,
    /// `None` means unlimited.
    pub remaining: Option<u32>,
}

impl QuotaCheck {
    pub fn is_unlimited(&self) -> bool {
        self.limit.is_none()
    }

    pub fn can_consume(&self, amount: u32) -> bool {
        match self.remaining {
            None => true,
            Some(remaining) => amount <= remaining,
        }
    }
}

/// Quota ledger for one membership billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLedger {
    pub id: LedgerId,
    pub membership_id: MembershipId,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub usage: QuotaUsage,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl QuotaLedger {
    /// Opens a fresh ledger with all counters at zero.
    pub fn open(
        membership_id: MembershipId,
        period_start: Timestamp,
        period_end: Timestamp,
        now: Timestamp,
    ) -> Self {
        QuotaLedger {
            id: LedgerId::new(),
            membership_id,
            period_start,
            period_end,
            usage: QuotaUsage::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true when `at` falls inside `[period_start, period_end)`.
    pub fn covers(&self, at: Timestamp) -> bool {
        !at.is_before(&self.period_start) && at.is_before(&self.period_end)
    }

    /// Reports the standing of one resource against the given allowances.
    pub fn check(&self, resource: QuotaResource, allowances: &QuotaAllowances) -> QuotaCheck {
        let used = self.usage.used(resource);
        let limit = allowances.limit_for(resource);
        let remaining = limit.map(|l| l.saturating_sub(used));
        QuotaCheck {
            resource,
            used,
            limit,
            remaining,
        }
    }

    /// Records consumption of `amount` units, enforcing the period limit.
    ///
    /// The check and the increment happen together so a caller holding the
    /// ledger row lock gets an atomic check-and-consume.
    pub fn try_consume(
        &mut self,
        resource: QuotaResource,
        amount: u32,
        allowances: &QuotaAllowances,
        now: Timestamp,
    ) -> Result<QuotaCheck, MembershipError> {
        if amount == 0 {
            return Err(MembershipError::validation(
                "amount",
                "Consumption amount must be at least 1",
            ));
        }
        let used = self.usage.used(resource);
        if let Some(limit) = allowances.limit_for(resource) {
            let remaining = limit.saturating_sub(used);
            if amount > remaining {
                return Err(MembershipError::quota_exceeded(resource, limit, used));
            }
        }
        *self.usage.counter_mut(resource) += amount;
        self.updated_at = now;
        Ok(self.check(resource, allowances))
    }
}
