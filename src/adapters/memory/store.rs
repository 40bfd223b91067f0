//! In-memory store implementation for testing.
//!
//! One struct implements every port behind a single async mutex, so each
//! operation is serialized exactly like a database transaction. That makes
//! the unit of work genuinely atomic here, which is what the concurrency
//! tests rely on.
//!
//! This adapter is for **testing only**; production deployments use the
//! Postgres adapters.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::coupon::{Coupon, Redemption};
use crate::domain::foundation::{
    CouponId, DomainError, ErrorCode, MembershipId, SubscriberId, TierId, Timestamp,
};
use crate::domain::membership::{ChangeLogEntry, Membership, MembershipError, MembershipStatus};
use crate::domain::quota::{QuotaCheck, QuotaLedger};
use crate::domain::tier::{MembershipTier, QuotaAllowances, QuotaResource};
use crate::ports::{
    ChangeLogStore, CouponStore, MembershipStore, QuotaLedgerStore, RedemptionStore, TierCatalog,
    UnitOfWork,
};

#[derive(Default)]
struct State {
    memberships: Vec<Membership>,
    tiers: Vec<MembershipTier>,
    ledgers: Vec<QuotaLedger>,
    coupons: Vec<Coupon>,
    redemptions: Vec<Redemption>,
    change_log: Vec<ChangeLogEntry>,
}

/// In-memory implementation of all store ports and the unit of work.
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    // === Seeding Helpers ===

    /// Inserts a tier into the catalog.
    pub async fn insert_tier(&self, tier: MembershipTier) {
        self.state.lock().await.tiers.push(tier);
    }

    /// Inserts a coupon directly, bypassing the store trait.
    pub async fn insert_coupon(&self, coupon: Coupon) {
        self.state.lock().await.coupons.push(coupon);
    }

    // === Test Helpers ===

    /// Returns a membership's change log entries (for test assertions).
    pub async fn change_log_entries(&self, membership_id: &MembershipId) -> Vec<ChangeLogEntry> {
        self.state
            .lock()
            .await
            .change_log
            .iter()
            .filter(|e| &e.membership_id == membership_id)
            .cloned()
            .collect()
    }

    /// Returns all ledgers for a membership (for test assertions).
    pub async fn ledgers_for(&self, membership_id: &MembershipId) -> Vec<QuotaLedger> {
        self.state
            .lock()
            .await
            .ledgers
            .iter()
            .filter(|l| &l.membership_id == membership_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_live(m: &Membership) -> bool {
    m.status.is_live()
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn save(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if state
            .memberships
            .iter()
            .any(|m| m.subscriber_id == membership.subscriber_id && is_live(m))
        {
            return Err(DomainError::new(
                ErrorCode::MembershipExists,
                format!(
                    "Subscriber {} already has a live membership",
                    membership.subscriber_id
                ),
            ));
        }
        state.memberships.push(membership.clone());
        Ok(())
    }

    async fn update(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        match state
            .memberships
            .iter_mut()
            .find(|m| m.id == membership.id)
        {
            Some(m) => {
                *m = membership.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::MembershipNotFound,
                format!("Membership not found: {}", membership.id),
            )),
        }
    }

    async fn find_by_id(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.memberships.iter().find(|m| &m.id == id).cloned())
    }

    async fn find_by_subscriber_id(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<Option<Membership>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| &m.subscriber_id == subscriber_id && is_live(m))
            .or_else(|| {
                state
                    .memberships
                    .iter()
                    .find(|m| &m.subscriber_id == subscriber_id)
            })
            .cloned())
    }

    async fn find_lapsed(&self, now: Timestamp) -> Result<Vec<Membership>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.status == MembershipStatus::Active && m.is_lapsed(now))
            .cloned()
            .collect())
    }

    async fn find_expiring_within(
        &self,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<Membership>, DomainError> {
        let cutoff = now.add_days(days);
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| {
                m.status == MembershipStatus::Active
                    && m.end_date
                        .is_some_and(|end| !end.is_before(&now) && end.is_before(&cutoff))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TierCatalog for InMemoryStore {
    async fn find_by_id(&self, id: &TierId) -> Result<Option<MembershipTier>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.tiers.iter().find(|t| &t.id == id).cloned())
    }

    async fn list_subscribable(&self) -> Result<Vec<MembershipTier>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .tiers
            .iter()
            .filter(|t| t.is_subscribable())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuotaLedgerStore for InMemoryStore {
    async fn save(&self, ledger: &QuotaLedger) -> Result<(), DomainError> {
        self.state.lock().await.ledgers.push(ledger.clone());
        Ok(())
    }

    async fn find_current(
        &self,
        membership_id: &MembershipId,
        at: Timestamp,
    ) -> Result<Option<QuotaLedger>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .ledgers
            .iter()
            .find(|l| &l.membership_id == membership_id && l.covers(at))
            .cloned())
    }

    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<QuotaLedger>, DomainError> {
        let state = self.state.lock().await;
        let mut ledgers: Vec<QuotaLedger> = state
            .ledgers
            .iter()
            .filter(|l| &l.membership_id == membership_id)
            .cloned()
            .collect();
        ledgers.sort_by(|a, b| b.period_start.cmp(&a.period_start));
        Ok(ledgers)
    }
}

#[async_trait]
impl CouponStore for InMemoryStore {
    async fn save(&self, coupon: &Coupon) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        if state.coupons.iter().any(|c| c.code == coupon.code) {
            return Err(DomainError::database(format!(
                "Duplicate coupon code: {}",
                coupon.code
            )));
        }
        state.coupons.push(coupon.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.coupons.iter().find(|c| &c.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let state = self.state.lock().await;
        Ok(state.coupons.iter().find(|c| c.code == code).cloned())
    }
}

#[async_trait]
impl RedemptionStore for InMemoryStore {
    async fn find(
        &self,
        membership_id: &MembershipId,
        coupon_id: &CouponId,
    ) -> Result<Option<Redemption>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .redemptions
            .iter()
            .find(|r| &r.membership_id == membership_id && &r.coupon_id == coupon_id)
            .cloned())
    }

    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<Redemption>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .redemptions
            .iter()
            .filter(|r| &r.membership_id == membership_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ChangeLogStore for InMemoryStore {
    async fn append(&self, entry: &ChangeLogEntry) -> Result<(), DomainError> {
        self.state.lock().await.change_log.push(entry.clone());
        Ok(())
    }

    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<ChangeLogEntry>, DomainError> {
        let state = self.state.lock().await;
        let mut entries: Vec<ChangeLogEntry> = state
            .change_log
            .iter()
            .filter(|e| &e.membership_id == membership_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(entries)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn create_membership(
        &self,
        membership: &Membership,
        ledger: &QuotaLedger,
    ) -> Result<(), MembershipError> {
        let mut state = self.state.lock().await;
        if state
            .memberships
            .iter()
            .any(|m| m.subscriber_id == membership.subscriber_id && is_live(m))
        {
            return Err(MembershipError::already_exists(
                membership.subscriber_id.clone(),
            ));
        }
        state.memberships.push(membership.clone());
        state.ledgers.push(ledger.clone());
        Ok(())
    }

    async fn commit_transition(
        &self,
        membership: &Membership,
        entry: &ChangeLogEntry,
        new_ledger: Option<&QuotaLedger>,
    ) -> Result<(), MembershipError> {
        let mut state = self.state.lock().await;
        let slot = state
            .memberships
            .iter_mut()
            .find(|m| m.id == membership.id)
            .ok_or(MembershipError::NotFound(membership.id))?;
        *slot = membership.clone();
        state.change_log.push(entry.clone());
        if let Some(ledger) = new_ledger {
            state.ledgers.push(ledger.clone());
        }
        Ok(())
    }

    async fn consume_quota(
        &self,
        membership_id: &MembershipId,
        resource: QuotaResource,
        amount: u32,
        allowances: &QuotaAllowances,
        now: Timestamp,
    ) -> Result<QuotaCheck, MembershipError> {
        let mut state = self.state.lock().await;
        let membership = state
            .memberships
            .iter()
            .find(|m| &m.id == membership_id)
            .ok_or(MembershipError::NotFound(*membership_id))?;
        if !membership.status.can_consume() {
            return Err(MembershipError::invalid_state(
                format!("{:?}", membership.status),
                "consume quota on",
            ));
        }
        let end_date = membership.end_date;
        let cycle = membership.billing_cycle;
        // Open the period lazily when no ledger covers now
        if !state
            .ledgers
            .iter()
            .any(|l| &l.membership_id == membership_id && l.covers(now))
        {
            let period_end = match end_date {
                Some(end) if now.is_before(&end) => end,
                _ => now.add_months(cycle.months()),
            };
            state
                .ledgers
                .push(QuotaLedger::open(*membership_id, now, period_end, now));
        }
        let ledger = state
            .ledgers
            .iter_mut()
            .find(|l| &l.membership_id == membership_id && l.covers(now))
            .ok_or(MembershipError::NoCurrentLedger(*membership_id))?;
        ledger.try_consume(resource, amount, allowances, now)
    }

    async fn redeem_coupon(
        &self,
        membership_id: &MembershipId,
        code: &str,
        now: Timestamp,
    ) -> Result<Redemption, MembershipError> {
        let mut state = self.state.lock().await;
        let membership = state
            .memberships
            .iter()
            .find(|m| &m.id == membership_id)
            .cloned()
            .ok_or(MembershipError::NotFound(*membership_id))?;
        let coupon = state
            .coupons
            .iter_mut()
            .find(|c| c.code == code)
            .ok_or_else(|| MembershipError::coupon_not_found(code))?;
        coupon.validate_for(now)?;
        let coupon_id = coupon.id;
        let discount = coupon.discount_amount(membership.price);
        if state
            .redemptions
            .iter()
            .any(|r| &r.membership_id == membership_id && r.coupon_id == coupon_id)
        {
            return Err(MembershipError::already_redeemed(*membership_id, coupon_id));
        }
        // Re-borrow to mutate after the redemption check
        let coupon = state
            .coupons
            .iter_mut()
            .find(|c| c.id == coupon_id)
            .ok_or_else(|| MembershipError::infrastructure("coupon vanished mid-redemption"))?;
        coupon.mark_redeemed(now);
        let redemption = Redemption::new(*membership_id, coupon_id, discount, now);
        state.redemptions.push(redemption.clone());
        Ok(redemption)
    }
}
