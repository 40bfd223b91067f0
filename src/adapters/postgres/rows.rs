//! Row types and string mappings shared by the Postgres adapters.
//!
//! The unit of work reads and writes the same tables as the individual
//! stores, so the row-to-aggregate conversions live here once.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::coupon::{Coupon, Redemption};
use crate::domain::foundation::{
    ActorId, BillingCycle, ChangeLogId, CouponId, Currency, DomainError, ErrorCode, LedgerId,
    MembershipId, Money, Percentage, RedemptionId, SubscriberId, TierId, Timestamp,
};
use crate::domain::membership::{ChangeLogEntry, ChangeReason, Membership, MembershipStatus};
use crate::domain::quota::{QuotaLedger, QuotaUsage};
use crate::domain::tier::{MembershipTier, QuotaAllowances};

pub(super) fn status_to_str(status: MembershipStatus) -> &'static str {
    status.as_str()
}

pub(super) fn parse_status(s: &str) -> Result<MembershipStatus, DomainError> {
    match s {
        "active" => Ok(MembershipStatus::Active),
        "paused" => Ok(MembershipStatus::Paused),
        "cancelled" => Ok(MembershipStatus::Cancelled),
        "expired" => Ok(MembershipStatus::Expired),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )),
    }
}

pub(super) fn parse_cycle(s: &str) -> Result<BillingCycle, DomainError> {
    s.parse::<BillingCycle>()
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))
}

pub(super) fn parse_currency(s: &str) -> Result<Currency, DomainError> {
    Currency::try_new(s)
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))
}

fn u32_from_i32(field: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Negative counter in column {}: {}", field, value),
        )
    })
}

/// `memberships` table row.
#[derive(Debug, FromRow)]
pub(super) struct MembershipRow {
    pub id: Uuid,
    pub subscriber_id: String,
    pub tier_id: Uuid,
    pub price_cents: i64,
    pub currency: String,
    pub billing_cycle: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            id: MembershipId::from_uuid(row.id),
            subscriber_id: SubscriberId::new(row.subscriber_id).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid subscriber_id: {}", e),
                )
            })?,
            tier_id: TierId::from_uuid(row.tier_id),
            price: Money::from_cents(row.price_cents, parse_currency(&row.currency)?),
            billing_cycle: parse_cycle(&row.billing_cycle)?,
            status: parse_status(&row.status)?,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: row.end_date.map(Timestamp::from_datetime),
            auto_renew: row.auto_renew,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            paused_at: row.paused_at.map(Timestamp::from_datetime),
        })
    }
}

/// `tiers` table row.
#[derive(Debug, FromRow)]
pub(super) struct TierRow {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub price_cents: i64,
    pub currency: String,
    pub billing_cycle: String,
    pub consultations_limit: Option<i32>,
    pub opinions_limit: Option<i32>,
    pub services_limit: Option<i32>,
    pub cases_limit: Option<i32>,
    pub call_minutes_limit: Option<i32>,
    pub benefits: serde_json::Value,
    pub is_active: bool,
}

impl TryFrom<TierRow> for MembershipTier {
    type Error = DomainError;

    fn try_from(row: TierRow) -> Result<Self, Self::Error> {
        let limit = |field: &str, value: Option<i32>| -> Result<Option<u32>, DomainError> {
            value.map(|v| u32_from_i32(field, v)).transpose()
        };
        let benefits: Vec<String> = serde_json::from_value(row.benefits).map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid benefits payload: {}", e),
            )
        })?;
        Ok(MembershipTier {
            id: TierId::from_uuid(row.id),
            name: row.name,
            display_name: row.display_name,
            price: Money::from_cents(row.price_cents, parse_currency(&row.currency)?),
            billing_cycle: parse_cycle(&row.billing_cycle)?,
            quotas: QuotaAllowances {
                consultations: limit("consultations_limit", row.consultations_limit)?,
                opinions: limit("opinions_limit", row.opinions_limit)?,
                services: limit("services_limit", row.services_limit)?,
                cases: limit("cases_limit", row.cases_limit)?,
                call_minutes: limit("call_minutes_limit", row.call_minutes_limit)?,
            },
            benefits,
            is_active: row.is_active,
        })
    }
}

/// `quota_ledgers` table row.
#[derive(Debug, FromRow)]
pub(super) struct LedgerRow {
    pub id: Uuid,
    pub membership_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub consultations_used: i32,
    pub opinions_used: i32,
    pub services_used: i32,
    pub cases_used: i32,
    pub call_minutes_used: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for QuotaLedger {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(QuotaLedger {
            id: LedgerId::from_uuid(row.id),
            membership_id: MembershipId::from_uuid(row.membership_id),
            period_start: Timestamp::from_datetime(row.period_start),
            period_end: Timestamp::from_datetime(row.period_end),
            usage: QuotaUsage {
                consultations: u32_from_i32("consultations_used", row.consultations_used)?,
                opinions: u32_from_i32("opinions_used", row.opinions_used)?,
                services: u32_from_i32("services_used", row.services_used)?,
                cases: u32_from_i32("cases_used", row.cases_used)?,
                call_minutes: u32_from_i32("call_minutes_used", row.call_minutes_used)?,
            },
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// `coupons` table row.
#[derive(Debug, FromRow)]
pub(super) struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub discount_percent: i16,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount = u8::try_from(row.discount_percent)
            .ok()
            .and_then(|v| Percentage::try_discount(v).ok())
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid discount_percent: {}", row.discount_percent),
                )
            })?;
        Ok(Coupon {
            id: CouponId::from_uuid(row.id),
            code: row.code,
            discount,
            valid_from: Timestamp::from_datetime(row.valid_from),
            valid_until: Timestamp::from_datetime(row.valid_until),
            usage_limit: row
                .usage_limit
                .map(|v| u32_from_i32("usage_limit", v))
                .transpose()?,
            used_count: u32_from_i32("used_count", row.used_count)?,
            is_active: row.is_active,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// `coupon_redemptions` table row.
#[derive(Debug, FromRow)]
pub(super) struct RedemptionRow {
    pub id: Uuid,
    pub membership_id: Uuid,
    pub coupon_id: Uuid,
    pub discount_cents: i64,
    pub currency: String,
    pub redeemed_at: DateTime<Utc>,
}

impl TryFrom<RedemptionRow> for Redemption {
    type Error = DomainError;

    fn try_from(row: RedemptionRow) -> Result<Self, Self::Error> {
        Ok(Redemption {
            id: RedemptionId::from_uuid(row.id),
            membership_id: MembershipId::from_uuid(row.membership_id),
            coupon_id: CouponId::from_uuid(row.coupon_id),
            discount_applied: Money::from_cents(row.discount_cents, parse_currency(&row.currency)?),
            redeemed_at: Timestamp::from_datetime(row.redeemed_at),
        })
    }
}

/// `membership_change_log` table row.
#[derive(Debug, FromRow)]
pub(super) struct ChangeLogRow {
    pub id: Uuid,
    pub membership_id: Uuid,
    pub old_tier_id: Option<Uuid>,
    pub new_tier_id: Option<Uuid>,
    pub reason: String,
    pub changed_by: Option<String>,
    pub metadata: serde_json::Value,
    pub changed_at: DateTime<Utc>,
}

impl TryFrom<ChangeLogRow> for ChangeLogEntry {
    type Error = DomainError;

    fn try_from(row: ChangeLogRow) -> Result<Self, Self::Error> {
        let reason = row
            .reason
            .parse::<ChangeReason>()
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?;
        let changed_by = row
            .changed_by
            .map(ActorId::new)
            .transpose()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid changed_by: {}", e),
                )
            })?;
        Ok(ChangeLogEntry {
            id: ChangeLogId::from_uuid(row.id),
            membership_id: MembershipId::from_uuid(row.membership_id),
            old_tier_id: row.old_tier_id.map(TierId::from_uuid),
            new_tier_id: row.new_tier_id.map(TierId::from_uuid),
            reason,
            changed_by,
            metadata: row.metadata,
            changed_at: Timestamp::from_datetime(row.changed_at),
        })
    }
}
