//! PostgreSQL implementation of UnitOfWork.
//!
//! Each method opens one transaction. Check-and-consume and coupon
//! redemption take `SELECT ... FOR UPDATE` row locks so concurrent
//! callers serialize on the row instead of double-spending.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::domain::coupon::{Coupon, Redemption};
use crate::domain::foundation::{MembershipId, Money, Timestamp};
use crate::domain::membership::{ChangeLogEntry, Membership, MembershipError};
use crate::domain::quota::{QuotaCheck, QuotaLedger};
use crate::domain::tier::{QuotaAllowances, QuotaResource};
use crate::ports::UnitOfWork;

use super::rows::{parse_currency, parse_cycle, parse_status, status_to_str, CouponRow, LedgerRow};

/// PostgreSQL implementation of the UnitOfWork port.
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infra(context: &str, e: sqlx::Error) -> MembershipError {
    MembershipError::infrastructure(format!("{}: {}", context, e))
}

async fn insert_membership(
    conn: &mut PgConnection,
    membership: &Membership,
) -> Result<(), MembershipError> {
    sqlx::query(
        r#"
        INSERT INTO memberships (
            id, subscriber_id, tier_id, price_cents, currency, billing_cycle,
            status, start_date, end_date, auto_renew, created_at, updated_at,
            cancelled_at, paused_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(membership.id.as_uuid())
    .bind(membership.subscriber_id.as_str())
    .bind(membership.tier_id.as_uuid())
    .bind(membership.price.amount_cents)
    .bind(membership.price.currency.as_str())
    .bind(membership.billing_cycle.as_str())
    .bind(status_to_str(membership.status))
    .bind(membership.start_date.as_datetime())
    .bind(membership.end_date.map(|t| *t.as_datetime()))
    .bind(membership.auto_renew)
    .bind(membership.created_at.as_datetime())
    .bind(membership.updated_at.as_datetime())
    .bind(membership.cancelled_at.map(|t| *t.as_datetime()))
    .bind(membership.paused_at.map(|t| *t.as_datetime()))
    .execute(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db) = &e {
            if db.constraint() == Some("memberships_one_live_per_subscriber") {
                return MembershipError::already_exists(membership.subscriber_id.clone());
            }
        }
        infra("Failed to insert membership", e)
    })?;
    Ok(())
}

async fn insert_ledger(
    conn: &mut PgConnection,
    ledger: &QuotaLedger,
) -> Result<(), MembershipError> {
    sqlx::query(
        r#"
        INSERT INTO quota_ledgers (
            id, membership_id, period_start, period_end,
            consultations_used, opinions_used, services_used, cases_used,
            call_minutes_used, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(ledger.id.as_uuid())
    .bind(ledger.membership_id.as_uuid())
    .bind(ledger.period_start.as_datetime())
    .bind(ledger.period_end.as_datetime())
    .bind(ledger.usage.consultations as i32)
    .bind(ledger.usage.opinions as i32)
    .bind(ledger.usage.services as i32)
    .bind(ledger.usage.cases as i32)
    .bind(ledger.usage.call_minutes as i32)
    .bind(ledger.created_at.as_datetime())
    .bind(ledger.updated_at.as_datetime())
    .execute(conn)
    .await
    .map_err(|e| infra("Failed to insert quota ledger", e))?;
    Ok(())
}

async fn insert_change_log(
    conn: &mut PgConnection,
    entry: &ChangeLogEntry,
) -> Result<(), MembershipError> {
    sqlx::query(
        r#"
        INSERT INTO membership_change_log (
            id, membership_id, old_tier_id, new_tier_id, reason,
            changed_by, metadata, changed_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.membership_id.as_uuid())
    .bind(entry.old_tier_id.map(|t| *t.as_uuid()))
    .bind(entry.new_tier_id.map(|t| *t.as_uuid()))
    .bind(entry.reason.as_str())
    .bind(entry.changed_by.as_ref().map(|a| a.as_str()))
    .bind(&entry.metadata)
    .bind(entry.changed_at.as_datetime())
    .execute(conn)
    .await
    .map_err(|e| infra("Failed to append change log entry", e))?;
    Ok(())
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn create_membership(
        &self,
        membership: &Membership,
        ledger: &QuotaLedger,
    ) -> Result<(), MembershipError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infra("Failed to begin transaction", e))?;

        insert_membership(&mut *tx, membership).await?;
        insert_ledger(&mut *tx, ledger).await?;

        tx.commit()
            .await
            .map_err(|e| infra("Failed to commit transaction", e))?;
        Ok(())
    }

    async fn commit_transition(
        &self,
        membership: &Membership,
        entry: &ChangeLogEntry,
        new_ledger: Option<&QuotaLedger>,
    ) -> Result<(), MembershipError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infra("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE memberships SET
                tier_id = $2,
                price_cents = $3,
                currency = $4,
                billing_cycle = $5,
                status = $6,
                end_date = $7,
                auto_renew = $8,
                updated_at = $9,
                cancelled_at = $10,
                paused_at = $11
            WHERE id = $1
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.tier_id.as_uuid())
        .bind(membership.price.amount_cents)
        .bind(membership.price.currency.as_str())
        .bind(membership.billing_cycle.as_str())
        .bind(status_to_str(membership.status))
        .bind(membership.end_date.map(|t| *t.as_datetime()))
        .bind(membership.auto_renew)
        .bind(membership.updated_at.as_datetime())
        .bind(membership.cancelled_at.map(|t| *t.as_datetime()))
        .bind(membership.paused_at.map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| infra("Failed to update membership", e))?;

        if result.rows_affected() == 0 {
            return Err(MembershipError::NotFound(membership.id));
        }

        insert_change_log(&mut *tx, entry).await?;
        if let Some(ledger) = new_ledger {
            insert_ledger(&mut *tx, ledger).await?;
        }

        tx.commit()
            .await
            .map_err(|e| infra("Failed to commit transaction", e))?;
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
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infra("Failed to begin transaction", e))?;

        // The membership row lock also serializes concurrent lazy period
        // opens, so at most one ledger ever covers an instant
        let head: Option<(String, Option<chrono::DateTime<chrono::Utc>>, String)> =
            sqlx::query_as(
                "SELECT status, end_date, billing_cycle FROM memberships WHERE id = $1 FOR UPDATE",
            )
            .bind(membership_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| infra("Failed to load membership", e))?;
        let (status, end_date, cycle) = head.ok_or(MembershipError::NotFound(*membership_id))?;
        if !parse_status(&status)?.can_consume() {
            return Err(MembershipError::invalid_state(status, "consume quota on"));
        }

        // Row lock serializes concurrent consumers of the same period
        let row: Option<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, membership_id, period_start, period_end,
                   consultations_used, opinions_used, services_used, cases_used,
                   call_minutes_used, created_at, updated_at
            FROM quota_ledgers
            WHERE membership_id = $1 AND period_start <= $2 AND period_end > $2
            ORDER BY period_start DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(membership_id.as_uuid())
        .bind(now.as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| infra("Failed to lock quota ledger", e))?;

        let mut ledger = match row {
            Some(row) => QuotaLedger::try_from(row)?,
            None => {
                // No period covers now; open one lazily up to the end date,
                // or one cycle out when the end date is missing or behind us
                let end_date = end_date.map(Timestamp::from_datetime);
                let period_end = match end_date {
                    Some(end) if now.is_before(&end) => end,
                    _ => now.add_months(parse_cycle(&cycle)?.months()),
                };
                let ledger = QuotaLedger::open(*membership_id, now, period_end, now);
                insert_ledger(&mut *tx, &ledger).await?;
                ledger
            }
        };

        let check = ledger.try_consume(resource, amount, allowances, now)?;

        sqlx::query(
            r#"
            UPDATE quota_ledgers SET
                consultations_used = $2,
                opinions_used = $3,
                services_used = $4,
                cases_used = $5,
                call_minutes_used = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(ledger.id.as_uuid())
        .bind(ledger.usage.consultations as i32)
        .bind(ledger.usage.opinions as i32)
        .bind(ledger.usage.services as i32)
        .bind(ledger.usage.cases as i32)
        .bind(ledger.usage.call_minutes as i32)
        .bind(ledger.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| infra("Failed to update quota ledger", e))?;

        tx.commit()
            .await
            .map_err(|e| infra("Failed to commit transaction", e))?;
        Ok(check)
    }

    async fn redeem_coupon(
        &self,
        membership_id: &MembershipId,
        code: &str,
        now: Timestamp,
    ) -> Result<Redemption, MembershipError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| infra("Failed to begin transaction", e))?;

        let price: Option<(i64, String)> =
            sqlx::query_as("SELECT price_cents, currency FROM memberships WHERE id = $1")
                .bind(membership_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| infra("Failed to load membership", e))?;
        let (price_cents, currency) = price.ok_or(MembershipError::NotFound(*membership_id))?;
        let price = Money::from_cents(price_cents, parse_currency(&currency)?);

        // Lock the coupon so the global cap check and the increment are one
        // unit under concurrency
        let row: Option<CouponRow> = sqlx::query_as(
            r#"
            SELECT id, code, discount_percent, valid_from, valid_until,
                   usage_limit, used_count, is_active, created_at, updated_at
            FROM coupons
            WHERE code = $1
            FOR UPDATE
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| infra("Failed to lock coupon", e))?;

        let mut coupon =
            Coupon::try_from(row.ok_or_else(|| MembershipError::coupon_not_found(code))?)?;

        coupon.validate_for(now)?;
        coupon.mark_redeemed(now);

        let redemption =
            Redemption::new(*membership_id, coupon.id, coupon.discount_amount(price), now);
        sqlx::query(
            r#"
            INSERT INTO coupon_redemptions (
                id, membership_id, coupon_id, discount_cents, currency, redeemed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(redemption.id.as_uuid())
        .bind(redemption.membership_id.as_uuid())
        .bind(redemption.coupon_id.as_uuid())
        .bind(redemption.discount_applied.amount_cents)
        .bind(redemption.discount_applied.currency.as_str())
        .bind(redemption.redeemed_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.constraint() == Some("coupon_redemptions_membership_id_coupon_id_key") {
                    return MembershipError::already_redeemed(*membership_id, redemption.coupon_id);
                }
            }
            infra("Failed to insert redemption", e)
        })?;

        sqlx::query("UPDATE coupons SET used_count = $2, updated_at = $3 WHERE id = $1")
            .bind(coupon.id.as_uuid())
            .bind(coupon.used_count as i32)
            .bind(coupon.updated_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| infra("Failed to update coupon usage", e))?;

        tx.commit()
            .await
            .map_err(|e| infra("Failed to commit transaction", e))?;
        Ok(redemption)
    }
}
