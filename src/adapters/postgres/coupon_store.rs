//! PostgreSQL implementations of CouponStore and RedemptionStore.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::coupon::{Coupon, Redemption};
use crate::domain::foundation::{CouponId, DomainError, MembershipId};
use crate::ports::{CouponStore, RedemptionStore};

use super::rows::{CouponRow, RedemptionRow};

const COUPON_COLUMNS: &str = "id, code, discount_percent, valid_from, valid_until, \
     usage_limit, used_count, is_active, created_at, updated_at";

const REDEMPTION_COLUMNS: &str =
    "id, membership_id, coupon_id, discount_cents, currency, redeemed_at";

/// PostgreSQL implementation of the CouponStore port.
pub struct PostgresCouponStore {
    pool: PgPool,
}

impl PostgresCouponStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponStore for PostgresCouponStore {
    async fn save(&self, coupon: &Coupon) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_percent, valid_from, valid_until,
                usage_limit, used_count, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(coupon.id.as_uuid())
        .bind(&coupon.code)
        .bind(coupon.discount.value() as i16)
        .bind(coupon.valid_from.as_datetime())
        .bind(coupon.valid_until.as_datetime())
        .bind(coupon.usage_limit.map(|v| v as i32))
        .bind(coupon.used_count as i32)
        .bind(coupon.is_active)
        .bind(coupon.created_at.as_datetime())
        .bind(coupon.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save coupon: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &CouponId) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {} FROM coupons WHERE id = $1",
            COUPON_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find coupon: {}", e)))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(&format!(
            "SELECT {} FROM coupons WHERE code = $1",
            COUPON_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find coupon: {}", e)))?;

        row.map(Coupon::try_from).transpose()
    }
}

/// PostgreSQL implementation of the RedemptionStore port.
pub struct PostgresRedemptionStore {
    pool: PgPool,
}

impl PostgresRedemptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedemptionStore for PostgresRedemptionStore {
    async fn find(
        &self,
        membership_id: &MembershipId,
        coupon_id: &CouponId,
    ) -> Result<Option<Redemption>, DomainError> {
        let row: Option<RedemptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM coupon_redemptions
            WHERE membership_id = $1 AND coupon_id = $2
            "#,
            REDEMPTION_COLUMNS
        ))
        .bind(membership_id.as_uuid())
        .bind(coupon_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find redemption: {}", e)))?;

        row.map(Redemption::try_from).transpose()
    }

    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<Redemption>, DomainError> {
        let rows: Vec<RedemptionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM coupon_redemptions
            WHERE membership_id = $1
            ORDER BY redeemed_at ASC
            "#,
            REDEMPTION_COLUMNS
        ))
        .bind(membership_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list redemptions: {}", e)))?;

        rows.into_iter().map(Redemption::try_from).collect()
    }
}
