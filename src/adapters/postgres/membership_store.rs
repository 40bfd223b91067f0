//! PostgreSQL implementation of MembershipStore.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, MembershipId, SubscriberId, Timestamp};
use crate::domain::membership::Membership;
use crate::ports::MembershipStore;

use super::rows::{status_to_str, MembershipRow};

const MEMBERSHIP_COLUMNS: &str = "id, subscriber_id, tier_id, price_cents, currency, \
     billing_cycle, status, start_date, end_date, auto_renew, created_at, updated_at, \
     cancelled_at, paused_at";

/// PostgreSQL implementation of the MembershipStore port.
///
/// The one-live-membership-per-subscriber rule is backed by a partial
/// unique index over subscriber_id where status is active or paused.
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn save(&self, membership: &Membership) -> Result<(), DomainError> {
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
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("memberships_one_live_per_subscriber") {
                    return DomainError::new(
                        ErrorCode::MembershipExists,
                        "Subscriber already has a live membership",
                    );
                }
            }
            DomainError::database(format!("Failed to save membership: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, membership: &Membership) -> Result<(), DomainError> {
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
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update membership: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::MembershipNotFound,
                "Membership not found",
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &MembershipId) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE id = $1",
            MEMBERSHIP_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find membership: {}", e)))?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_by_subscriber_id(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<Option<Membership>, DomainError> {
        // Live membership first, then the most recent terminal one
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM memberships
            WHERE subscriber_id = $1
            ORDER BY (status IN ('active', 'paused')) DESC, created_at DESC
            LIMIT 1
            "#,
            MEMBERSHIP_COLUMNS
        ))
        .bind(subscriber_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find membership: {}", e)))?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_lapsed(&self, now: Timestamp) -> Result<Vec<Membership>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM memberships
            WHERE status = 'active'
              AND end_date IS NOT NULL
              AND end_date < $1
            ORDER BY end_date ASC
            "#,
            MEMBERSHIP_COLUMNS
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find lapsed memberships: {}", e)))?;

        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn find_expiring_within(
        &self,
        now: Timestamp,
        days: i64,
    ) -> Result<Vec<Membership>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM memberships
            WHERE status = 'active'
              AND end_date >= $1
              AND end_date < $2
            ORDER BY end_date ASC
            "#,
            MEMBERSHIP_COLUMNS
        ))
        .bind(now.as_datetime())
        .bind(*now.add_days(days).as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to find expiring memberships: {}", e))
        })?;

        rows.into_iter().map(Membership::try_from).collect()
    }
}
