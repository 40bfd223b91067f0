//! PostgreSQL implementation of QuotaLedgerStore.
//!
//! Read and insert only. Counter increments go through the unit of work
//! so they happen under the ledger row lock.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, MembershipId, Timestamp};
use crate::domain::quota::QuotaLedger;
use crate::ports::QuotaLedgerStore;

use super::rows::LedgerRow;

const LEDGER_COLUMNS: &str = "id, membership_id, period_start, period_end, \
     consultations_used, opinions_used, services_used, cases_used, call_minutes_used, \
     created_at, updated_at";

/// PostgreSQL implementation of the QuotaLedgerStore port.
pub struct PostgresQuotaLedgerStore {
    pool: PgPool,
}

impl PostgresQuotaLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaLedgerStore for PostgresQuotaLedgerStore {
    async fn save(&self, ledger: &QuotaLedger) -> Result<(), DomainError> {
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
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save quota ledger: {}", e)))?;

        Ok(())
    }

    async fn find_current(
        &self,
        membership_id: &MembershipId,
        at: Timestamp,
    ) -> Result<Option<QuotaLedger>, DomainError> {
        let row: Option<LedgerRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM quota_ledgers
            WHERE membership_id = $1 AND period_start <= $2 AND period_end > $2
            ORDER BY period_start DESC
            LIMIT 1
            "#,
            LEDGER_COLUMNS
        ))
        .bind(membership_id.as_uuid())
        .bind(at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find quota ledger: {}", e)))?;

        row.map(QuotaLedger::try_from).transpose()
    }

    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<QuotaLedger>, DomainError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM quota_ledgers
            WHERE membership_id = $1
            ORDER BY period_start DESC
            "#,
            LEDGER_COLUMNS
        ))
        .bind(membership_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list quota ledgers: {}", e)))?;

        rows.into_iter().map(QuotaLedger::try_from).collect()
    }
}
