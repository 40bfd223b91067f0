//! PostgreSQL implementation of ChangeLogStore.
//!
//! Insert and select only; the table carries no UPDATE or DELETE path.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, MembershipId};
use crate::domain::membership::ChangeLogEntry;
use crate::ports::ChangeLogStore;

use super::rows::ChangeLogRow;

/// PostgreSQL implementation of the ChangeLogStore port.
pub struct PostgresChangeLogStore {
    pool: PgPool,
}

impl PostgresChangeLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeLogStore for PostgresChangeLogStore {
    async fn append(&self, entry: &ChangeLogEntry) -> Result<(), DomainError> {
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
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append change log entry: {}", e)))?;

        Ok(())
    }

    async fn find_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Vec<ChangeLogEntry>, DomainError> {
        let rows: Vec<ChangeLogRow> = sqlx::query_as(
            r#"
            SELECT id, membership_id, old_tier_id, new_tier_id, reason,
                   changed_by, metadata, changed_at
            FROM membership_change_log
            WHERE membership_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(membership_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load change log: {}", e)))?;

        rows.into_iter().map(ChangeLogEntry::try_from).collect()
    }
}
