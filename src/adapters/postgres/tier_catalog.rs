//! PostgreSQL implementation of TierCatalog.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, TierId};
use crate::domain::tier::MembershipTier;
use crate::ports::TierCatalog;

use super::rows::TierRow;

const TIER_COLUMNS: &str = "id, name, display_name, price_cents, currency, billing_cycle, \
     consultations_limit, opinions_limit, services_limit, cases_limit, call_minutes_limit, \
     benefits, is_active";

/// PostgreSQL implementation of the TierCatalog port.
pub struct PostgresTierCatalog {
    pool: PgPool,
}

impl PostgresTierCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierCatalog for PostgresTierCatalog {
    async fn find_by_id(&self, id: &TierId) -> Result<Option<MembershipTier>, DomainError> {
        let row: Option<TierRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tiers WHERE id = $1",
            TIER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find tier: {}", e)))?;

        row.map(MembershipTier::try_from).transpose()
    }

    async fn list_subscribable(&self) -> Result<Vec<MembershipTier>, DomainError> {
        let rows: Vec<TierRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tiers WHERE is_active ORDER BY price_cents ASC",
            TIER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list tiers: {}", e)))?;

        rows.into_iter().map(MembershipTier::try_from).collect()
    }
}
