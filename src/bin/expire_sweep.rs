//! Batch expiration sweep.
//!
//! One-shot runner intended for a cron schedule: loads configuration,
//! connects to PostgreSQL, and expires every active membership whose
//! paid period (plus the configured grace) has lapsed.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

use membercore::adapters::postgres::{PgUnitOfWork, PostgresMembershipStore};
use membercore::application::{ExpireMembershipsCommand, ExpireMembershipsHandler};
use membercore::config::AppConfig;
use membercore::domain::foundation::Timestamp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("migrations applied");
    }

    let memberships = Arc::new(PostgresMembershipStore::new(pool.clone()));
    let uow = Arc::new(PgUnitOfWork::new(pool.clone()));
    let handler = ExpireMembershipsHandler::new(memberships, uow);

    let as_of = Timestamp::now().minus_days(i64::from(config.sweep.grace_days));
    info!(grace_days = config.sweep.grace_days, "starting expiration sweep");

    let result = handler
        .handle(ExpireMembershipsCommand { as_of: Some(as_of) })
        .await?;

    if result.failed.is_empty() {
        info!(expired = result.expired.len(), "sweep complete");
    } else {
        error!(
            expired = result.expired.len(),
            failed = result.failed.len(),
            "sweep finished with failures"
        );
        std::process::exit(1);
    }

    Ok(())
}
