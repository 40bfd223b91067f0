//! PostgreSQL adapters.

mod change_log_store;
mod coupon_store;
mod membership_store;
mod quota_ledger_store;
mod rows;
mod tier_catalog;
mod unit_of_work;

pub use change_log_store::PostgresChangeLogStore;
pub use coupon_store::{PostgresCouponStore, PostgresRedemptionStore};
pub use membership_store::PostgresMembershipStore;
pub use quota_ledger_store::PostgresQuotaLedgerStore;
pub use tier_catalog::PostgresTierCatalog;
pub use unit_of_work::PgUnitOfWork;
