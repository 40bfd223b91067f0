//! Ports layer.
//!
//! Trait contracts the application layer depends on. Adapters provide
//! the concrete implementations.

mod change_log_store;
mod coupon_store;
mod membership_store;
mod quota_ledger_store;
mod tier_catalog;
mod unit_of_work;

pub use change_log_store::ChangeLogStore;
pub use coupon_store::{CouponStore, RedemptionStore};
pub use membership_store::MembershipStore;
pub use quota_ledger_store::QuotaLedgerStore;
pub use tier_catalog::TierCatalog;
pub use unit_of_work::UnitOfWork;
