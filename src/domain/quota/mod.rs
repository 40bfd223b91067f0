//! Quota consumption domain.

mod ledger;

pub use ledger::{QuotaCheck, QuotaLedger, QuotaUsage};
