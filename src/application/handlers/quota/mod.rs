//! Quota handlers.
//!
//! Read-only standing checks and atomic check-and-consume.

mod check_quota;
mod consume_quota;

pub use check_quota::{CheckQuotaCommand, CheckQuotaHandler};
pub use consume_quota::{ConsumeQuotaCommand, ConsumeQuotaHandler};
