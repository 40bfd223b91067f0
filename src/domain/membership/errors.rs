//! Membership-specific error types.
//!
//! Typed failures surfaced by the lifecycle, quota, and coupon use cases.
//!
//! # Boundary Mapping
//!
//! | Error | Category |
//! |-------|----------|
//! | NotFound / TierNotFound / CouponNotFound | NotFound |
//! | AlreadyExists / AlreadyRedeemed / SameTier | Conflict |
//! | InvalidState | InvalidState |
//! | QuotaExceeded | QuotaExceeded |
//! | InvalidCoupon / CouponExhausted | Validation |
//! | ValidationFailed | Validation |
//! | Infrastructure | Internal |

use crate::domain::foundation::{CouponId, DomainError, ErrorCode, MembershipId, SubscriberId, TierId};
use crate::domain::tier::QuotaResource;

/// Membership-domain errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    /// Membership was not found.
    NotFound(MembershipId),

    /// Tier was not found in the catalog.
    TierNotFound(TierId),

    /// Target tier is not open for subscription.
    TierNotSubscribable(TierId),

    /// Subscriber already has an active membership.
    AlreadyExists(SubscriberId),

    /// Coupon code was not found.
    CouponNotFound(String),

    /// Coupon cannot be applied.
    InvalidCoupon { code: String, reason: String },

    /// Coupon has reached its usage limit.
    CouponExhausted(String),

    /// This membership already redeemed this coupon.
    AlreadyRedeemed {
        membership_id: MembershipId,
        coupon_id: CouponId,
    },

    /// Tier change to the identical tier.
    SameTier(TierId),

    /// Operation attempted from a state that forbids it.
    InvalidState { current: String, attempted: String },

    /// No quota ledger covers the current billing period.
    NoCurrentLedger(MembershipId),

    /// Consumption beyond the remaining allowance.
    QuotaExceeded {
        resource: QuotaResource,
        limit: u32,
        used: u32,
    },

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl MembershipError {
    pub fn not_found(id: MembershipId) -> Self {
        MembershipError::NotFound(id)
    }

    pub fn tier_not_found(id: TierId) -> Self {
        MembershipError::TierNotFound(id)
    }

    pub fn tier_not_subscribable(id: TierId) -> Self {
        MembershipError::TierNotSubscribable(id)
    }

    pub fn already_exists(subscriber_id: SubscriberId) -> Self {
        MembershipError::AlreadyExists(subscriber_id)
    }

    pub fn coupon_not_found(code: impl Into<String>) -> Self {
        MembershipError::CouponNotFound(code.into())
    }

    pub fn invalid_coupon(code: impl Into<String>, reason: impl Into<String>) -> Self {
        MembershipError::InvalidCoupon {
            code: code.into(),
            reason: reason.into(),
        }
    }

    pub fn coupon_exhausted(code: impl Into<String>) -> Self {
        MembershipError::CouponExhausted(code.into())
    }

    pub fn already_redeemed(membership_id: MembershipId, coupon_id: CouponId) -> Self {
        MembershipError::AlreadyRedeemed {
            membership_id,
            coupon_id,
        }
    }

    pub fn same_tier(id: TierId) -> Self {
        MembershipError::SameTier(id)
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        MembershipError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn no_current_ledger(membership_id: MembershipId) -> Self {
        MembershipError::NoCurrentLedger(membership_id)
    }

    pub fn quota_exceeded(resource: QuotaResource, limit: u32, used: u32) -> Self {
        MembershipError::QuotaExceeded {
            resource,
            limit,
            used,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MembershipError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        MembershipError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MembershipError::NotFound(_) => ErrorCode::MembershipNotFound,
            MembershipError::TierNotFound(_) | MembershipError::TierNotSubscribable(_) => {
                ErrorCode::TierNotFound
            }
            MembershipError::AlreadyExists(_) => ErrorCode::MembershipExists,
            MembershipError::CouponNotFound(_) => ErrorCode::CouponNotFound,
            MembershipError::InvalidCoupon { .. } => ErrorCode::InvalidCoupon,
            MembershipError::CouponExhausted(_) => ErrorCode::CouponExhausted,
            MembershipError::AlreadyRedeemed { .. } => ErrorCode::CouponAlreadyRedeemed,
            MembershipError::SameTier(_) => ErrorCode::SameTier,
            MembershipError::NoCurrentLedger(_) => ErrorCode::LedgerNotFound,
            MembershipError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            MembershipError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            MembershipError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            MembershipError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a caller-facing error message.
    pub fn message(&self) -> String {
        match self {
            MembershipError::NotFound(id) => format!("Membership not found: {}", id),
            MembershipError::TierNotFound(id) => format!("Tier not found: {}", id),
            MembershipError::TierNotSubscribable(id) => {
                format!("Tier {} is not open for subscription", id)
            }
            MembershipError::AlreadyExists(subscriber_id) => {
                format!("Subscriber {} already has an active membership", subscriber_id)
            }
            MembershipError::CouponNotFound(code) => format!("Coupon not found: {}", code),
            MembershipError::InvalidCoupon { code, reason } => {
                format!("Coupon '{}' cannot be applied: {}", code, reason)
            }
            MembershipError::CouponExhausted(code) => {
                format!("Coupon '{}' has reached its usage limit", code)
            }
            MembershipError::AlreadyRedeemed {
                membership_id,
                coupon_id,
            } => format!(
                "Membership {} already redeemed coupon {}",
                membership_id, coupon_id
            ),
            MembershipError::SameTier(id) => {
                format!("Membership is already on tier {}", id)
            }
            MembershipError::NoCurrentLedger(membership_id) => format!(
                "No quota ledger covers the current period for membership {}",
                membership_id
            ),
            MembershipError::InvalidState { current, attempted } => {
                format!("Cannot {} membership in {} state", attempted, current)
            }
            MembershipError::QuotaExceeded {
                resource,
                limit,
                used,
            } => format!(
                "Quota exceeded for {}: limit {}, used {}",
                resource, limit, used
            ),
            MembershipError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            MembershipError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    ///
    /// Business-rule violations are never retryable; the caller must
    /// resolve the precondition and resubmit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MembershipError::Infrastructure(_))
    }
}

impl std::fmt::Display for MembershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MembershipError {}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => MembershipError::InvalidState {
                current: err
                    .details
                    .get("current")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                attempted: err.message,
            },
            ErrorCode::SameTier => MembershipError::ValidationFailed {
                field: "tier_id".to_string(),
                message: err.message,
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => MembershipError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => MembershipError::Infrastructure(err.to_string()),
        }
    }
}

impl From<MembershipError> for DomainError {
    fn from(err: MembershipError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_membership_id() -> MembershipId {
        MembershipId::new()
    }

    fn test_subscriber_id() -> SubscriberId {
        SubscriberId::new("sub-test-123").unwrap()
    }

    #[test]
    fn not_found_maps_to_membership_not_found_code() {
        let err = MembershipError::not_found(test_membership_id());
        assert_eq!(err.code(), ErrorCode::MembershipNotFound);
    }

    #[test]
    fn already_exists_is_conflict() {
        let err = MembershipError::already_exists(test_subscriber_id());
        assert!(err.code().is_conflict());
        assert!(err.message().contains("sub-test-123"));
    }

    #[test]
    fn already_redeemed_is_conflict() {
        let err = MembershipError::already_redeemed(test_membership_id(), CouponId::new());
        assert_eq!(err.code(), ErrorCode::CouponAlreadyRedeemed);
        assert!(err.code().is_conflict());
    }

    #[test]
    fn quota_exceeded_carries_resource_limit_used() {
        let err = MembershipError::quota_exceeded(QuotaResource::Consultations, 5, 5);
        assert_eq!(err.code(), ErrorCode::QuotaExceeded);
        let msg = err.message();
        assert!(msg.contains("consultations"));
        assert!(msg.contains("limit 5"));
        assert!(msg.contains("used 5"));
    }

    #[test]
    fn invalid_coupon_message_includes_code_and_reason() {
        let err = MembershipError::invalid_coupon("SAVE10", "outside validity window");
        let msg = err.message();
        assert!(msg.contains("SAVE10"));
        assert!(msg.contains("outside validity window"));
    }

    #[test]
    fn only_infrastructure_is_retryable() {
        assert!(MembershipError::infrastructure("timeout").is_retryable());
        assert!(!MembershipError::quota_exceeded(QuotaResource::Cases, 1, 1).is_retryable());
        assert!(!MembershipError::validation("months", "out of range").is_retryable());
    }

    #[test]
    fn display_matches_message() {
        let err = MembershipError::coupon_exhausted("SAVE10");
        assert_eq!(format!("{}", err), err.message());
    }

    #[test]
    fn invalid_state_domain_error_converts_to_invalid_state() {
        let domain_err = DomainError::new(
            ErrorCode::InvalidStateTransition,
            "Cannot transition membership from Cancelled to Cancelled",
        );
        let err: MembershipError = domain_err.into();
        assert!(matches!(err, MembershipError::InvalidState { .. }));
    }

    #[test]
    fn database_domain_error_converts_to_infrastructure() {
        let domain_err = DomainError::database("connection lost");
        let err: MembershipError = domain_err.into();
        assert!(matches!(err, MembershipError::Infrastructure(_)));
    }

    #[test]
    fn converts_to_domain_error_with_same_code() {
        let err = MembershipError::same_tier(TierId::new());
        let domain_err: DomainError = err.clone().into();
        assert_eq!(domain_err.code, err.code());
    }
}
