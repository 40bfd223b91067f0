//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a membership.
    MembershipId
}

uuid_id! {
    /// Unique identifier for a membership tier.
    TierId
}

uuid_id! {
    /// Unique identifier for a discount coupon.
    CouponId
}

uuid_id! {
    /// Unique identifier for a coupon redemption record.
    RedemptionId
}

uuid_id! {
    /// Unique identifier for a quota ledger period.
    LedgerId
}

uuid_id! {
    /// Unique identifier for a change-log entry.
    ChangeLogId
}

/// Subscriber identifier (typically from the identity provider).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(String);

impl SubscriberId {
    /// Creates a new SubscriberId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::empty_field("subscriber_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actor identifier for audit entries. Either a subscriber, an admin, or
/// the literal "system" for batch jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// The system actor used by batch jobs.
    pub fn system() -> Self {
        Self("system".to_string())
    }

    /// Creates a new ActorId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::empty_field("actor_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_id_new_is_unique() {
        assert_ne!(MembershipId::new(), MembershipId::new());
    }

    #[test]
    fn membership_id_roundtrips_through_string() {
        let id = MembershipId::new();
        let parsed: MembershipId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn tier_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = TierId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = CouponId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn subscriber_id_rejects_empty() {
        assert!(SubscriberId::new("").is_err());
    }

    #[test]
    fn subscriber_id_accepts_non_empty() {
        let id = SubscriberId::new("sub-123").unwrap();
        assert_eq!(id.as_str(), "sub-123");
    }

    #[test]
    fn actor_system_is_literal() {
        assert_eq!(ActorId::system().as_str(), "system");
    }

    #[test]
    fn actor_id_rejects_empty() {
        assert!(ActorId::new("").is_err());
    }
}
