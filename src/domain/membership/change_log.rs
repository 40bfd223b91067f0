//! Append-only audit trail of lifecycle transitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{ActorId, ChangeLogId, MembershipId, TierId, Timestamp, ValidationError};

/// Why a membership changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Upgrade,
    Downgrade,
    Renewal,
    Cancellation,
    Reactivation,
    Pause,
    Resume,
    Expiration,
    AdminChange,
}

impl ChangeReason {
    /// Storage representation of this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeReason::Upgrade => "upgrade",
            ChangeReason::Downgrade => "downgrade",
            ChangeReason::Renewal => "renewal",
            ChangeReason::Cancellation => "cancellation",
            ChangeReason::Reactivation => "reactivation",
            ChangeReason::Pause => "pause",
            ChangeReason::Resume => "resume",
            ChangeReason::Expiration => "expiration",
            ChangeReason::AdminChange => "admin_change",
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangeReason {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upgrade" => Ok(ChangeReason::Upgrade),
            "downgrade" => Ok(ChangeReason::Downgrade),
            "renewal" => Ok(ChangeReason::Renewal),
            "cancellation" => Ok(ChangeReason::Cancellation),
            "reactivation" => Ok(ChangeReason::Reactivation),
            "pause" => Ok(ChangeReason::Pause),
            "resume" => Ok(ChangeReason::Resume),
            "expiration" => Ok(ChangeReason::Expiration),
            "admin_change" => Ok(ChangeReason::AdminChange),
            other => Err(ValidationError::invalid_format(
                "change_reason",
                format!("unknown reason '{}'", other),
            )),
        }
    }
}

/// One append-only audit record. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Unique identifier for this entry.
    pub id: ChangeLogId,

    /// Membership this entry belongs to.
    pub membership_id: MembershipId,

    /// Tier before the change, when a tier was involved.
    pub old_tier_id: Option<TierId>,

    /// Tier after the change, when a tier was involved.
    pub new_tier_id: Option<TierId>,

    /// Why the membership changed.
    pub reason: ChangeReason,

    /// Who triggered the change. None for subscriber self-service paths
    /// that carry no actor.
    pub changed_by: Option<ActorId>,

    /// Free-form context (pause reasons, prorated amounts, durations).
    pub metadata: Value,

    /// When the change happened.
    pub changed_at: Timestamp,
}

impl ChangeLogEntry {
    /// Creates an entry with no tier involvement.
    pub fn new(membership_id: MembershipId, reason: ChangeReason) -> Self {
        Self {
            id: ChangeLogId::new(),
            membership_id,
            old_tier_id: None,
            new_tier_id: None,
            reason,
            changed_by: None,
            metadata: Value::Null,
            changed_at: Timestamp::now(),
        }
    }

    /// Creates an entry recording a tier change.
    pub fn tier_change(
        membership_id: MembershipId,
        reason: ChangeReason,
        old_tier_id: TierId,
        new_tier_id: TierId,
    ) -> Self {
        Self {
            old_tier_id: Some(old_tier_id),
            new_tier_id: Some(new_tier_id),
            ..Self::new(membership_id, reason)
        }
    }

    /// Attaches the acting party.
    pub fn by(mut self, actor: ActorId) -> Self {
        self.changed_by = Some(actor);
        self
    }

    /// Attaches free-form metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}
