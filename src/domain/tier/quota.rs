//! Metered resource types and per-tier allowances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// A meterable, billable action type with a per-period allotment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaResource {
    Consultations,
    Opinions,
    Services,
    Cases,
    CallMinutes,
}

impl QuotaResource {
    /// All metered resources.
    pub fn all() -> [QuotaResource; 5] {
        [
            QuotaResource::Consultations,
            QuotaResource::Opinions,
            QuotaResource::Services,
            QuotaResource::Cases,
            QuotaResource::CallMinutes,
        ]
    }

    /// Storage representation of this resource.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaResource::Consultations => "consultations",
            QuotaResource::Opinions => "opinions",
            QuotaResource::Services => "services",
            QuotaResource::Cases => "cases",
            QuotaResource::CallMinutes => "call_minutes",
        }
    }
}

impl fmt::Display for QuotaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuotaResource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consultations" => Ok(QuotaResource::Consultations),
            "opinions" => Ok(QuotaResource::Opinions),
            "services" => Ok(QuotaResource::Services),
            "cases" => Ok(QuotaResource::Cases),
            "call_minutes" => Ok(QuotaResource::CallMinutes),
            other => Err(ValidationError::invalid_format(
                "quota_resource",
                format!("unknown resource '{}'", other),
            )),
        }
    }
}

/// Per-billing-period allowances for each metered resource.
///
/// `None` means unlimited. This is the one canonical resource-to-limit
/// lookup; nothing else in the crate maps resources to tier fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaAllowances {
    pub consultations: Option<u32>,
    pub opinions: Option<u32>,
    pub services: Option<u32>,
    pub cases: Option<u32>,
    pub call_minutes: Option<u32>,
}

impl QuotaAllowances {
    /// Every resource unlimited.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// The per-period limit for a resource, `None` when unlimited.
    pub fn limit_for(&self, resource: QuotaResource) -> Option<u32> {
        match resource {
            QuotaResource::Consultations => self.consultations,
            QuotaResource::Opinions => self.opinions,
            QuotaResource::Services => self.services,
            QuotaResource::Cases => self.cases,
            QuotaResource::CallMinutes => self.call_minutes,
        }
    }

    /// Builder-style setter, used by tests and catalog seeding.
    pub fn with_limit(mut self, resource: QuotaResource, limit: u32) -> Self {
        match resource {
            QuotaResource::Consultations => self.consultations = Some(limit),
            QuotaResource::Opinions => self.opinions = Some(limit),
            QuotaResource::Services => self.services = Some(limit),
            QuotaResource::Cases => self.cases = Some(limit),
            QuotaResource::CallMinutes => self.call_minutes = Some(limit),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_str_roundtrips() {
        for resource in QuotaResource::all() {
            let parsed: QuotaResource = resource.as_str().parse().unwrap();
            assert_eq!(resource, parsed);
        }
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert!("minutes".parse::<QuotaResource>().is_err());
    }

    #[test]
    fn default_allowances_are_unlimited() {
        let allowances = QuotaAllowances::unlimited();
        for resource in QuotaResource::all() {
            assert_eq!(allowances.limit_for(resource), None);
        }
    }

    #[test]
    fn with_limit_sets_only_that_resource() {
        let allowances = QuotaAllowances::unlimited().with_limit(QuotaResource::Consultations, 5);
        assert_eq!(allowances.limit_for(QuotaResource::Consultations), Some(5));
        assert_eq!(allowances.limit_for(QuotaResource::Opinions), None);
    }

    #[test]
    fn resource_serializes_snake_case() {
        let json = serde_json::to_string(&QuotaResource::CallMinutes).unwrap();
        assert_eq!(json, "\"call_minutes\"");
    }
}
