//! Billing cycle value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Recurring period length used for pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    /// Length of one billing period in whole months.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Yearly => 12,
        }
    }

    /// All cycles, in ascending length order.
    pub fn all() -> [BillingCycle; 3] {
        [
            BillingCycle::Monthly,
            BillingCycle::Quarterly,
            BillingCycle::Yearly,
        ]
    }

    /// Storage representation of this cycle.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Quarterly => "quarterly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(BillingCycle::Monthly),
            "quarterly" => Ok(BillingCycle::Quarterly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(ValidationError::invalid_format(
                "billing_cycle",
                format!("unknown cycle '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_per_cycle() {
        assert_eq!(BillingCycle::Monthly.months(), 1);
        assert_eq!(BillingCycle::Quarterly.months(), 3);
        assert_eq!(BillingCycle::Yearly.months(), 12);
    }

    #[test]
    fn parses_known_cycles_case_insensitively() {
        assert_eq!("monthly".parse::<BillingCycle>().unwrap(), BillingCycle::Monthly);
        assert_eq!("Quarterly".parse::<BillingCycle>().unwrap(), BillingCycle::Quarterly);
        assert_eq!("YEARLY".parse::<BillingCycle>().unwrap(), BillingCycle::Yearly);
    }

    #[test]
    fn rejects_unknown_cycle() {
        assert!("weekly".parse::<BillingCycle>().is_err());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for cycle in BillingCycle::all() {
            let parsed: BillingCycle = cycle.to_string().parse().unwrap();
            assert_eq!(cycle, parsed);
        }
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&BillingCycle::Quarterly).unwrap();
        assert_eq!(json, "\"quarterly\"");
    }
}
