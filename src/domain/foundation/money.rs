//! Money value object.
//!
//! All monetary amounts are stored as integer cents with an ISO-4217
//! currency code. Arithmetic never touches floating point; proration and
//! discount math use i128 intermediates with round-half-up.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Percentage, ValidationError};

/// A validated ISO-4217 currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    /// US dollars, the catalog default.
    pub const USD: Self = Self(*b"USD");

    /// Creates a Currency, validating the three-letter uppercase format.
    pub fn try_new(code: &str) -> Result<Self, ValidationError> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("expected three uppercase letters, got '{}'", code),
            ));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl serde::Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Currency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Currency::try_new(&s).map_err(serde::de::Error::custom)
    }
}

/// An immutable amount of money in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (cents).
    pub amount_cents: i64,
    /// ISO-4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Creates a Money value from integer cents.
    pub fn from_cents(amount_cents: i64, currency: Currency) -> Self {
        Self {
            amount_cents,
            currency,
        }
    }

    /// Creates a non-negative Money value, rejecting negative amounts.
    pub fn try_non_negative(amount_cents: i64, currency: Currency) -> Result<Self, ValidationError> {
        if amount_cents < 0 {
            return Err(ValidationError::out_of_range(
                "amount_cents",
                0,
                i64::MAX,
                amount_cents,
            ));
        }
        Ok(Self::from_cents(amount_cents, currency))
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::from_cents(0, currency)
    }

    /// Returns true when the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount_cents == 0
    }

    /// Signed difference `self - other`.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch; amounts in different currencies
    /// are never comparable.
    pub fn diff(&self, other: &Money) -> Result<Money, ValidationError> {
        self.require_same_currency(other)?;
        Ok(Money::from_cents(
            self.amount_cents - other.amount_cents,
            self.currency,
        ))
    }

    /// The given percentage of this amount, rounded half-up on cents.
    pub fn percentage_of(&self, pct: Percentage) -> Money {
        let numer = i128::from(self.amount_cents) * i128::from(pct.value());
        Money::from_cents(div_round_half_up(numer, 100), self.currency)
    }

    /// Scales this amount by `remaining / total` whole days, rounded
    /// half-up on cents. Used for mid-period proration.
    ///
    /// Returns zero when `total_days` is zero.
    pub fn prorate(&self, remaining_days: i64, total_days: i64) -> Money {
        if total_days <= 0 {
            return Money::zero(self.currency);
        }
        let numer = i128::from(self.amount_cents) * i128::from(remaining_days);
        Money::from_cents(div_round_half_up(numer, total_days), self.currency)
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), ValidationError> {
        if self.currency != other.currency {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("mismatched currencies {} and {}", self.currency, other.currency),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.amount_cents / 100;
        let cents = (self.amount_cents % 100).abs();
        write!(f, "{}.{:02} {}", whole, cents, self.currency)
    }
}

/// Integer division rounding half away from zero.
fn div_round_half_up(numer: i128, denom: i64) -> i64 {
    let denom = i128::from(denom);
    let half = denom / 2;
    let adjusted = if numer >= 0 { numer + half } else { numer - half };
    (adjusted / denom) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, Currency::USD)
    }

    #[test]
    fn currency_accepts_valid_codes() {
        assert_eq!(Currency::try_new("EUR").unwrap().as_str(), "EUR");
        assert_eq!(Currency::try_new("USD").unwrap(), Currency::USD);
    }

    #[test]
    fn currency_rejects_invalid_codes() {
        assert!(Currency::try_new("usd").is_err());
        assert!(Currency::try_new("US").is_err());
        assert!(Currency::try_new("USDX").is_err());
        assert!(Currency::try_new("U$D").is_err());
    }

    #[test]
    fn try_non_negative_rejects_negative() {
        assert!(Money::try_non_negative(-1, Currency::USD).is_err());
        assert!(Money::try_non_negative(0, Currency::USD).is_ok());
    }

    #[test]
    fn diff_requires_same_currency() {
        let a = usd(500);
        let b = Money::from_cents(300, Currency::try_new("EUR").unwrap());
        assert!(a.diff(&b).is_err());
    }

    #[test]
    fn diff_can_be_negative() {
        let a = usd(300);
        let b = usd(500);
        assert_eq!(a.diff(&b).unwrap().amount_cents, -200);
    }

    #[test]
    fn ten_percent_of_200_units_is_20_units() {
        // The SAVE10 scenario: 10% of a 200-unit price is 20 units.
        let price = usd(200_00);
        let discount = price.percentage_of(Percentage::try_new(10).unwrap());
        assert_eq!(discount.amount_cents, 20_00);
    }

    #[test]
    fn percentage_of_rounds_half_up() {
        // 15% of 10 cents = 1.5 cents, rounds to 2
        let m = usd(10);
        assert_eq!(m.percentage_of(Percentage::try_new(15).unwrap()).amount_cents, 2);
    }

    #[test]
    fn prorate_scales_by_remaining_days() {
        // 3000 cents over 30 days, 10 days remaining = 1000 cents
        let m = usd(3000);
        assert_eq!(m.prorate(10, 30).amount_cents, 1000);
    }

    #[test]
    fn prorate_with_zero_total_days_is_zero() {
        assert_eq!(usd(3000).prorate(10, 0).amount_cents, 0);
    }

    #[test]
    fn prorate_negative_difference_stays_negative() {
        // Downgrade proration carries the sign through
        let m = usd(-3000);
        assert_eq!(m.prorate(15, 30).amount_cents, -1500);
    }

    #[test]
    fn display_formats_cents() {
        assert_eq!(format!("{}", usd(1234)), "12.34 USD");
        assert_eq!(format!("{}", usd(5)), "0.05 USD");
    }

    #[test]
    fn money_serializes_with_currency_code() {
        let json = serde_json::to_string(&usd(1500)).unwrap();
        assert!(json.contains("\"amount_cents\":1500"));
        assert!(json.contains("\"USD\""));
    }

    proptest! {
        #[test]
        fn percentage_of_never_exceeds_original(cents in 0i64..1_000_000_000, pct in 0u8..=100) {
            let m = usd(cents);
            let part = m.percentage_of(Percentage::new(pct));
            prop_assert!(part.amount_cents <= m.amount_cents);
            prop_assert!(part.amount_cents >= 0);
        }

        #[test]
        fn prorate_is_bounded_by_original(cents in 0i64..1_000_000_000, remaining in 0i64..365, total in 1i64..366) {
            prop_assume!(remaining <= total);
            let m = usd(cents);
            let p = m.prorate(remaining, total);
            prop_assert!(p.amount_cents <= m.amount_cents);
            prop_assert!(p.amount_cents >= 0);
        }

        #[test]
        fn full_proration_is_identity(cents in 0i64..1_000_000_000, total in 1i64..366) {
            let m = usd(cents);
            prop_assert_eq!(m.prorate(total, total).amount_cents, cents);
        }
    }
}
