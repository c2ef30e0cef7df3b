use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const TARGET_DECIMALS: u32 = 4;
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Rounds to [`Money::TARGET_DECIMALS`] places, ties to even.
    pub fn new(value: Decimal) -> Self {
        Self(
            value
                .round_dp_with_strategy(Self::TARGET_DECIMALS, RoundingStrategy::MidpointNearestEven)
                .normalize(),
        )
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money::new)
    }

    /// Parses a plain decimal literal (`40`, `12.5`, `-3`). Exponents, separators and
    /// non-finite spellings are rejected.
    pub fn from_decimal_str(s: &str) -> Option<Self> {
        let s = s.trim();

        if s.is_empty() {
            return None;
        }
        let neg = s.starts_with('-');
        let body = s.trim_start_matches(['-', '+']);
        if s.len() - body.len() > 1 || body.is_empty() || body == "." {
            return None;
        }
        if !body.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return None;
        }
        if body.matches('.').count() > 1 {
            return None;
        }
        let padded = format!("0{}0", body);
        let value = Decimal::from_str(if body.contains('.') { padded.as_str() } else { body }).ok()?;
        Some(Self::new(if neg { -value } else { value }))
    }

    /// JSON number literals may carry an exponent (`1e3`); plain ones go through
    /// [`Money::from_decimal_str`].
    fn from_json_number(literal: &str) -> Option<Self> {
        if literal.contains(['e', 'E']) {
            Decimal::from_scientific(literal).ok().map(Self::new)
        } else {
            Self::from_decimal_str(literal)
        }
    }
}

impl FromStr for Money {
    type Err = crate::domain::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_decimal_str(s).ok_or_else(|| crate::domain::Error::InvalidAmount(s.to_owned()))
    }
}

// Integral amounts keep one fractional digit: `100.0`.
impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let value = self.0.normalize();
        if value.scale() == 0 {
            write!(f, "{}.0", value)
        } else {
            write!(f, "{}", value)
        }
    }
}

/// Written as an exact JSON number literal; never routed through `f64`.
impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let number = serde_json::Number::from_str(&self.0.to_string()).map_err(|e| {
            ser::Error::custom(format!("Money {} is not a JSON number: {}", self.0, e))
        })?;
        number.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(number) => Money::from_json_number(&number.to_string())
                .ok_or_else(|| de::Error::custom(format!("Invalid Money value: {}", number))),
            serde_json::Value::String(text) => Money::from_decimal_str(&text)
                .ok_or_else(|| de::Error::custom(format!("Invalid Money format: {}", text))),
            other => Err(de::Error::custom(format!(
                "expected a decimal number or string, found {}",
                other
            ))),
        }
    }
}
