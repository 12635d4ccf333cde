use rust_decimal::Decimal;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Payout amounts, exact to the configured decimal places.
pub type Amount = Decimal;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = JsonValue::deserialize(deserializer)?;
        match raw {
            JsonValue::String(s) => Ok(Uid::new(s)),
            JsonValue::Number(n) => Ok(Uid::new(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "uid must be a string, got {other}"
            ))),
        }
    }
}

/// Reads an amount from loosely typed rule config.
///
/// Numbers and numeric strings are taken at their exact decimal value.
/// Everything else, including negatives and `null`, reads as zero.
pub fn amount_from_value(value: &JsonValue) -> Amount {
    let parsed = match value {
        JsonValue::Number(n) => parse_amount(&n.to_string()),
        JsonValue::String(s) => parse_amount(s.trim()),
        _ => None,
    };
    parsed
        .filter(|v| !v.is_sign_negative())
        .map(|v| v.normalize())
        .unwrap_or(Decimal::ZERO)
}

fn parse_amount(text: &str) -> Option<Amount> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
