use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// ISO 4217 alphabetic currency code attached to a convention's prices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct CurrencyCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid currency code '{0}': expected three letters")]
pub struct InvalidCurrencyCode(pub String);

impl CurrencyCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidCurrencyCode> {
        let trimmed = raw.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(InvalidCurrencyCode(raw.to_string()))
        }
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
