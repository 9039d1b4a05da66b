use crate::core::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 4217-style currency code.
///
/// Codes are normalized to upper case so that `usd` and `USD` compare equal.
///
/// # Examples
///
/// ```
/// use fx_exposure_engine::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("usd");
/// assert_eq!(usd.as_str(), "USD");
/// assert_ne!(usd, CurrencyCode::new("INR"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A quoted exchange rate direction: 1 unit of `base` costs `rate` units of `quote`.
///
/// For a letter of credit the base is the currency the contract is
/// denominated in (e.g. USD) and the quote is the settlement currency
/// (e.g. INR).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        Self { base, quote }
    }

    /// True when both legs are the same currency (rate is identically 1).
    pub fn is_identity(&self) -> bool {
        self.base == self.quote
    }

    /// Concatenated symbol, e.g. `USDINR`.
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::new(CurrencyCode::new("USD"), CurrencyCode::new("INR"))
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = EngineError;

    /// Accepts `USD/INR` or `USDINR`.
    fn from_str(s: &str) -> EngineResult<Self> {
        let s = s.trim();
        let (base, quote) = match s.split_once('/') {
            Some((b, q)) => (b, q),
            None if s.len() == 6 && s.is_ascii() => s.split_at(3),
            None => {
                return Err(EngineError::Config(format!(
                    "invalid currency pair '{s}': expected BASE/QUOTE"
                )))
            }
        };
        if base.trim().is_empty() || quote.trim().is_empty() {
            return Err(EngineError::Config(format!(
                "invalid currency pair '{s}': empty leg"
            )));
        }
        Ok(Self::new(CurrencyCode::new(base), CurrencyCode::new(quote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_normalized() {
        assert_eq!(CurrencyCode::new(" inr "), CurrencyCode::new("INR"));
    }

    #[test]
    fn test_pair_display_and_symbol() {
        let pair = CurrencyPair::default();
        assert_eq!(pair.to_string(), "USD/INR");
        assert_eq!(pair.symbol(), "USDINR");
    }

    #[test]
    fn test_pair_parse() {
        let a: CurrencyPair = "EUR/INR".parse().unwrap();
        let b: CurrencyPair = "eurinr".parse().unwrap();
        assert_eq!(a, b);
        assert!("EURO".parse::<CurrencyPair>().is_err());
        assert!("/INR".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_identity_pair() {
        let pair = CurrencyPair::new(CurrencyCode::new("USD"), CurrencyCode::new("USD"));
        assert!(pair.is_identity());
        assert!(!CurrencyPair::default().is_identity());
    }
}
