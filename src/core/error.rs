use crate::core::currency::CurrencyPair;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised anywhere in the exposure pipeline.
///
/// `DataUnavailable` is the only variant the pipeline recovers from on its
/// own (by switching to the synthetic series). Everything else is surfaced
/// to the caller with enough detail to fix the input.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no usable market data for {pair} between {start} and {end}: {reason}")]
    DataUnavailable {
        pair: CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("invalid contract: {field} {reason}")]
    InvalidContract { field: &'static str, reason: String },

    #[error("rate curve is incomplete: first missing date is {first_missing}")]
    IncompleteCurve { first_missing: NaiveDate },

    #[error("forward curve is for maturity {found}, contract matures {expected}")]
    MaturityMismatch { expected: NaiveDate, found: NaiveDate },

    #[error("scenario shift {shift_pct}% would take the rate to zero or below")]
    InvalidShift { shift_pct: Decimal },

    #[error("ill-formed date range: end {end} is before start {start}")]
    IllFormedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("invalid quote on {date}: {reason}")]
    InvalidQuote { date: NaiveDate, reason: String },

    #[error("rate must be positive, got {rate}")]
    InvalidRate { rate: Decimal },

    #[error("series is not strictly ascending at {date}")]
    UnorderedSeries { date: NaiveDate },

    #[error("trajectory is empty")]
    EmptyTrajectory,

    #[error("quote source '{source_name}' failed: {reason}")]
    Source { source_name: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Parse an ISO calendar date, reporting the raw value on failure.
pub fn parse_date(value: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| EngineError::InvalidDate {
        value: value.to_string(),
    })
}

/// Fail fast when `end` precedes `start`.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> EngineResult<()> {
    if end < start {
        return Err(EngineError::IllFormedDateRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_valid() {
        let d = parse_date("2025-05-03").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 5, 3).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("2025-13-40").unwrap_err();
        assert!(err.to_string().contains("2025-13-40"));
    }

    #[test]
    fn test_check_range() {
        let a = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert!(check_range(a, a).is_ok());
        assert!(check_range(a, b).is_ok());
        assert!(matches!(
            check_range(b, a),
            Err(EngineError::IllFormedDateRange { .. })
        ));
    }
}
