//! Quote source trait and the in-memory table implementation.

use crate::core::currency::CurrencyPair;
use crate::core::error::{EngineError, EngineResult};
use crate::core::quote::RawQuote;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A provider of raw daily quotes.
///
/// Implementations may be sparse (weekends, holidays) and may fail; the
/// [`RateSeriesRepository`](crate::market::repository::RateSeriesRepository)
/// turns failures into fallbacks. Calls run on a helper thread, hence the
/// `Send + Sync` bound.
pub trait QuoteSource: Send + Sync {
    /// Source name used in logs and health checks.
    fn name(&self) -> &str;

    /// Daily rows for `pair` between `start` and `end` inclusive.
    fn fetch_range(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<RawQuote>>;

    /// Latest known rate for `pair`.
    fn current_rate(&self, pair: &CurrencyPair) -> EngineResult<Decimal>;

    /// Whether this source carries `pair` at all.
    fn supports_pair(&self, _pair: &CurrencyPair) -> bool {
        true
    }
}

/// On-disk shape of a quote table: one pair, many daily rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteFile {
    pub pair: String,
    pub quotes: Vec<RawQuote>,
}

/// Quote source backed by an in-memory table, e.g. a vendor export or a
/// rate sheet supplied by the user.
///
/// # Examples
///
/// ```
/// use fx_exposure_engine::core::currency::CurrencyPair;
/// use fx_exposure_engine::core::quote::RawQuote;
/// use fx_exposure_engine::market::source::{QuoteSource, StaticQuoteSource};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let pair = CurrencyPair::default();
/// let day = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
/// let source = StaticQuoteSource::new("sheet")
///     .with_series(pair.clone(), vec![RawQuote::flat(day, dec!(84.10))]);
///
/// assert_eq!(source.current_rate(&pair).unwrap(), dec!(84.10));
/// assert_eq!(source.fetch_range(&pair, day, day).unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteSource {
    name: String,
    series: HashMap<CurrencyPair, Vec<RawQuote>>,
}

impl StaticQuoteSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: HashMap::new(),
        }
    }

    /// Add (or replace) the rows for one pair. Rows are kept sorted by date.
    pub fn with_series(mut self, pair: CurrencyPair, quotes: Vec<RawQuote>) -> Self {
        self.insert_series(pair, quotes);
        self
    }

    pub fn insert_series(&mut self, pair: CurrencyPair, mut quotes: Vec<RawQuote>) {
        quotes.sort_by_key(|q| q.date);
        self.series.insert(pair, quotes);
    }

    /// Load a [`QuoteFile`] from disk.
    pub fn from_json_file(name: impl Into<String>, path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| EngineError::Source {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file: QuoteFile = serde_json::from_str(&content).map_err(|e| EngineError::Source {
            source_name: path.display().to_string(),
            reason: format!("invalid quote file: {e}"),
        })?;
        let pair = file.pair.parse()?;
        Ok(Self::new(name).with_series(pair, file.quotes))
    }

    pub fn pairs(&self) -> Vec<&CurrencyPair> {
        self.series.keys().collect()
    }
}

impl QuoteSource for StaticQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_range(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<RawQuote>> {
        let rows = self.series.get(pair).ok_or_else(|| EngineError::Source {
            source_name: self.name.clone(),
            reason: format!("no series for {pair}"),
        })?;
        Ok(rows
            .iter()
            .filter(|q| q.date >= start && q.date <= end)
            .cloned()
            .collect())
    }

    fn current_rate(&self, pair: &CurrencyPair) -> EngineResult<Decimal> {
        self.series
            .get(pair)
            .and_then(|rows| rows.last())
            .map(|q| q.close)
            .ok_or_else(|| EngineError::Source {
                source_name: self.name.clone(),
                reason: format!("no current rate for {pair}"),
            })
    }

    fn supports_pair(&self, pair: &CurrencyPair) -> bool {
        self.series.contains_key(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_static_source_filters_range() {
        let pair = CurrencyPair::default();
        let source = StaticQuoteSource::new("t").with_series(
            pair.clone(),
            vec![
                RawQuote::flat(date(5), dec!(83.3)),
                RawQuote::flat(date(1), dec!(83.1)),
                RawQuote::flat(date(2), dec!(83.2)),
            ],
        );
        let rows = source.fetch_range(&pair, date(2), date(5)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date(2));
        assert_eq!(source.current_rate(&pair).unwrap(), dec!(83.3));
    }

    #[test]
    fn test_static_source_unknown_pair() {
        let source = StaticQuoteSource::new("t");
        let pair: CurrencyPair = "EUR/INR".parse().unwrap();
        assert!(!source.supports_pair(&pair));
        assert!(source.fetch_range(&pair, date(1), date(2)).is_err());
        assert!(source.current_rate(&pair).is_err());
    }

    #[test]
    fn test_quote_file_parses_numbers_and_strings() {
        let file: QuoteFile = serde_json::from_str(
            r#"{ "pair": "USD/INR", "quotes": [
                { "date": "2025-05-02", "open": "83.1", "high": 83.4, "low": "83.0", "close": "83.2", "volume": 1200 },
                { "date": "2025-05-05", "open": 83.2, "high": 83.5, "low": 83.1, "close": 83.3 }
            ] }"#,
        )
        .unwrap();
        assert_eq!(file.quotes.len(), 2);
        assert_eq!(file.quotes[1].volume, 0);
        assert_eq!(file.quotes[0].close, dec!(83.2));
    }
}
