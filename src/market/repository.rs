//! Market-data access with source fallback.

use crate::config::RepositoryConfig;
use crate::core::currency::CurrencyPair;
use crate::core::error::{check_range, EngineError, EngineResult};
use crate::core::quote::{Quote, RawQuote};
use crate::market::cache::{CacheStats, RateCache};
use crate::market::source::QuoteSource;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

/// Availability of one source as seen by [`RateSeriesRepository::health_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHealth {
    pub name: String,
    pub available: bool,
}

/// Returns validated daily quotes for a pair, trying each source in order.
///
/// A source error, an empty answer or a timeout moves on to the next
/// source. When every source fails the caller gets `DataUnavailable`.
/// Current rates are cached; historical ranges are not.
pub struct RateSeriesRepository {
    sources: Vec<Arc<dyn QuoteSource>>,
    cache: RateCache,
    timeout: StdDuration,
}

impl RateSeriesRepository {
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>, config: &RepositoryConfig) -> Self {
        Self {
            sources,
            cache: RateCache::new(
                Duration::seconds(config.cache_ttl_secs),
                config.cache_max_entries,
            ),
            timeout: StdDuration::from_millis(config.fetch_timeout_ms),
        }
    }

    /// A repository with no sources. Every fetch is `DataUnavailable`.
    pub fn empty() -> Self {
        Self::new(Vec::new(), &RepositoryConfig::default())
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Daily quotes for `pair` in `[start, end]`, sorted ascending.
    ///
    /// Only the days a source actually has are returned; gaps are left for
    /// the [`GapFiller`](crate::market::gap_fill::GapFiller).
    pub fn fetch(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<Quote>> {
        check_range(start, end)?;

        if pair.is_identity() {
            debug!("{pair} is a same-currency pair, returning a flat series");
            return start
                .iter_days()
                .take_while(|d| *d <= end)
                .map(|d| Quote::new(d, Decimal::ONE, Decimal::ONE, Decimal::ONE, Decimal::ONE, 0, true))
                .collect();
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            if !source.supports_pair(pair) {
                debug!("source '{}' does not carry {pair}", source.name());
                continue;
            }

            let request_pair = pair.clone();
            let result = self.call_with_timeout(source, move |s| {
                s.fetch_range(&request_pair, start, end)
            });

            match result {
                Ok(rows) => {
                    let quotes = validate_rows(source.name(), rows, start, end);
                    if quotes.is_empty() {
                        warn!("source '{}' returned no usable rows for {pair}", source.name());
                        failures.push(format!("{}: empty", source.name()));
                        continue;
                    }
                    info!(
                        "fetched {} quotes for {pair} from '{}' ({start} to {end})",
                        quotes.len(),
                        source.name()
                    );
                    return Ok(quotes);
                }
                Err(e) => {
                    warn!("source '{}' failed for {pair}: {e}", source.name());
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }

        let reason = if failures.is_empty() {
            "no source carries this pair".to_string()
        } else {
            failures.join("; ")
        };
        Err(EngineError::DataUnavailable {
            pair: pair.clone(),
            start,
            end,
            reason,
        })
    }

    /// Latest rate for `pair`, served from the cache when fresh.
    pub fn current_rate(&self, pair: &CurrencyPair) -> EngineResult<Decimal> {
        self.current_rate_at(pair, Utc::now())
    }

    /// Same as [`current_rate`](Self::current_rate) with an explicit clock.
    pub fn current_rate_at(&self, pair: &CurrencyPair, now: DateTime<Utc>) -> EngineResult<Decimal> {
        if pair.is_identity() {
            return Ok(Decimal::ONE);
        }
        if let Some(rate) = self.cache.get(pair, now) {
            return Ok(rate);
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            if !source.supports_pair(pair) {
                continue;
            }
            let request_pair = pair.clone();
            match self.call_with_timeout(source, move |s| s.current_rate(&request_pair)) {
                Ok(rate) if rate > Decimal::ZERO => {
                    debug!("current rate for {pair} from '{}': {rate}", source.name());
                    self.cache.insert(pair.clone(), rate, now);
                    return Ok(rate);
                }
                Ok(rate) => {
                    warn!("source '{}' returned non-positive rate {rate} for {pair}", source.name());
                    failures.push(format!("{}: non-positive rate", source.name()));
                }
                Err(e) => {
                    warn!("source '{}' has no current rate for {pair}: {e}", source.name());
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }

        let today = now.date_naive();
        Err(EngineError::DataUnavailable {
            pair: pair.clone(),
            start: today,
            end: today,
            reason: if failures.is_empty() {
                "no source carries this pair".to_string()
            } else {
                failures.join("; ")
            },
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(Utc::now())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("current-rate cache cleared");
    }

    /// Ask every source for a current rate of `pair` and report which answered.
    pub fn health_check(&self, pair: &CurrencyPair) -> Vec<SourceHealth> {
        self.sources
            .iter()
            .map(|source| {
                let request_pair = pair.clone();
                let available = matches!(
                    self.call_with_timeout(source, move |s| s.current_rate(&request_pair)),
                    Ok(rate) if rate > Decimal::ZERO
                );
                SourceHealth {
                    name: source.name().to_string(),
                    available,
                }
            })
            .collect()
    }

    /// Run `call` against `source` on a helper thread, giving up after the
    /// configured timeout. An abandoned call finishes in the background and
    /// its result is dropped.
    fn call_with_timeout<T, F>(&self, source: &Arc<dyn QuoteSource>, call: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn QuoteSource) -> EngineResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker_source = Arc::clone(source);
        thread::Builder::new()
            .name(format!("quote-source-{}", source.name()))
            .spawn(move || {
                let _ = tx.send(call(worker_source.as_ref()));
            })
            .map_err(|e| EngineError::Source {
                source_name: source.name().to_string(),
                reason: format!("could not spawn worker: {e}"),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Source {
                source_name: source.name().to_string(),
                reason: format!("timed out after {} ms", self.timeout.as_millis()),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Source {
                source_name: source.name().to_string(),
                reason: "worker exited without a result".to_string(),
            }),
        }
    }
}

/// Keep rows inside the range with valid prices, first row per date wins.
fn validate_rows(
    source_name: &str,
    mut rows: Vec<RawQuote>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Quote> {
    rows.sort_by_key(|r| r.date);
    let mut quotes: Vec<Quote> = Vec::with_capacity(rows.len());
    for raw in &rows {
        if raw.date < start || raw.date > end {
            warn!("'{source_name}': dropping row {} outside {start}..={end}", raw.date);
            continue;
        }
        if quotes.last().map(|q| q.date()) == Some(raw.date) {
            warn!("'{source_name}': dropping duplicate row for {}", raw.date);
            continue;
        }
        match Quote::from_raw(raw) {
            Ok(q) => quotes.push(q),
            Err(e) => warn!("'{source_name}': dropping row: {e}"),
        }
    }
    quotes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::source::StaticQuoteSource;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    struct FailingSource;

    impl QuoteSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch_range(
            &self,
            _pair: &CurrencyPair,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> EngineResult<Vec<RawQuote>> {
            Err(EngineError::Source {
                source_name: "failing".to_string(),
                reason: "connection refused".to_string(),
            })
        }

        fn current_rate(&self, _pair: &CurrencyPair) -> EngineResult<Decimal> {
            Err(EngineError::Source {
                source_name: "failing".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    struct SlowSource;

    impl QuoteSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        fn fetch_range(
            &self,
            _pair: &CurrencyPair,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> EngineResult<Vec<RawQuote>> {
            thread::sleep(StdDuration::from_millis(500));
            Ok(vec![RawQuote::flat(start, dec!(99))])
        }

        fn current_rate(&self, _pair: &CurrencyPair) -> EngineResult<Decimal> {
            thread::sleep(StdDuration::from_millis(500));
            Ok(dec!(99))
        }
    }

    fn failing() -> Arc<dyn QuoteSource> {
        Arc::new(FailingSource)
    }

    fn slow() -> Arc<dyn QuoteSource> {
        Arc::new(SlowSource)
    }

    fn sheet() -> Arc<dyn QuoteSource> {
        Arc::new(StaticQuoteSource::new("sheet").with_series(
            CurrencyPair::default(),
            vec![
                RawQuote::flat(date(1), dec!(83.0)),
                RawQuote::flat(date(2), dec!(83.2)),
                RawQuote::flat(date(5), dec!(83.4)),
            ],
        ))
    }

    fn fast_config() -> RepositoryConfig {
        RepositoryConfig {
            fetch_timeout_ms: 50,
            ..RepositoryConfig::default()
        }
    }

    #[test]
    fn test_falls_back_to_next_source() {
        let repo = RateSeriesRepository::new(vec![failing(), sheet()], &fast_config());
        let quotes = repo.fetch(&CurrencyPair::default(), date(1), date(5)).unwrap();
        assert_eq!(quotes.len(), 3);
        assert!(quotes.iter().all(|q| q.is_observed()));
    }

    #[test]
    fn test_timeout_counts_as_failure() {
        let repo = RateSeriesRepository::new(vec![slow(), sheet()], &fast_config());
        let quotes = repo.fetch(&CurrencyPair::default(), date(1), date(5)).unwrap();
        assert_eq!(quotes[0].close(), dec!(83.0));
    }

    #[test]
    fn test_all_sources_fail() {
        let repo = RateSeriesRepository::new(vec![failing()], &fast_config());
        let err = repo.fetch(&CurrencyPair::default(), date(1), date(5)).unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
    }

    #[test]
    fn test_empty_answer_is_unavailable() {
        let repo = RateSeriesRepository::new(vec![sheet()], &fast_config());
        let err = repo.fetch(&CurrencyPair::default(), date(10), date(12)).unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
    }

    #[test]
    fn test_ill_formed_range() {
        let repo = RateSeriesRepository::new(vec![sheet()], &fast_config());
        let err = repo.fetch(&CurrencyPair::default(), date(5), date(1)).unwrap_err();
        assert!(matches!(err, EngineError::IllFormedDateRange { .. }));
    }

    #[test]
    fn test_identity_pair_is_flat() {
        let repo = RateSeriesRepository::empty();
        let pair: CurrencyPair = "INR/INR".parse().unwrap();
        let quotes = repo.fetch(&pair, date(1), date(3)).unwrap();
        assert_eq!(quotes.len(), 3);
        assert!(quotes.iter().all(|q| q.close() == Decimal::ONE));
    }

    #[test]
    fn test_invalid_and_duplicate_rows_dropped() {
        let rows = vec![
            RawQuote::flat(date(2), dec!(83.2)),
            RawQuote::flat(date(2), dec!(90.0)),
            RawQuote::flat(date(3), dec!(-1)),
            RawQuote::flat(date(9), dec!(83.5)),
            RawQuote::flat(date(1), dec!(83.1)),
        ];
        let quotes = validate_rows("t", rows, date(1), date(5));
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].date(), date(1));
        assert_eq!(quotes[1].close(), dec!(83.2));
    }

    #[test]
    fn test_current_rate_is_cached() {
        let repo = RateSeriesRepository::new(vec![sheet()], &fast_config());
        let now = Utc::now();
        let pair = CurrencyPair::default();
        assert_eq!(repo.current_rate_at(&pair, now).unwrap(), dec!(83.4));
        assert_eq!(repo.cache_stats().valid_entries, 1);
        repo.clear_cache();
        assert_eq!(repo.cache_stats().total_entries, 0);
    }

    #[test]
    fn test_health_check() {
        let repo = RateSeriesRepository::new(vec![failing(), sheet()], &fast_config());
        let health = repo.health_check(&CurrencyPair::default());
        assert_eq!(health.len(), 2);
        assert!(!health[0].available);
        assert!(health[1].available);
    }
}
