//! Forward-fill of sparse trading-day series into calendar-day series.

use crate::core::currency::CurrencyPair;
use crate::core::error::{check_range, EngineError, EngineResult};
use crate::core::quote::Quote;
use chrono::NaiveDate;
use log::debug;

/// Turns a sparse quote series into exactly one quote per calendar day.
///
/// A missing day repeats the most recent preceding close with flat OHLC,
/// zero volume and `is_observed = false`. Quotes dated before the window
/// only seed the fill; they are not emitted. Nothing is interpolated and no
/// later value ever leaks backwards.
///
/// # Examples
///
/// ```
/// use fx_exposure_engine::core::currency::CurrencyPair;
/// use fx_exposure_engine::core::quote::{Quote, RawQuote};
/// use fx_exposure_engine::market::gap_fill::GapFiller;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let friday = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
/// let monday = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
/// let raw = vec![
///     Quote::from_raw(&RawQuote::flat(friday, dec!(83.10))).unwrap(),
///     Quote::from_raw(&RawQuote::flat(monday, dec!(83.30))).unwrap(),
/// ];
///
/// let filled = GapFiller::new(CurrencyPair::default()).fill(&raw, friday, monday).unwrap();
/// assert_eq!(filled.len(), 4);
/// assert_eq!(filled[2].close(), dec!(83.10));
/// assert!(!filled[2].is_observed());
/// ```
#[derive(Debug, Clone)]
pub struct GapFiller {
    pair: CurrencyPair,
}

impl GapFiller {
    pub fn new(pair: CurrencyPair) -> Self {
        Self { pair }
    }

    /// Fill `[start, end]` from `raw`, which must be strictly ascending.
    pub fn fill(&self, raw: &[Quote], start: NaiveDate, end: NaiveDate) -> EngineResult<Vec<Quote>> {
        check_range(start, end)?;
        for w in raw.windows(2) {
            if w[1].date() <= w[0].date() {
                return Err(EngineError::UnorderedSeries { date: w[1].date() });
            }
        }

        let first_in_window = raw.partition_point(|q| q.date() < start);
        let mut last_close = raw[..first_in_window].last().map(|q| q.close());
        let mut observed = raw[first_in_window..]
            .iter()
            .take_while(|q| q.date() <= end)
            .peekable();

        let mut filled = Vec::new();
        let mut synthesized = 0usize;
        for day in start.iter_days().take_while(|d| *d <= end) {
            if let Some(quote) = observed.next_if(|q| q.date() == day) {
                last_close = Some(quote.close());
                filled.push(quote.clone());
                continue;
            }
            let close = last_close.ok_or_else(|| EngineError::DataUnavailable {
                pair: self.pair.clone(),
                start,
                end,
                reason: format!("no observed quote on or before {day} to fill from"),
            })?;
            filled.push(Quote::filled(day, close)?);
            synthesized += 1;
        }

        debug!(
            "filled {} days for {} ({} synthesized)",
            filled.len(),
            self.pair,
            synthesized
        );
        Ok(filled)
    }
}
