//! Deterministic synthetic quote series.
//!
//! Used when no source can cover a window. The series is a bounded random
//! walk around a per-pair base rate, seeded from the start date and the pair
//! so the same request always yields the same series.

use crate::config::SyntheticConfig;
use crate::core::currency::CurrencyPair;
use crate::core::error::{check_range, EngineError, EngineResult};
use crate::core::quote::Quote;
use chrono::{Datelike, NaiveDate};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Seed derived from the window start and the pair symbol (FNV-1a).
fn seed_for(pair: &CurrencyPair, start: NaiveDate) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let day = i64::from(start.num_days_from_ce()).to_le_bytes();
    for byte in pair.symbol().bytes().chain(day) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// One unobserved quote per calendar day in `[start, end]`.
///
/// Every quote is flagged `is_observed = false`; closes stay within
/// `base * (1 ± band_pct / 100)`.
pub fn generate_synthetic_series(
    pair: &CurrencyPair,
    start: NaiveDate,
    end: NaiveDate,
    config: &SyntheticConfig,
) -> EngineResult<Vec<Quote>> {
    check_range(start, end)?;

    if pair.is_identity() {
        return start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| Quote::filled(d, Decimal::ONE))
            .collect();
    }

    let base = config.base_rate(&pair.symbol());
    if base <= Decimal::ZERO {
        return Err(EngineError::InvalidRate { rate: base });
    }
    let band = config.band_pct / Decimal::ONE_HUNDRED;
    let floor = base * (Decimal::ONE - band);
    let ceiling = base * (Decimal::ONE + band);

    let sigma = (config.daily_volatility_pct / Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0);
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| EngineError::Config(format!("synthetic volatility: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed_for(pair, start));

    let mut series = Vec::new();
    let mut previous = base;
    for (i, day) in start.iter_days().take_while(|d| *d <= end).enumerate() {
        let close = if i == 0 {
            base
        } else {
            let shock = Decimal::from_f64(normal.sample(&mut rng)).unwrap_or(Decimal::ZERO);
            (previous * (Decimal::ONE + shock))
                .clamp(floor, ceiling)
                .round_dp(4)
        };
        let open = previous;
        series.push(Quote::new(
            day,
            open,
            open.max(close),
            open.min(close),
            close,
            0,
            false,
        )?);
        previous = close;
    }

    info!(
        "generated {} synthetic quotes for {pair} from base {base}",
        series.len()
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_one_quote_per_day_all_unobserved() {
        let series = generate_synthetic_series(
            &CurrencyPair::default(),
            date(1, 1),
            date(3, 31),
            &SyntheticConfig::default(),
        )
        .unwrap();
        assert_eq!(series.len(), 90);
        assert!(series.iter().all(|q| !q.is_observed()));
        assert_eq!(series[0].close(), dec!(83.0));
        for w in series.windows(2) {
            assert_eq!((w[1].date() - w[0].date()).num_days(), 1);
        }
    }

    #[test]
    fn test_deterministic() {
        let config = SyntheticConfig::default();
        let pair = CurrencyPair::default();
        let a = generate_synthetic_series(&pair, date(2, 1), date(4, 1), &config).unwrap();
        let b = generate_synthetic_series(&pair, date(2, 1), date(4, 1), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stays_within_band() {
        let config = SyntheticConfig {
            daily_volatility_pct: dec!(5),
            band_pct: dec!(10),
            ..SyntheticConfig::default()
        };
        let pair: CurrencyPair = "EUR/INR".parse().unwrap();
        let series = generate_synthetic_series(&pair, date(1, 1), date(12, 31), &config).unwrap();
        assert!(series
            .iter()
            .all(|q| q.close() >= dec!(81) && q.close() <= dec!(99)));
    }

    #[test]
    fn test_unknown_pair_uses_default_base() {
        let pair: CurrencyPair = "CHF/JPY".parse().unwrap();
        let series =
            generate_synthetic_series(&pair, date(1, 1), date(1, 1), &SyntheticConfig::default())
                .unwrap();
        assert_eq!(series[0].close(), dec!(85.0));
    }

    #[test]
    fn test_ill_formed_range() {
        let err = generate_synthetic_series(
            &CurrencyPair::default(),
            date(2, 1),
            date(1, 1),
            &SyntheticConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::IllFormedDateRange { .. }));
    }
}
