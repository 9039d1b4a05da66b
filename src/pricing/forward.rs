//! Forward exchange rates from spot and an annualized interest rate.
//!
//! Uses continuous compounding on an Actual/365 day count:
//!
//! ```text
//! F = S * exp(r / 100 / 365 * days)
//! ```
//!
//! Everything is computed in `Decimal`; rounding happens only at display time.

use crate::core::error::{check_range, EngineError, EngineResult};
use crate::core::quote::{ForwardQuote, ForwardSource, Quote};
use chrono::NaiveDate;
use log::debug;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tenors quoted by [`ForwardRateEngine::tenor_curve`] when none are given.
pub const STANDARD_TENORS: [u32; 8] = [1, 7, 30, 60, 90, 180, 270, 365];

const DAYS_PER_YEAR: Decimal = dec!(365);
const EXP_TOLERANCE: Decimal = dec!(0.000000000000000001);

/// Forward rate for one tenor, relative to the spot it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenorPoint {
    pub tenor_days: u32,
    pub forward_rate: Decimal,
    /// `forward_rate - spot`.
    pub premium: Decimal,
    /// Premium as a percentage of spot.
    pub premium_pct: Decimal,
}

impl fmt::Display for TenorPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4}d  {:>12}  {:>+10}  {:>+8}%",
            self.tenor_days,
            self.forward_rate.round_dp(4),
            self.premium.round_dp(4),
            self.premium_pct.round_dp(3)
        )
    }
}

/// Stateless forward-rate calculator.
pub struct ForwardRateEngine;

impl ForwardRateEngine {
    /// Forward rate `days` ahead of `spot`.
    ///
    /// Returns `spot` unchanged when `days` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use fx_exposure_engine::pricing::forward::ForwardRateEngine;
    /// use rust_decimal_macros::dec;
    ///
    /// assert_eq!(ForwardRateEngine::forward_rate(dec!(83.25), dec!(6.5), 0).unwrap(), dec!(83.25));
    ///
    /// let f = ForwardRateEngine::forward_rate(dec!(83.25), dec!(6.5), 90).unwrap();
    /// assert!(f > dec!(84.59) && f < dec!(84.60));
    /// ```
    pub fn forward_rate(spot: Decimal, annual_rate_percent: Decimal, days: u32) -> EngineResult<Decimal> {
        if spot <= Decimal::ZERO {
            return Err(EngineError::InvalidRate { rate: spot });
        }
        if days == 0 || annual_rate_percent.is_zero() {
            return Ok(spot);
        }
        let exponent = annual_rate_percent / Decimal::ONE_HUNDRED / DAYS_PER_YEAR * Decimal::from(days);
        let growth = exponent
            .checked_exp_with_tolerance(EXP_TOLERANCE)
            .ok_or_else(|| EngineError::Config(format!(
                "forward growth overflows at {annual_rate_percent}% over {days} days"
            )))?;
        spot.checked_mul(growth)
            .ok_or_else(|| EngineError::Config(format!("forward rate overflows for spot {spot}")))
    }

    /// Forward curve for one maturity from a contiguous daily spot series.
    ///
    /// One quote per spot day on or before `maturity`; later days are dropped.
    /// The series must be strictly ascending with no missing day.
    pub fn curve(
        spot_series: &[Quote],
        maturity: NaiveDate,
        annual_rate_percent: Decimal,
    ) -> EngineResult<Vec<ForwardQuote>> {
        Self::curve_with_source(spot_series, maturity, annual_rate_percent, ForwardSource::Calculated)
    }

    /// Same as [`curve`](Self::curve), tagging each quote with `source`.
    pub fn curve_with_source(
        spot_series: &[Quote],
        maturity: NaiveDate,
        annual_rate_percent: Decimal,
        source: ForwardSource,
    ) -> EngineResult<Vec<ForwardQuote>> {
        check_contiguous(spot_series)?;

        let curve = spot_series
            .iter()
            .take_while(|q| q.date() <= maturity)
            .map(|q| {
                let days = days_between(q.date(), maturity);
                let rate = Self::forward_rate(q.close(), annual_rate_percent, days)?;
                ForwardQuote::new(q.date(), maturity, rate, source, q.is_observed())
            })
            .collect::<EngineResult<Vec<_>>>()?;

        debug!(
            "built {} forward quotes to {maturity} at {annual_rate_percent}% ({source})",
            curve.len()
        );
        Ok(curve)
    }

    /// Forward curve read from an externally supplied date-to-rate table.
    ///
    /// Covers `[start, min(end, maturity)]`; a missing day fails with
    /// `IncompleteCurve`.
    pub fn curve_from_table(
        table: &BTreeMap<NaiveDate, Decimal>,
        maturity: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<ForwardQuote>> {
        let end = end.min(maturity);
        check_range(start, end)?;
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|day| {
                let rate = table
                    .get(&day)
                    .copied()
                    .ok_or(EngineError::IncompleteCurve { first_missing: day })?;
                ForwardQuote::new(day, maturity, rate, ForwardSource::Table, true)
            })
            .collect()
    }

    /// Forward rates for each tenor in `tenors` from a single spot.
    pub fn tenor_curve(
        spot: Decimal,
        annual_rate_percent: Decimal,
        tenors: &[u32],
    ) -> EngineResult<Vec<TenorPoint>> {
        tenors
            .iter()
            .map(|&tenor_days| {
                let forward_rate = Self::forward_rate(spot, annual_rate_percent, tenor_days)?;
                let premium = forward_rate - spot;
                Ok(TenorPoint {
                    tenor_days,
                    forward_rate,
                    premium,
                    premium_pct: premium / spot * Decimal::ONE_HUNDRED,
                })
            })
            .collect()
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    u32::try_from((to - from).num_days()).unwrap_or(0)
}

/// Strictly ascending, one day apart.
pub(crate) fn check_contiguous(series: &[Quote]) -> EngineResult<()> {
    for w in series.windows(2) {
        let (prev, next) = (w[0].date(), w[1].date());
        if next <= prev {
            return Err(EngineError::UnorderedSeries { date: next });
        }
        if let Some(expected) = prev.succ_opt() {
            if next != expected {
                return Err(EngineError::IncompleteCurve {
                    first_missing: expected,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quote::RawQuote;
    use approx::assert_relative_eq;
    use rust_decimal::prelude::ToPrimitive;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn spot(m: u32, d: u32, close: Decimal) -> Quote {
        Quote::from_raw(&RawQuote::flat(date(m, d), close)).unwrap()
    }

    #[test]
    fn test_zero_days_is_identity() {
        assert_eq!(
            ForwardRateEngine::forward_rate(dec!(83.123456789), dec!(7), 0).unwrap(),
            dec!(83.123456789)
        );
    }

    #[test]
    fn test_matches_continuous_compounding() {
        let f = ForwardRateEngine::forward_rate(dec!(83), dec!(5), 30)
            .unwrap()
            .to_f64()
            .unwrap();
        let expected = 83.0 * (0.05_f64 / 365.0 * 30.0).exp();
        assert_relative_eq!(f, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_negative_rate_gives_discount() {
        let f = ForwardRateEngine::forward_rate(dec!(83), dec!(-2), 90).unwrap();
        assert!(f < dec!(83));
    }

    #[test]
    fn test_rejects_non_positive_spot() {
        assert!(matches!(
            ForwardRateEngine::forward_rate(Decimal::ZERO, dec!(5), 10),
            Err(EngineError::InvalidRate { .. })
        ));
    }

    #[test]
    fn test_curve_counts_down_to_maturity() {
        let series: Vec<Quote> = (1..=10).map(|d| spot(5, d, dec!(83))).collect();
        let curve = ForwardRateEngine::curve(&series, date(5, 7), dec!(6)).unwrap();

        assert_eq!(curve.len(), 7);
        assert_eq!(curve[0].days_to_maturity(), 6);
        assert_eq!(curve.last().unwrap().days_to_maturity(), 0);
        assert_eq!(curve.last().unwrap().rate(), dec!(83));
        for w in curve.windows(2) {
            assert_eq!(w[0].days_to_maturity() - w[1].days_to_maturity(), 1);
            assert!(w[0].rate() > w[1].rate());
        }
    }

    #[test]
    fn test_curve_rejects_gap_and_disorder() {
        let gappy = vec![spot(5, 1, dec!(83)), spot(5, 3, dec!(83))];
        assert!(matches!(
            ForwardRateEngine::curve(&gappy, date(5, 30), dec!(5)),
            Err(EngineError::IncompleteCurve { first_missing }) if first_missing == date(5, 2)
        ));

        let unordered = vec![spot(5, 2, dec!(83)), spot(5, 1, dec!(83))];
        assert!(matches!(
            ForwardRateEngine::curve(&unordered, date(5, 30), dec!(5)),
            Err(EngineError::UnorderedSeries { .. })
        ));
    }

    #[test]
    fn test_curve_carries_observation_flag() {
        let series = vec![
            spot(5, 1, dec!(83)),
            Quote::filled(date(5, 2), dec!(83)).unwrap(),
        ];
        let curve = ForwardRateEngine::curve(&series, date(5, 10), dec!(5)).unwrap();
        assert!(curve[0].is_observed());
        assert!(!curve[1].is_observed());
        assert_eq!(curve[1].confidence(), dec!(0.6));
    }

    #[test]
    fn test_curve_from_table() {
        let mut table = BTreeMap::new();
        for d in 1..=5 {
            table.insert(date(6, d), dec!(84) + Decimal::from(d) / dec!(100));
        }
        let curve = ForwardRateEngine::curve_from_table(&table, date(6, 4), date(6, 1), date(6, 30)).unwrap();
        assert_eq!(curve.len(), 4);
        assert_eq!(curve[3].rate(), dec!(84.04));
        assert_eq!(curve[0].source(), ForwardSource::Table);

        table.remove(&date(6, 2));
        let err = ForwardRateEngine::curve_from_table(&table, date(6, 4), date(6, 1), date(6, 4)).unwrap_err();
        assert!(matches!(err, EngineError::IncompleteCurve { first_missing } if first_missing == date(6, 2)));
    }

    #[test]
    fn test_tenor_curve() {
        let points = ForwardRateEngine::tenor_curve(dec!(83), dec!(6.5), &STANDARD_TENORS).unwrap();
        assert_eq!(points.len(), STANDARD_TENORS.len());
        assert!(points.windows(2).all(|w| w[1].forward_rate > w[0].forward_rate));
        assert!(points.iter().all(|p| p.premium > Decimal::ZERO));
    }
}
