//! Descriptive risk statistics over a P&L trajectory.

use crate::core::error::{EngineError, EngineResult};
use crate::exposure::timeline::PLPoint;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the marking rate between the first and last point.
///
/// A rising rate means the base currency bought more of the quote currency
/// at the end than at the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTrend {
    Strengthening,
    Weakening,
    Stable,
    InsufficientData,
}

impl fmt::Display for RateTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateTrend::Strengthening => write!(f, "strengthening"),
            RateTrend::Weakening => write!(f, "weakening"),
            RateTrend::Stable => write!(f, "stable"),
            RateTrend::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Summary statistics of a trajectory's cumulative P&L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub final_pl: Decimal,
    pub final_pl_percentage: Decimal,
    pub max_pl: Decimal,
    pub max_pl_date: NaiveDate,
    pub min_pl: Decimal,
    pub min_pl_date: NaiveDate,
    pub mean_pl: Decimal,
    /// Sample standard deviation of P&L (n - 1 denominator).
    pub volatility: Decimal,
    /// 5th percentile of P&L, linearly interpolated.
    pub var_95: Decimal,
    /// Mean of the P&L values at or below `var_95`.
    pub expected_shortfall_95: Decimal,
    pub profit_days: usize,
    pub loss_days: usize,
    pub data_points: usize,
    /// Sample standard deviation of day-over-day relative rate changes, in percent.
    pub rate_volatility: Decimal,
    pub rate_trend: RateTrend,
}

impl RiskSummary {
    /// Summarize a non-empty trajectory.
    ///
    /// With a single point, volatility, VaR and expected shortfall are 0.
    pub fn from_trajectory(trajectory: &[PLPoint]) -> EngineResult<Self> {
        let first = trajectory.first().ok_or(EngineError::EmptyTrajectory)?;
        let last = trajectory.last().ok_or(EngineError::EmptyTrajectory)?;

        let mut max = first;
        let mut min = first;
        for p in trajectory {
            if p.cumulative_pl > max.cumulative_pl {
                max = p;
            }
            if p.cumulative_pl < min.cumulative_pl {
                min = p;
            }
        }

        let pls: Vec<Decimal> = trajectory.iter().map(|p| p.cumulative_pl).collect();
        let mean_pl = mean(&pls);
        let (var_95, expected_shortfall_95) = if pls.len() > 1 {
            let mut sorted = pls.clone();
            sorted.sort();
            let var = percentile(&sorted, dec!(5));
            let tail: Vec<Decimal> = sorted.iter().copied().filter(|v| *v <= var).collect();
            (var, mean(&tail))
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let rate_changes: Vec<Decimal> = trajectory
            .windows(2)
            .filter(|w| !w[0].rate.is_zero())
            .map(|w| (w[1].rate - w[0].rate) / w[0].rate * Decimal::ONE_HUNDRED)
            .collect();

        Ok(RiskSummary {
            final_pl: last.cumulative_pl,
            final_pl_percentage: last.pl_percentage,
            max_pl: max.cumulative_pl,
            max_pl_date: max.date,
            min_pl: min.cumulative_pl,
            min_pl_date: min.date,
            mean_pl,
            volatility: sample_std_dev(&pls),
            var_95,
            expected_shortfall_95,
            profit_days: trajectory.iter().filter(|p| p.is_profit()).count(),
            loss_days: trajectory.iter().filter(|p| p.is_loss()).count(),
            data_points: trajectory.len(),
            rate_volatility: sample_std_dev(&rate_changes),
            rate_trend: rate_trend(trajectory),
        })
    }
}

impl fmt::Display for RiskSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Risk Summary ===")?;
        writeln!(
            f,
            "Final P&L:        {} ({}%)",
            self.final_pl.round_dp(2),
            self.final_pl_percentage.round_dp(2)
        )?;
        writeln!(f, "Max P&L:          {} on {}", self.max_pl.round_dp(2), self.max_pl_date)?;
        writeln!(f, "Min P&L:          {} on {}", self.min_pl.round_dp(2), self.min_pl_date)?;
        writeln!(f, "Mean P&L:         {}", self.mean_pl.round_dp(2))?;
        writeln!(f, "Volatility:       {}", self.volatility.round_dp(2))?;
        writeln!(f, "VaR (95%):        {}", self.var_95.round_dp(2))?;
        writeln!(f, "ES (95%):         {}", self.expected_shortfall_95.round_dp(2))?;
        writeln!(
            f,
            "Profit/Loss days: {}/{} of {}",
            self.profit_days, self.loss_days, self.data_points
        )?;
        write!(
            f,
            "Rate volatility:  {}% daily, {}",
            self.rate_volatility.round_dp(4),
            self.rate_trend
        )
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let n = Decimal::from(values.len());
    match values.iter().try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v)) {
        Some(sum) => sum / n,
        None => {
            let scale = max_abs(values);
            let scaled: Decimal = values.iter().map(|v| *v / scale).sum();
            (scaled / n).checked_mul(scale).unwrap_or(Decimal::MAX)
        }
    }
}

/// Sample standard deviation; 0 for fewer than two values.
///
/// Large magnitudes whose squares exceed `Decimal` range are normalized by
/// the largest absolute value before squaring.
pub fn sample_std_dev(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let denominator = Decimal::from(values.len() - 1);
    let m = mean(values);
    let exact = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let d = v.checked_sub(m)?;
        acc.checked_add(d.checked_mul(d)?)
    });
    if let Some(sum_sq) = exact {
        return (sum_sq / denominator).sqrt().unwrap_or(Decimal::ZERO);
    }

    let scale = max_abs(values);
    let scaled_mean = m / scale;
    let sum_sq: Decimal = values
        .iter()
        .map(|v| {
            let d = *v / scale - scaled_mean;
            d * d
        })
        .sum();
    (sum_sq / denominator)
        .sqrt()
        .and_then(|sd| sd.checked_mul(scale))
        .unwrap_or(Decimal::MAX)
}

/// Largest absolute value, never zero.
fn max_abs(values: &[Decimal]) -> Decimal {
    values
        .iter()
        .map(|v| v.abs())
        .max()
        .filter(|m| !m.is_zero())
        .unwrap_or(Decimal::ONE)
}

/// `p`-th percentile of an ascending slice, interpolating linearly between
/// the two nearest order statistics.
pub fn percentile(sorted: &[Decimal], p: Decimal) -> Decimal {
    match sorted.len() {
        0 => Decimal::ZERO,
        1 => sorted[0],
        n => {
            let rank = p / Decimal::ONE_HUNDRED * Decimal::from(n - 1);
            let lower = rank.floor();
            let idx = lower.to_usize().unwrap_or(0).min(n - 1);
            let upper = (idx + 1).min(n - 1);
            let weight = rank - lower;
            match sorted[upper].checked_sub(sorted[idx]) {
                Some(spread) => sorted[idx] + spread * weight,
                None => sorted[idx] * (Decimal::ONE - weight) + sorted[upper] * weight,
            }
        }
    }
}

fn rate_trend(trajectory: &[PLPoint]) -> RateTrend {
    match (trajectory.first(), trajectory.last()) {
        (Some(first), Some(last)) if trajectory.len() >= 2 => {
            if last.rate > first.rate {
                RateTrend::Strengthening
            } else if last.rate < first.rate {
                RateTrend::Weakening
            } else {
                RateTrend::Stable
            }
        }
        _ => RateTrend::InsufficientData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, pl: Decimal, rate: Decimal) -> PLPoint {
        PLPoint {
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            rate,
            days_remaining: 30 - i64::from(day),
            pl,
            cumulative_pl: pl,
            pl_percentage: pl / dec!(1000),
            daily_change: Decimal::ZERO,
            is_observed: true,
        }
    }

    #[test]
    fn test_percentile_matches_linear_interpolation() {
        let sorted: Vec<Decimal> = (1..=5i64).map(Decimal::from).collect();
        // rank = 0.05 * 4 = 0.2 -> 1 + 0.2 * (2 - 1)
        assert_eq!(percentile(&sorted, dec!(5)), dec!(1.2));
        assert_eq!(percentile(&sorted, dec!(50)), dec!(3));
        assert_eq!(percentile(&sorted, dec!(100)), dec!(5));
        assert_eq!(percentile(&[dec!(7)], dec!(5)), dec!(7));
    }

    #[test]
    fn test_sample_std_dev() {
        let values = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        // population sd is 2; sample sd is sqrt(32 / 7)
        let sd = sample_std_dev(&values);
        assert!((sd - dec!(2.1380899353)).abs() < dec!(0.0000001));
        assert_eq!(sample_std_dev(&[dec!(3)]), Decimal::ZERO);
    }

    #[test]
    fn test_summary_fields() {
        let trajectory = vec![
            point(1, dec!(100), dec!(83.0)),
            point(2, dec!(-50), dec!(83.2)),
            point(3, dec!(0), dec!(83.1)),
            point(4, dec!(250), dec!(82.9)),
        ];
        let s = RiskSummary::from_trajectory(&trajectory).unwrap();

        assert_eq!(s.final_pl, dec!(250));
        assert_eq!(s.max_pl, dec!(250));
        assert_eq!(s.max_pl_date, NaiveDate::from_ymd_opt(2025, 5, 4).unwrap());
        assert_eq!(s.min_pl, dec!(-50));
        assert_eq!(s.mean_pl, dec!(75));
        assert_eq!(s.profit_days, 2);
        assert_eq!(s.loss_days, 1);
        assert_eq!(s.data_points, 4);
        // sorted: -50, 0, 100, 250; rank 0.15 -> -50 + 0.15 * 50
        assert_eq!(s.var_95, dec!(-42.5));
        assert_eq!(s.expected_shortfall_95, dec!(-50));
        assert_eq!(s.rate_trend, RateTrend::Weakening);
        assert!(s.rate_volatility > Decimal::ZERO);
    }

    #[test]
    fn test_single_point() {
        let s = RiskSummary::from_trajectory(&[point(1, dec!(10), dec!(83))]).unwrap();
        assert_eq!(s.volatility, Decimal::ZERO);
        assert_eq!(s.var_95, Decimal::ZERO);
        assert_eq!(s.rate_trend, RateTrend::InsufficientData);
    }

    #[test]
    fn test_empty_trajectory() {
        assert!(matches!(
            RiskSummary::from_trajectory(&[]),
            Err(EngineError::EmptyTrajectory)
        ));
    }

    #[test]
    fn test_large_notional_does_not_overflow() {
        // 1e11 units against 16000, marked alternately at 15000 and 17000
        let trajectory: Vec<PLPoint> = (1..=30u32)
            .map(|day| {
                let (pl, rate) = if day % 2 == 1 {
                    (dec!(100_000_000_000_000), dec!(15000))
                } else {
                    (dec!(-100_000_000_000_000), dec!(17000))
                };
                point(day, pl, rate)
            })
            .collect();
        let s = RiskSummary::from_trajectory(&trajectory).unwrap();

        assert_eq!(s.mean_pl, Decimal::ZERO);
        assert_eq!(s.var_95, dec!(-100_000_000_000_000));
        assert_eq!(s.expected_shortfall_95, dec!(-100_000_000_000_000));
        // sqrt(30 / 29) * 1e14
        let expected = dec!(101_709_525_543_121.557);
        assert!((s.volatility - expected).abs() < dec!(1));
    }

    #[test]
    fn test_std_dev_of_extreme_values_saturates() {
        let values = [Decimal::MAX, Decimal::MIN, Decimal::MAX];
        assert!(sample_std_dev(&values) > Decimal::ZERO);
        assert!(mean(&values) > Decimal::ZERO);
    }

    #[test]
    fn test_ties_report_earliest_date() {
        let trajectory = vec![point(1, dec!(5), dec!(83)), point(2, dec!(5), dec!(83))];
        let s = RiskSummary::from_trajectory(&trajectory).unwrap();
        assert_eq!(s.max_pl_date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(s.min_pl_date, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert_eq!(s.rate_trend, RateTrend::Stable);
    }
}
