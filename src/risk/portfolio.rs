//! Aggregation of several exposure reports into one book-level view.

use crate::core::quote::Provenance;
use crate::engine::ExposureReport;
use log::{info, warn};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Exposure carried in one currency pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairExposure {
    pub exposure: Decimal,
    pub contracts: usize,
}

/// Totals, P&L and VaR across a set of contracts.
///
/// Amounts are summed as they are, in each contract's quote currency, so the
/// totals only mean something when every contract settles in the same quote
/// currency. Portfolio VaR assumes uncorrelated pairs and is the root sum of
/// squares of the individual parametric VaRs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub contract_count: usize,
    /// Sum of notional values at the contracted rates.
    pub total_notional_value: Decimal,
    /// Sum of positions marked at each trajectory's last rate.
    pub total_exposure: Decimal,
    pub total_pl: Decimal,
    /// `total_pl` as a percentage of `total_notional_value`.
    pub pl_percentage: Decimal,
    /// Keyed by pair symbol, e.g. `USD/INR`.
    pub exposure_by_pair: BTreeMap<String, PairExposure>,
    pub portfolio_var: Decimal,
    /// Plain sum of the individual VaRs.
    pub undiversified_var: Decimal,
    pub diversification_benefit: Decimal,
    pub diversification_ratio: Decimal,
    /// Largest pair exposure over total exposure.
    pub concentration_ratio: Decimal,
    /// Contracts whose parametric VaR had enough data to contribute.
    pub contracts_with_var: usize,
    /// `synthetic` when any contributing report is.
    pub provenance: Provenance,
}

impl PortfolioSummary {
    /// Aggregate `reports`. An empty slice gives an all-zero summary.
    pub fn from_reports(reports: &[ExposureReport]) -> Self {
        let quote_currencies: BTreeSet<_> = reports.iter().map(|r| &r.pair.quote).collect();
        if quote_currencies.len() > 1 {
            warn!(
                "portfolio mixes {} quote currencies; totals are not converted",
                quote_currencies.len()
            );
        }

        let mut exposure_by_pair: BTreeMap<String, PairExposure> = BTreeMap::new();
        let mut total_notional_value = Decimal::ZERO;
        let mut total_exposure = Decimal::ZERO;
        let mut total_pl = Decimal::ZERO;
        let mut individual_vars = Vec::new();

        for report in reports {
            let position = report.parametric_var.position_value;
            total_notional_value += report.notional_value;
            total_exposure += position;
            total_pl += report.summary.final_pl;

            let entry = exposure_by_pair.entry(report.pair.to_string()).or_default();
            entry.exposure += position;
            entry.contracts += 1;

            if report.parametric_var.var_absolute > Decimal::ZERO {
                individual_vars.push(report.parametric_var.var_absolute);
            }
        }

        let portfolio_var = root_sum_square(&individual_vars);
        let undiversified_var: Decimal = individual_vars.iter().sum();
        let diversification_benefit = undiversified_var - portfolio_var;
        let largest = exposure_by_pair
            .values()
            .map(|p| p.exposure)
            .max()
            .unwrap_or(Decimal::ZERO);

        let provenance = if reports.iter().any(|r| r.provenance == Provenance::Synthetic) {
            Provenance::Synthetic
        } else {
            Provenance::Observed
        };

        let summary = Self {
            contract_count: reports.len(),
            total_notional_value,
            total_exposure,
            total_pl,
            pl_percentage: ratio(total_pl, total_notional_value) * Decimal::ONE_HUNDRED,
            exposure_by_pair,
            portfolio_var,
            undiversified_var,
            diversification_benefit,
            diversification_ratio: ratio(diversification_benefit, undiversified_var),
            concentration_ratio: ratio(largest, total_exposure),
            contracts_with_var: individual_vars.len(),
            provenance,
        };

        info!(
            "portfolio of {}: P&L {}, VaR {}, concentration {}",
            summary.contract_count,
            summary.total_pl.round_dp(2),
            summary.portfolio_var.round_dp(2),
            summary.concentration_ratio.round_dp(4)
        );
        summary
    }
}

impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Portfolio Summary ===")?;
        writeln!(f, "Contracts:        {}", self.contract_count)?;
        writeln!(f, "Data:             {}", self.provenance)?;
        writeln!(f, "Notional value:   {}", self.total_notional_value.round_dp(2))?;
        writeln!(f, "Current exposure: {}", self.total_exposure.round_dp(2))?;
        writeln!(
            f,
            "Total P&L:        {} ({}%)",
            self.total_pl.round_dp(2),
            self.pl_percentage.round_dp(2)
        )?;
        writeln!(
            f,
            "Portfolio VaR:    {} (undiversified {}, {} contracts)",
            self.portfolio_var.round_dp(2),
            self.undiversified_var.round_dp(2),
            self.contracts_with_var
        )?;
        writeln!(
            f,
            "Diversification:  {} ({}%)",
            self.diversification_benefit.round_dp(2),
            (self.diversification_ratio * Decimal::ONE_HUNDRED).round_dp(2)
        )?;
        write!(
            f,
            "Concentration:    {}%",
            (self.concentration_ratio * Decimal::ONE_HUNDRED).round_dp(2)
        )?;
        for (pair, exposure) in &self.exposure_by_pair {
            write!(
                f,
                "\n  {pair}: {} over {} contracts",
                exposure.exposure.round_dp(2),
                exposure.contracts
            )?;
        }
        Ok(())
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator / denominator
    } else {
        Decimal::ZERO
    }
}

/// `sqrt(sum(v^2))`, normalized by the largest value so squares stay in range.
fn root_sum_square(values: &[Decimal]) -> Decimal {
    let scale = values.iter().map(|v| v.abs()).max().unwrap_or(Decimal::ZERO);
    if scale.is_zero() {
        return Decimal::ZERO;
    }
    let sum_sq: Decimal = values
        .iter()
        .map(|v| {
            let x = *v / scale;
            x * x
        })
        .sum();
    sum_sq
        .sqrt()
        .and_then(|root| root.checked_mul(scale))
        .unwrap_or(Decimal::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_root_sum_square() {
        assert_eq!(root_sum_square(&[]), Decimal::ZERO);
        assert!((root_sum_square(&[dec!(3), dec!(4)]) - dec!(5)).abs() < dec!(0.0000001));
        let big = dec!(300_000_000_000_000);
        let rss = root_sum_square(&[big, dec!(400_000_000_000_000)]);
        assert!((rss - dec!(500_000_000_000_000)).abs() < dec!(1));
    }

    #[test]
    fn test_ratio_guards_zero() {
        assert_eq!(ratio(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio(dec!(1), dec!(4)), dec!(0.25));
    }

    #[test]
    fn test_empty_portfolio() {
        let s = PortfolioSummary::from_reports(&[]);
        assert_eq!(s.contract_count, 0);
        assert_eq!(s.portfolio_var, Decimal::ZERO);
        assert_eq!(s.concentration_ratio, Decimal::ZERO);
        assert_eq!(s.provenance, Provenance::Observed);
    }
}
