//! Parametric (variance-covariance) value at risk and return per unit of risk.

use crate::core::contract::Contract;
use crate::core::error::{EngineError, EngineResult};
use crate::exposure::timeline::PLPoint;
use crate::risk::summary::RiskSummary;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported one-sided confidence levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarConfidence {
    #[serde(rename = "0.90")]
    P90,
    #[default]
    #[serde(rename = "0.95")]
    P95,
    #[serde(rename = "0.99")]
    P99,
}

impl VarConfidence {
    /// Normal quantile used as the VaR multiplier.
    pub fn z_score(self) -> Decimal {
        match self {
            VarConfidence::P90 => dec!(1.28),
            VarConfidence::P95 => dec!(1.65),
            VarConfidence::P99 => dec!(2.33),
        }
    }

    pub fn level(self) -> Decimal {
        match self {
            VarConfidence::P90 => dec!(0.90),
            VarConfidence::P95 => dec!(0.95),
            VarConfidence::P99 => dec!(0.99),
        }
    }
}

impl fmt::Display for VarConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.level() * Decimal::ONE_HUNDRED).normalize())
    }
}

/// Potential loss on the open position over `horizon_days`, assuming
/// normally distributed daily rate changes.
///
/// `position_value` is the notional marked at the last rate of the
/// trajectory, in the quote currency. With fewer than the configured
/// number of rate changes every figure except `position_value` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricVar {
    pub confidence: VarConfidence,
    pub horizon_days: u32,
    pub position_value: Decimal,
    /// Daily relative rate volatility as a fraction.
    pub daily_volatility: Decimal,
    /// `daily_volatility * sqrt(horizon_days)`.
    pub horizon_volatility: Decimal,
    pub var_absolute: Decimal,
    pub var_percentage: Decimal,
    /// Day-over-day rate changes behind `daily_volatility`.
    pub data_points_used: usize,
    pub sufficient_data: bool,
}

impl ParametricVar {
    /// VaR of `contract` at the last point of `trajectory`, using the rate
    /// volatility already in `summary`.
    pub fn compute(
        contract: &Contract,
        trajectory: &[PLPoint],
        summary: &RiskSummary,
        confidence: VarConfidence,
        horizon_days: u32,
        min_observations: usize,
    ) -> EngineResult<Self> {
        let last = trajectory.last().ok_or(EngineError::EmptyTrajectory)?;
        let position_value = contract.notional() * last.rate;
        let data_points_used = summary.data_points.saturating_sub(1);
        let sufficient_data = data_points_used >= min_observations.max(1);

        if !sufficient_data {
            return Ok(Self {
                confidence,
                horizon_days,
                position_value,
                daily_volatility: Decimal::ZERO,
                horizon_volatility: Decimal::ZERO,
                var_absolute: Decimal::ZERO,
                var_percentage: Decimal::ZERO,
                data_points_used,
                sufficient_data,
            });
        }

        let daily_volatility = summary.rate_volatility / Decimal::ONE_HUNDRED;
        let horizon_volatility = Decimal::from(horizon_days)
            .sqrt()
            .map_or(Decimal::ZERO, |root| daily_volatility * root);
        let risk_fraction = horizon_volatility * confidence.z_score();

        Ok(Self {
            confidence,
            horizon_days,
            position_value,
            daily_volatility,
            horizon_volatility,
            var_absolute: position_value
                .checked_mul(risk_fraction)
                .unwrap_or(Decimal::MAX),
            var_percentage: risk_fraction * Decimal::ONE_HUNDRED,
            data_points_used,
            sufficient_data,
        })
    }
}

impl fmt::Display for ParametricVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.sufficient_data {
            return write!(
                f,
                "Parametric VaR ({}, {}d): insufficient data ({} rate changes)",
                self.confidence, self.horizon_days, self.data_points_used
            );
        }
        write!(
            f,
            "Parametric VaR ({}, {}d): {} ({}% of {})",
            self.confidence,
            self.horizon_days,
            self.var_absolute.round_dp(2),
            self.var_percentage.round_dp(2),
            self.position_value.round_dp(2)
        )
    }
}

/// Current P&L measured against the parametric VaR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAdjustedReturn {
    /// Final P&L as a percentage of notional value.
    pub return_percentage: Decimal,
    /// `var_percentage` of the matching [`ParametricVar`].
    pub risk_percentage: Decimal,
    /// Return percentage per percentage point of risk.
    pub risk_adjusted_return: Decimal,
    /// `|final P&L| / var_absolute`.
    pub return_to_var: Decimal,
}

impl RiskAdjustedReturn {
    /// `None` when the VaR is zero.
    pub fn compute(summary: &RiskSummary, var: &ParametricVar) -> Option<Self> {
        if var.var_absolute <= Decimal::ZERO || var.var_percentage <= Decimal::ZERO {
            return None;
        }
        Some(Self {
            return_percentage: summary.final_pl_percentage,
            risk_percentage: var.var_percentage,
            risk_adjusted_return: summary.final_pl_percentage / var.var_percentage,
            return_to_var: summary.final_pl.abs() / var.var_absolute,
        })
    }
}

impl fmt::Display for RiskAdjustedReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Risk-adjusted:    {} per unit of VaR%, |P&L|/VaR {}",
            self.risk_adjusted_return.round_dp(4),
            self.return_to_var.round_dp(4)
        )
    }
}
