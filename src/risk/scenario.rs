//! Rate-shift scenarios on the final mark.

use crate::config::ScenarioConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a scenario moves P&L away from the current final mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// Classify an impact given as a percentage of notional value.
    ///
    /// Below the low threshold is `Low`, above the high threshold is `High`,
    /// anything in between (bounds included) is `Medium`.
    pub fn classify(impact_pct: Decimal, config: &ScenarioConfig) -> Self {
        if impact_pct < config.low_impact_below_pct {
            ImpactLevel::Low
        } else if impact_pct > config.high_impact_above_pct {
            ImpactLevel::High
        } else {
            ImpactLevel::Medium
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactLevel::Low => write!(f, "low"),
            ImpactLevel::Medium => write!(f, "medium"),
            ImpactLevel::High => write!(f, "high"),
        }
    }
}

/// P&L if the final rate were shifted by `shift_pct` percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Proportional shift applied to the final rate, in percent.
    pub shift_pct: Decimal,
    /// The shifted rate.
    pub rate: Decimal,
    pub pl: Decimal,
    pub pl_percentage: Decimal,
    /// `pl` minus the unshifted final P&L.
    pub pl_change: Decimal,
    /// `|pl_change|` as a percentage of notional value.
    pub impact_pct: Decimal,
    pub impact: ImpactLevel,
}

impl ScenarioResult {
    pub fn label(&self) -> String {
        if self.shift_pct.is_zero() {
            "unchanged".to_string()
        } else if self.shift_pct > Decimal::ZERO {
            format!("rate +{}%", self.shift_pct.normalize())
        } else {
            format!("rate {}%", self.shift_pct.normalize())
        }
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} rate {:>10}  P&L {:>16} ({:>7}%)  impact {} ({}%)",
            self.label(),
            self.rate.round_dp(4),
            self.pl.round_dp(2),
            self.pl_percentage.round_dp(2),
            self.impact,
            self.impact_pct.round_dp(2)
        )
    }
}
