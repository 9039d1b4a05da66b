//! Exit-versus-hold outcomes and the resulting advice.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of holding the contract to the end of its trajectory.
///
/// On a forward curve this is today's expectation of the maturity
/// settlement; on spot history it is the latest realized mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldOutcome {
    pub as_of: NaiveDate,
    pub maturity_date: NaiveDate,
    pub rate: Decimal,
    pub pl: Decimal,
    pub pl_percentage: Decimal,
    pub days_remaining: i64,
}

/// Outcome of closing the exposure on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitOutcome {
    pub exit_date: NaiveDate,
    pub rate: Decimal,
    pub pl: Decimal,
    pub pl_percentage: Decimal,
    /// Days before maturity the exit happens.
    pub days_early: i64,
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exit {} ({}d early) @ {}: P&L {} ({}%)",
            self.exit_date,
            self.days_early,
            self.rate.round_dp(4),
            self.pl.round_dp(2),
            self.pl_percentage.round_dp(2)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hold,
    ExitEarly,
    Monitor,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Hold => write!(f, "hold"),
            Action::ExitEarly => write!(f, "exit early"),
            Action::Monitor => write!(f, "monitor"),
        }
    }
}

/// Advice together with the numbers it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    pub hold_pl_percentage: Decimal,
    pub best_exit: Option<ExitOutcome>,
    /// Percentage points the best exit beats holding by (negative if worse).
    pub exit_advantage_pct: Option<Decimal>,
    pub rationale: String,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.rationale)
    }
}
