//! The end-to-end exposure pipeline.
//!
//! repository -> gap filler -> (forward engine) -> timeline -> risk engine,
//! parameterized by which rate basis feeds the curve.

use crate::config::EngineConfig;
use crate::core::contract::{Contract, ContractId};
use crate::core::currency::CurrencyPair;
use crate::core::error::{EngineError, EngineResult};
use crate::core::quote::{ForwardSource, Provenance, Quote};
use crate::exposure::timeline::{ExposureTimeline, ExposureWindow, PLPoint};
use crate::market::gap_fill::GapFiller;
use crate::market::repository::RateSeriesRepository;
use crate::market::synthetic::generate_synthetic_series;
use crate::pricing::forward::ForwardRateEngine;
use crate::risk::engine::RiskEngine;
use crate::risk::recommendation::{ExitOutcome, HoldOutcome, Recommendation};
use crate::risk::scenario::ScenarioResult;
use crate::risk::summary::RiskSummary;
use crate::risk::var::{ParametricVar, RiskAdjustedReturn};
use chrono::{Days, NaiveDate};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which rates the contract is marked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateBasis {
    /// Realized spot history.
    Spot,
    /// Forward expectations for the maturity date, derived from spot.
    Forward { annual_rate_percent: Decimal },
    /// An externally supplied date-to-rate table.
    Table { rates: BTreeMap<NaiveDate, Decimal> },
}

impl fmt::Display for RateBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateBasis::Spot => write!(f, "spot"),
            RateBasis::Forward {
                annual_rate_percent,
            } => write!(f, "forward @ {annual_rate_percent}% p.a."),
            RateBasis::Table { rates } => write!(f, "rate table ({} days)", rates.len()),
        }
    }
}

/// One contract evaluation.
#[derive(Debug, Clone)]
pub struct ExposureRequest {
    pub contract: Contract,
    pub as_of: NaiveDate,
    pub basis: RateBasis,
    pub exit_candidates: Vec<NaiveDate>,
    /// Overrides the configured scenario shifts.
    pub scenario_shifts: Option<Vec<Decimal>>,
}

impl ExposureRequest {
    /// A spot-basis request with no exit candidates.
    pub fn new(contract: Contract, as_of: NaiveDate) -> Self {
        Self {
            contract,
            as_of,
            basis: RateBasis::Spot,
            exit_candidates: Vec::new(),
            scenario_shifts: None,
        }
    }

    pub fn with_basis(mut self, basis: RateBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn with_exit_candidates(mut self, dates: Vec<NaiveDate>) -> Self {
        self.exit_candidates = dates;
        self
    }

    pub fn with_scenario_shifts(mut self, shifts: Vec<Decimal>) -> Self {
        self.scenario_shifts = Some(shifts);
        self
    }
}

/// Everything computed for one request.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureReport {
    pub contract_id: ContractId,
    pub pair: CurrencyPair,
    pub as_of: NaiveDate,
    /// Notional at the contracted rate, in the quote currency.
    pub notional_value: Decimal,
    /// `synthetic` whenever the fallback series, or rows written from it, were used.
    pub provenance: Provenance,
    pub basis: String,
    pub window: ExposureWindow,
    pub curve_len: usize,
    /// Trajectory points marked against a quote for that very day.
    pub observed_points: usize,
    pub trajectory: Vec<PLPoint>,
    pub summary: RiskSummary,
    pub parametric_var: ParametricVar,
    /// Absent when the parametric VaR is zero.
    pub risk_adjusted: Option<RiskAdjustedReturn>,
    pub scenarios: Vec<ScenarioResult>,
    pub hold: HoldOutcome,
    pub exits: Vec<ExitOutcome>,
    pub recommendation: Recommendation,
}

impl fmt::Display for ExposureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Exposure Report: {} ({}) ===", self.contract_id, self.pair)?;
        writeln!(f, "As of:      {}", self.as_of)?;
        writeln!(f, "Basis:      {}", self.basis)?;
        writeln!(f, "Window:     {}", self.window)?;
        writeln!(
            f,
            "Data:       {} ({}/{} points observed)",
            self.provenance,
            self.observed_points,
            self.trajectory.len()
        )?;
        if self.provenance == Provenance::Synthetic {
            writeln!(f, "            WARNING: no market data; figures use a synthetic series")?;
        } else if self.observed_points == 0 {
            writeln!(f, "            WARNING: no quote inside the window; every point is carried forward")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f, "{}", self.parametric_var)?;
        if let Some(risk_adjusted) = &self.risk_adjusted {
            writeln!(f, "{risk_adjusted}")?;
        }
        writeln!(f)?;
        writeln!(f, "Hold to maturity ({}):", self.hold.maturity_date)?;
        writeln!(
            f,
            "  P&L {} ({}%) at {}, {} days remaining",
            self.hold.pl.round_dp(2),
            self.hold.pl_percentage.round_dp(2),
            self.hold.rate.round_dp(4),
            self.hold.days_remaining
        )?;
        if !self.exits.is_empty() {
            writeln!(f, "\nExit candidates:")?;
            for exit in &self.exits {
                writeln!(f, "  {exit}")?;
            }
        }
        if !self.scenarios.is_empty() {
            writeln!(f, "\nScenarios:")?;
            for s in &self.scenarios {
                writeln!(f, "  {s}")?;
            }
        }
        writeln!(f, "\nRecommendation: {}", self.recommendation)
    }
}

/// Runs [`ExposureRequest`]s against a repository and a configuration.
pub struct ExposureEngine {
    repository: RateSeriesRepository,
    config: EngineConfig,
    risk: RiskEngine,
}

impl ExposureEngine {
    pub fn new(repository: RateSeriesRepository, config: EngineConfig) -> Self {
        let risk = RiskEngine::from_config(&config);
        Self {
            repository,
            config,
            risk,
        }
    }

    pub fn repository(&self) -> &RateSeriesRepository {
        &self.repository
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate one request.
    ///
    /// Missing market data (from the repository or the gap filler) switches
    /// to the deterministic synthetic series and tags the report
    /// `synthetic`. Every other error is returned as is.
    pub fn evaluate(&self, request: &ExposureRequest) -> EngineResult<ExposureReport> {
        let contract = &request.contract;
        let window = ExposureWindow::for_contract(contract, request.as_of)?;

        let (trajectory, curve_len, provenance) = match &request.basis {
            RateBasis::Table { rates } => {
                let curve = ForwardRateEngine::curve_from_table(
                    rates,
                    contract.maturity_date(),
                    window.start(),
                    window.end(),
                )?;
                let trajectory = ExposureTimeline::build(contract, &curve, window)?;
                (trajectory, curve.len(), Provenance::Observed)
            }
            RateBasis::Spot => {
                let (spot, provenance) = self.spot_series(contract.pair(), window)?;
                let trajectory = ExposureTimeline::build(contract, &spot, window)?;
                (trajectory, spot.len(), provenance)
            }
            RateBasis::Forward {
                annual_rate_percent,
            } => {
                let (spot, provenance) = self.spot_series(contract.pair(), window)?;
                let source = match provenance {
                    Provenance::Observed => ForwardSource::Calculated,
                    Provenance::Synthetic => ForwardSource::Synthetic,
                };
                let curve = ForwardRateEngine::curve_with_source(
                    &spot,
                    contract.maturity_date(),
                    *annual_rate_percent,
                    source,
                )?;
                let trajectory = ExposureTimeline::build(contract, &curve, window)?;
                (trajectory, curve.len(), provenance)
            }
        };

        let summary = RiskEngine::summarize(&trajectory)?;
        let var_config = &self.config.var;
        let parametric_var = ParametricVar::compute(
            contract,
            &trajectory,
            &summary,
            var_config.confidence,
            var_config.horizon_days,
            var_config.min_observations,
        )?;
        let risk_adjusted = RiskAdjustedReturn::compute(&summary, &parametric_var);
        let shifts = request
            .scenario_shifts
            .as_deref()
            .unwrap_or_else(|| self.risk.default_shifts());
        let scenarios = self.risk.scenarios(contract, &trajectory, shifts)?;
        let hold = RiskEngine::hold_to_maturity(contract, &trajectory)?;
        let observed_points = trajectory.iter().filter(|p| p.is_observed).count();
        let exits = RiskEngine::exit_scenarios(&trajectory, &request.exit_candidates);
        let recommendation = self
            .risk
            .recommend(&trajectory, &hold, &request.exit_candidates);

        info!(
            "{}: {} points ({}, {} observed), final P&L {}, {}",
            contract.id(),
            trajectory.len(),
            provenance,
            observed_points,
            summary.final_pl.round_dp(2),
            recommendation.action
        );

        Ok(ExposureReport {
            contract_id: contract.id().clone(),
            pair: contract.pair().clone(),
            as_of: request.as_of,
            notional_value: contract.notional_value(),
            provenance,
            basis: request.basis.to_string(),
            window,
            curve_len,
            observed_points,
            trajectory,
            summary,
            parametric_var,
            risk_adjusted,
            scenarios,
            hold,
            exits,
            recommendation,
        })
    }

    /// Contiguous daily spot series for `window`, falling back to the
    /// synthetic series when market data is unavailable. Fetched rows that
    /// are themselves synthesized tag the series `synthetic`.
    fn spot_series(
        &self,
        pair: &CurrencyPair,
        window: ExposureWindow,
    ) -> EngineResult<(Vec<Quote>, Provenance)> {
        let lookback = Days::new(u64::from(self.config.repository.lookback_days));
        let fetch_start = window
            .start()
            .checked_sub_days(lookback)
            .unwrap_or(window.start());

        let observed = self
            .repository
            .fetch(pair, fetch_start, window.end())
            .and_then(|raw| {
                let provenance = if raw.iter().all(Quote::is_observed) {
                    Provenance::Observed
                } else {
                    Provenance::Synthetic
                };
                let series = GapFiller::new(pair.clone()).fill(&raw, window.start(), window.end())?;
                Ok((series, provenance))
            });

        match observed {
            Ok((series, provenance)) => {
                if provenance == Provenance::Synthetic {
                    warn!("{pair}: source rows are synthesized; tagging the series synthetic");
                }
                Ok((series, provenance))
            }
            Err(EngineError::DataUnavailable { reason, .. }) => {
                warn!("market data unavailable for {pair} ({reason}); using synthetic series");
                let series = generate_synthetic_series(
                    pair,
                    window.start(),
                    window.end(),
                    &self.config.synthetic,
                )?;
                Ok((series, Provenance::Synthetic))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::Direction;
    use crate::core::quote::RawQuote;
    use crate::market::source::{QuoteSource, StaticQuoteSource};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn contract() -> Contract {
        Contract::new(
            ContractId::new("LC-E"),
            dec!(500_000),
            Direction::Import,
            date(5, 3),
            date(6, 2),
            dec!(82.50),
        )
        .unwrap()
    }

    fn engine_with(rows: Vec<RawQuote>) -> ExposureEngine {
        let source: Arc<dyn QuoteSource> =
            Arc::new(StaticQuoteSource::new("sheet").with_series(CurrencyPair::default(), rows));
        ExposureEngine::new(
            RateSeriesRepository::new(vec![source], &Default::default()),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_spot_basis_uses_lookback() {
        // Only a Friday quote before signing (Saturday 3 May).
        let engine = engine_with(vec![RawQuote::flat(date(5, 2), dec!(82.00))]);
        let report = engine
            .evaluate(&ExposureRequest::new(contract(), date(5, 6)))
            .unwrap();

        assert_eq!(report.provenance, Provenance::Observed);
        assert_eq!(report.trajectory.len(), 4);
        assert!(report.trajectory.iter().all(|p| !p.is_observed));
        assert_eq!(report.observed_points, 0);
        assert!(report.to_string().contains("0/4 points observed"));
        assert!(report.to_string().contains("every point is carried forward"));
        assert_eq!(report.summary.final_pl, dec!(250_000));
    }

    #[test]
    fn test_observed_points_counts_in_window_quotes() {
        let engine = engine_with(vec![
            RawQuote::flat(date(5, 2), dec!(82.00)),
            RawQuote::flat(date(5, 5), dec!(82.40)),
            RawQuote::flat(date(5, 6), dec!(82.60)),
        ]);
        let report = engine
            .evaluate(&ExposureRequest::new(contract(), date(5, 6)))
            .unwrap();
        assert_eq!(report.provenance, Provenance::Observed);
        assert_eq!(report.observed_points, 2);
        assert!(!report.to_string().contains("carried forward"));
    }

    #[test]
    fn test_synthesized_source_rows_are_tagged_synthetic() {
        let mut rows = vec![RawQuote::flat(date(5, 2), dec!(82.00))];
        let mut unobserved = RawQuote::flat(date(5, 5), dec!(82.30));
        unobserved.is_observed = false;
        rows.push(unobserved);
        let engine = engine_with(rows);

        let report = engine
            .evaluate(&ExposureRequest::new(contract(), date(5, 6)))
            .unwrap();
        assert_eq!(report.provenance, Provenance::Synthetic);
        assert_eq!(report.observed_points, 0);
    }

    #[test]
    fn test_request_shifts_are_validated() {
        let engine = engine_with(vec![RawQuote::flat(date(5, 2), dec!(82.00))]);
        let request = ExposureRequest::new(contract(), date(5, 6))
            .with_scenario_shifts(vec![dec!(5), dec!(-100)]);
        let err = engine.evaluate(&request).unwrap_err();
        assert!(matches!(err, EngineError::InvalidShift { shift_pct } if shift_pct == dec!(-100)));

        let request = ExposureRequest::new(contract(), date(5, 6))
            .with_scenario_shifts(vec![dec!(-99.5)]);
        assert_eq!(engine.evaluate(&request).unwrap().scenarios.len(), 1);
    }

    #[test]
    fn test_synthetic_fallback_is_tagged() {
        let engine = ExposureEngine::new(RateSeriesRepository::empty(), EngineConfig::default());
        let report = engine
            .evaluate(&ExposureRequest::new(contract(), date(5, 20)))
            .unwrap();
        assert_eq!(report.provenance, Provenance::Synthetic);
        assert_eq!(report.trajectory.len(), 18);
    }

    #[test]
    fn test_forward_basis_marks_above_spot() {
        let engine = engine_with(vec![RawQuote::flat(date(5, 2), dec!(82.00))]);
        let request = ExposureRequest::new(contract(), date(5, 4)).with_basis(RateBasis::Forward {
            annual_rate_percent: dec!(6),
        });
        let report = engine.evaluate(&request).unwrap();
        assert!(report.trajectory.iter().all(|p| p.rate > dec!(82.00)));
        assert!(report.basis.starts_with("forward"));
    }

    #[test]
    fn test_table_basis_requires_full_coverage() {
        let engine = ExposureEngine::new(RateSeriesRepository::empty(), EngineConfig::default());
        let mut rates = BTreeMap::new();
        rates.insert(date(5, 3), dec!(82.1));
        rates.insert(date(5, 5), dec!(82.2));
        let request = ExposureRequest::new(contract(), date(5, 5)).with_basis(RateBasis::Table { rates });
        let err = engine.evaluate(&request).unwrap_err();
        assert!(matches!(err, EngineError::IncompleteCurve { first_missing } if first_missing == date(5, 4)));
    }

    #[test]
    fn test_as_of_before_signing_is_rejected() {
        let engine = ExposureEngine::new(RateSeriesRepository::empty(), EngineConfig::default());
        let err = engine
            .evaluate(&ExposureRequest::new(contract(), date(4, 1)))
            .unwrap_err();
        assert!(matches!(err, EngineError::IllFormedDateRange { .. }));
    }
}
