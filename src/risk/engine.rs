use crate::config::{EngineConfig, RecommendationConfig, ScenarioConfig};
use crate::core::contract::Contract;
use crate::core::error::{EngineError, EngineResult};
use crate::exposure::timeline::PLPoint;
use crate::risk::recommendation::{Action, ExitOutcome, HoldOutcome, Recommendation};
use crate::risk::scenario::{ImpactLevel, ScenarioResult};
use crate::risk::summary::RiskSummary;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

/// Risk statistics and exit-versus-hold advice over a computed trajectory.
///
/// Operates on computed data only: no I/O, no retries.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    scenario: ScenarioConfig,
    recommendation: RecommendationConfig,
}

impl RiskEngine {
    pub fn new(scenario: ScenarioConfig, recommendation: RecommendationConfig) -> Self {
        Self {
            scenario,
            recommendation,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.scenario.clone(), config.recommendation.clone())
    }

    /// Shifts used when a caller does not supply its own.
    pub fn default_shifts(&self) -> &[Decimal] {
        &self.scenario.shifts_pct
    }

    /// See [`RiskSummary::from_trajectory`].
    pub fn summarize(trajectory: &[PLPoint]) -> EngineResult<RiskSummary> {
        RiskSummary::from_trajectory(trajectory)
    }

    /// Re-mark the contract at the final rate shifted by each of `shifts_pct`.
    ///
    /// A shift of -100% or below is rejected with [`EngineError::InvalidShift`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fx_exposure_engine::core::contract::{Contract, ContractId, Direction};
    /// use fx_exposure_engine::core::quote::{Quote, RawQuote};
    /// use fx_exposure_engine::exposure::timeline::{ExposureTimeline, ExposureWindow};
    /// use fx_exposure_engine::risk::engine::RiskEngine;
    /// use fx_exposure_engine::risk::scenario::ImpactLevel;
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// let day = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
    /// let lc = Contract::from_tenor(
    ///     ContractId::new("LC-1"), dec!(100_000), Direction::Import, day, 30, dec!(80),
    /// ).unwrap();
    /// let curve = vec![Quote::from_raw(&RawQuote::flat(day, dec!(80))).unwrap()];
    /// let trajectory = ExposureTimeline::build(&lc, &curve, ExposureWindow::new(day, day).unwrap()).unwrap();
    ///
    /// let results = RiskEngine::default().scenarios(&lc, &trajectory, &[dec!(5)]).unwrap();
    /// assert_eq!(results[0].rate, dec!(84));
    /// assert_eq!(results[0].pl, dec!(-400_000));
    /// assert_eq!(results[0].impact, ImpactLevel::High);
    /// ```
    pub fn scenarios(
        &self,
        contract: &Contract,
        trajectory: &[PLPoint],
        shifts_pct: &[Decimal],
    ) -> EngineResult<Vec<ScenarioResult>> {
        let last = trajectory.last().ok_or(EngineError::EmptyTrajectory)?;
        if let Some(&shift_pct) = shifts_pct.iter().find(|s| **s <= -Decimal::ONE_HUNDRED) {
            return Err(EngineError::InvalidShift { shift_pct });
        }
        let notional_value = contract.notional_value();

        let results: Vec<ScenarioResult> = shifts_pct
            .iter()
            .map(|&shift_pct| {
                let rate = last.rate * (Decimal::ONE + shift_pct / Decimal::ONE_HUNDRED);
                let pl = contract.mark_to_market(rate);
                let pl_change = pl - last.cumulative_pl;
                let impact_pct = pl_change.abs() / notional_value * Decimal::ONE_HUNDRED;
                ScenarioResult {
                    shift_pct,
                    rate,
                    pl,
                    pl_percentage: pl / notional_value * Decimal::ONE_HUNDRED,
                    pl_change,
                    impact_pct,
                    impact: ImpactLevel::classify(impact_pct, &self.scenario),
                }
            })
            .collect();

        debug!("evaluated {} scenarios for {}", results.len(), contract.id());
        Ok(results)
    }

    /// Outcome of holding: the last point of the trajectory.
    pub fn hold_to_maturity(contract: &Contract, trajectory: &[PLPoint]) -> EngineResult<HoldOutcome> {
        let last = trajectory.last().ok_or(EngineError::EmptyTrajectory)?;
        Ok(HoldOutcome {
            as_of: last.date,
            maturity_date: contract.maturity_date(),
            rate: last.rate,
            pl: last.cumulative_pl,
            pl_percentage: last.pl_percentage,
            days_remaining: last.days_remaining,
        })
    }

    /// Outcome of exiting on each date in `dates` that the trajectory covers.
    ///
    /// Dates outside the trajectory are skipped with a warning.
    pub fn exit_scenarios(trajectory: &[PLPoint], dates: &[NaiveDate]) -> Vec<ExitOutcome> {
        dates
            .iter()
            .filter_map(|date| {
                match trajectory.binary_search_by_key(date, |p| p.date) {
                    Ok(idx) => {
                        let p = &trajectory[idx];
                        Some(ExitOutcome {
                            exit_date: p.date,
                            rate: p.rate,
                            pl: p.cumulative_pl,
                            pl_percentage: p.pl_percentage,
                            days_early: p.days_remaining,
                        })
                    }
                    Err(_) => {
                        warn!("exit date {date} is outside the trajectory, skipped");
                        None
                    }
                }
            })
            .collect()
    }

    /// Compare holding with the best of `exit_candidates`.
    ///
    /// Exiting is advised only when the best exit beats holding by strictly
    /// more than the configured margin; ties favor holding. Otherwise a hold
    /// P&L percentage below the monitor threshold yields `Monitor`.
    pub fn recommend(
        &self,
        trajectory: &[PLPoint],
        hold: &HoldOutcome,
        exit_candidates: &[NaiveDate],
    ) -> Recommendation {
        let exits = Self::exit_scenarios(trajectory, exit_candidates);
        let best_exit = exits.into_iter().fold(None::<ExitOutcome>, |best, e| match best {
            Some(b) if b.pl_percentage >= e.pl_percentage => Some(b),
            _ => Some(e),
        });
        let exit_advantage_pct = best_exit
            .as_ref()
            .map(|e| e.pl_percentage - hold.pl_percentage);
        let margin = self.recommendation.exit_margin_pct;

        let (action, rationale) = match (&best_exit, exit_advantage_pct) {
            (Some(exit), Some(advantage)) if advantage > margin => (
                Action::ExitEarly,
                format!(
                    "exiting on {} yields {}% vs {}% at maturity, {} points better",
                    exit.exit_date,
                    exit.pl_percentage.round_dp(2),
                    hold.pl_percentage.round_dp(2),
                    advantage.round_dp(2)
                ),
            ),
            _ if hold.pl_percentage < self.recommendation.monitor_below_pct => (
                Action::Monitor,
                format!(
                    "holding shows {}%, below the {}% loss threshold; no exit date does better",
                    hold.pl_percentage.round_dp(2),
                    self.recommendation.monitor_below_pct
                ),
            ),
            (Some(exit), _) => (
                Action::Hold,
                format!(
                    "holding ({}%) is at least as good as the best exit on {} ({}%)",
                    hold.pl_percentage.round_dp(2),
                    exit.exit_date,
                    exit.pl_percentage.round_dp(2)
                ),
            ),
            (None, _) => (
                Action::Hold,
                format!(
                    "no exit candidates; holding shows {}%",
                    hold.pl_percentage.round_dp(2)
                ),
            ),
        };

        Recommendation {
            action,
            hold_pl_percentage: hold.pl_percentage,
            best_exit,
            exit_advantage_pct,
            rationale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::{ContractId, Direction};
    use crate::core::quote::{Quote, RawQuote};
    use crate::exposure::timeline::{ExposureTimeline, ExposureWindow};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn contract() -> Contract {
        Contract::from_tenor(
            ContractId::new("LC-R"),
            dec!(100_000),
            Direction::Import,
            date(1),
            30,
            dec!(80),
        )
        .unwrap()
    }

    fn trajectory(rates: &[Decimal]) -> Vec<PLPoint> {
        let curve: Vec<Quote> = rates
            .iter()
            .enumerate()
            .map(|(i, r)| Quote::from_raw(&RawQuote::flat(date(1 + i as u32), *r)).unwrap())
            .collect();
        let window = ExposureWindow::new(date(1), date(rates.len() as u32)).unwrap();
        ExposureTimeline::build(&contract(), &curve, window).unwrap()
    }

    #[test]
    fn test_scenario_impacts() {
        let c = contract();
        let t = trajectory(&[dec!(80), dec!(80)]);
        let engine = RiskEngine::default();
        let results = engine.scenarios(&c, &t, engine.default_shifts()).unwrap();

        assert_eq!(results.len(), 5);
        let unchanged = results.iter().find(|r| r.shift_pct.is_zero()).unwrap();
        assert_eq!(unchanged.pl_change, Decimal::ZERO);
        assert_eq!(unchanged.impact, ImpactLevel::Low);

        let up2 = results.iter().find(|r| r.shift_pct == dec!(2)).unwrap();
        assert_eq!(up2.rate, dec!(81.6));
        assert_eq!(up2.impact_pct, dec!(2));
        assert_eq!(up2.impact, ImpactLevel::Medium);
    }

    #[test]
    fn test_scenarios_require_points() {
        let engine = RiskEngine::default();
        assert!(matches!(
            engine.scenarios(&contract(), &[], &[dec!(1)]),
            Err(EngineError::EmptyTrajectory)
        ));
    }

    #[test]
    fn test_scenarios_reject_total_loss_shift() {
        let engine = RiskEngine::default();
        let t = trajectory(&[dec!(80)]);
        let err = engine
            .scenarios(&contract(), &t, &[dec!(2), dec!(-150)])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidShift { shift_pct } if shift_pct == dec!(-150)));
        assert!(engine.scenarios(&contract(), &t, &[dec!(-99)]).is_ok());
    }

    #[test]
    fn test_exit_scenarios_skip_outside_dates() {
        let t = trajectory(&[dec!(80), dec!(79), dec!(81)]);
        let exits = RiskEngine::exit_scenarios(&t, &[date(2), date(20)]);
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].pl, dec!(100_000));
        assert_eq!(exits[0].days_early, 29);
    }

    #[test]
    fn test_recommend_exit_when_strictly_better() {
        let c = contract();
        let t = trajectory(&[dec!(80), dec!(79), dec!(81)]);
        let hold = RiskEngine::hold_to_maturity(&c, &t).unwrap();
        let rec = RiskEngine::default().recommend(&t, &hold, &[date(1), date(2)]);

        assert_eq!(rec.action, Action::ExitEarly);
        assert_eq!(rec.best_exit.as_ref().unwrap().exit_date, date(2));
        assert!(rec.exit_advantage_pct.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_tie_favors_hold() {
        let c = contract();
        let t = trajectory(&[dec!(79), dec!(79)]);
        let hold = RiskEngine::hold_to_maturity(&c, &t).unwrap();
        let rec = RiskEngine::default().recommend(&t, &hold, &[date(1)]);
        assert_eq!(rec.action, Action::Hold);
        assert_eq!(rec.exit_advantage_pct, Some(Decimal::ZERO));
    }

    #[test]
    fn test_monitor_on_deep_loss() {
        let c = contract();
        // 84 against 80 is -5% of notional value
        let t = trajectory(&[dec!(85), dec!(84)]);
        let hold = RiskEngine::hold_to_maturity(&c, &t).unwrap();
        let rec = RiskEngine::default().recommend(&t, &hold, &[]);
        assert_eq!(rec.action, Action::Monitor);
        assert!(rec.best_exit.is_none());
    }

    #[test]
    fn test_margin_suppresses_small_advantage() {
        let c = contract();
        let t = trajectory(&[dec!(79.9), dec!(80)]);
        let hold = RiskEngine::hold_to_maturity(&c, &t).unwrap();
        let engine = RiskEngine::new(
            ScenarioConfig::default(),
            RecommendationConfig {
                exit_margin_pct: dec!(0.5),
                ..RecommendationConfig::default()
            },
        );
        let rec = engine.recommend(&t, &hold, &[date(1)]);
        assert_eq!(rec.action, Action::Hold);
    }
}
