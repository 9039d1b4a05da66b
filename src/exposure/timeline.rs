use crate::core::contract::Contract;
use crate::core::error::{check_range, EngineError, EngineResult};
use crate::core::quote::MarkRate;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar window a trajectory covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ExposureWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        check_range(start, end)?;
        Ok(Self { start, end })
    }

    /// `[signing_date, min(as_of, maturity_date)]`.
    ///
    /// An `as_of` before signing is an ill-formed range.
    pub fn for_contract(contract: &Contract, as_of: NaiveDate) -> EngineResult<Self> {
        Self::new(contract.signing_date(), as_of.min(contract.maturity_date()))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for ExposureWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {} ({} days)", self.start, self.end, self.days())
    }
}

/// One day of a contract's mark-to-market trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PLPoint {
    pub date: NaiveDate,
    /// Rate the contract was marked at.
    pub rate: Decimal,
    pub days_remaining: i64,
    /// Signed P&L of the full notional against the contracted rate.
    pub pl: Decimal,
    /// Accumulated P&L since signing. Equal to `pl`: the mark-to-market is
    /// always taken against the contracted rate, not summed from increments.
    pub cumulative_pl: Decimal,
    /// `pl` as a percentage of the notional value.
    pub pl_percentage: Decimal,
    /// `pl` minus the previous point's `pl`; zero on the first point.
    pub daily_change: Decimal,
    pub is_observed: bool,
}

impl PLPoint {
    pub fn is_profit(&self) -> bool {
        self.pl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pl < Decimal::ZERO
    }
}

impl fmt::Display for PLPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:>10}  {:>4}d  {:>16}  {:>8}%{}",
            self.date,
            self.rate.round_dp(4),
            self.days_remaining,
            self.pl.round_dp(2),
            self.pl_percentage.round_dp(2),
            if self.is_observed { "" } else { "  *" }
        )
    }
}

/// Builds daily P&L trajectories from a contract and a rate curve.
pub struct ExposureTimeline;

impl ExposureTimeline {
    /// Mark `contract` against `curve` for every day of `window`.
    ///
    /// The curve may hold spot quotes or forward quotes; both are read via
    /// [`MarkRate`]. It must be strictly ascending. Points outside the
    /// window are ignored; a day of the window with no point fails with
    /// `IncompleteCurve` naming that day. Forward points must refer to the
    /// contract's maturity date, otherwise `MaturityMismatch`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fx_exposure_engine::core::contract::{Contract, ContractId, Direction};
    /// use fx_exposure_engine::core::quote::{Quote, RawQuote};
    /// use fx_exposure_engine::exposure::timeline::{ExposureTimeline, ExposureWindow};
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    ///
    /// let signing = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
    /// let lc = Contract::from_tenor(
    ///     ContractId::new("LC-1"), dec!(500_000), Direction::Import, signing, 30, dec!(82.50),
    /// ).unwrap();
    /// let curve = vec![Quote::from_raw(&RawQuote::flat(signing, dec!(82.00))).unwrap()];
    ///
    /// let window = ExposureWindow::new(signing, signing).unwrap();
    /// let points = ExposureTimeline::build(&lc, &curve, window).unwrap();
    /// assert_eq!(points[0].pl, dec!(250_000));
    /// assert_eq!(points[0].days_remaining, 30);
    /// ```
    pub fn build<R: MarkRate>(
        contract: &Contract,
        curve: &[R],
        window: ExposureWindow,
    ) -> EngineResult<Vec<PLPoint>> {
        for w in curve.windows(2) {
            if w[1].mark_date() <= w[0].mark_date() {
                return Err(EngineError::UnorderedSeries {
                    date: w[1].mark_date(),
                });
            }
        }
        let expected = contract.maturity_date();
        if let Some(found) = curve
            .iter()
            .filter_map(|p| p.mark_maturity())
            .find(|m| *m != expected)
        {
            return Err(EngineError::MaturityMismatch { expected, found });
        }

        let notional_value = contract.notional_value();
        let mut points: Vec<PLPoint> = Vec::with_capacity(window.days().max(0) as usize);
        let mut previous_pl: Option<Decimal> = None;

        for day in window.iter_days() {
            let mark = curve
                .binary_search_by_key(&day, |p| p.mark_date())
                .map(|idx| &curve[idx])
                .map_err(|_| EngineError::IncompleteCurve { first_missing: day })?;

            let rate = mark.mark_rate();
            let pl = contract.mark_to_market(rate);
            points.push(PLPoint {
                date: day,
                rate,
                days_remaining: contract.days_remaining(day),
                pl,
                cumulative_pl: pl,
                pl_percentage: pl / notional_value * Decimal::ONE_HUNDRED,
                daily_change: previous_pl.map_or(Decimal::ZERO, |prev| pl - prev),
                is_observed: mark.mark_observed(),
            });
            previous_pl = Some(pl);
        }

        debug!(
            "built {} P&L points for {} over {}",
            points.len(),
            contract.id(),
            window
        );
        Ok(points)
    }
}
