//! Basic exposure tracking example.
//!
//! Marks an import letter of credit against three weeks of realized
//! USD/INR closes, with weekends forward-filled from Friday.

use chrono::{Datelike, NaiveDate, Weekday};
use fx_exposure_engine::config::EngineConfig;
use fx_exposure_engine::core::contract::{Contract, ContractId, Direction};
use fx_exposure_engine::core::currency::CurrencyPair;
use fx_exposure_engine::core::quote::RawQuote;
use fx_exposure_engine::engine::{ExposureEngine, ExposureRequest};
use fx_exposure_engine::market::repository::RateSeriesRepository;
use fx_exposure_engine::market::source::{QuoteSource, StaticQuoteSource};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn main() {
    println!("╔══════════════════════════════════════════════╗");
    println!("║  fx-exposure-engine: Basic Exposure Example  ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let signing = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
    let maturity = NaiveDate::from_ymd_opt(2025, 8, 3).unwrap();
    let as_of = NaiveDate::from_ymd_opt(2025, 5, 25).unwrap();

    // Trading-day closes drifting up from 83.10 by half a paisa a day.
    let rows: Vec<RawQuote> = signing
        .iter_days()
        .take_while(|d| *d <= as_of)
        .enumerate()
        .filter(|(_, d)| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .map(|(i, d)| RawQuote::flat(d, dec!(83.10) + Decimal::from(i as u32) * dec!(0.05)))
        .collect();
    println!("Loaded {} trading-day closes\n", rows.len());

    let source: Arc<dyn QuoteSource> =
        Arc::new(StaticQuoteSource::new("treasury-sheet").with_series(CurrencyPair::default(), rows));
    let config = EngineConfig::default();
    let engine = ExposureEngine::new(
        RateSeriesRepository::new(vec![source], &config.repository),
        config,
    );

    let contract = Contract::new(
        ContractId::new("LC-2025-014"),
        dec!(750_000),
        Direction::Import,
        signing,
        maturity,
        dec!(83.40),
    )
    .unwrap()
    .with_description("Machine tools, 90-day usance");

    let report = engine
        .evaluate(&ExposureRequest::new(contract, as_of))
        .unwrap();

    println!("{}", report);

    println!("━━━ Daily Marks ━━━\n");
    for point in &report.trajectory {
        let tag = if point.is_observed { "" } else { " (filled)" };
        println!(
            "  {}  {:>8}  {:>14}{}",
            point.date,
            point.rate.round_dp(4),
            point.cumulative_pl.round_dp(2),
            tag
        );
    }
}
