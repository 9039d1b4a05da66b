//! Exit-versus-hold example on a forward curve.
//!
//! Projects forwards from a flat spot to maturity and compares settling
//! at maturity against closing the exposure on a few candidate dates.

use chrono::NaiveDate;
use fx_exposure_engine::config::EngineConfig;
use fx_exposure_engine::core::contract::{Contract, ContractId, Direction};
use fx_exposure_engine::core::currency::CurrencyPair;
use fx_exposure_engine::core::quote::RawQuote;
use fx_exposure_engine::engine::{ExposureEngine, ExposureRequest, RateBasis};
use fx_exposure_engine::market::repository::RateSeriesRepository;
use fx_exposure_engine::market::source::{QuoteSource, StaticQuoteSource};
use fx_exposure_engine::pricing::forward::{ForwardRateEngine, STANDARD_TENORS};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn main() {
    println!("╔═════════════════════════════════════════════╗");
    println!("║  fx-exposure-engine: Exit or Hold Example   ║");
    println!("╚═════════════════════════════════════════════╝\n");

    // --- Tenor structure ---
    println!("━━━ Forward Tenors (spot 83.00, 6.5% p.a.) ━━━\n");
    for point in ForwardRateEngine::tenor_curve(dec!(83.00), dec!(6.5), &STANDARD_TENORS).unwrap() {
        println!("  {}", point);
    }
    println!();

    // --- Export contract against a forward curve ---
    let signing = date(2025, 3, 1);
    let maturity = date(2025, 5, 30);
    let rows: Vec<RawQuote> = signing
        .iter_days()
        .take_while(|d| *d <= maturity)
        .map(|d| RawQuote::flat(d, dec!(83.00)))
        .collect();

    let source: Arc<dyn QuoteSource> =
        Arc::new(StaticQuoteSource::new("desk").with_series(CurrencyPair::default(), rows));
    let config = EngineConfig::default();
    let engine = ExposureEngine::new(
        RateSeriesRepository::new(vec![source], &config.repository),
        config,
    );

    for direction in [Direction::Export, Direction::Import] {
        println!("━━━ {} at 83.75 ━━━\n", direction);

        let contract = Contract::new(
            ContractId::new("LC-2025-020"),
            dec!(400_000),
            direction,
            signing,
            maturity,
            dec!(83.75),
        )
        .unwrap();
        let request = ExposureRequest::new(contract, maturity)
            .with_basis(RateBasis::Forward {
                annual_rate_percent: dec!(6.5),
            })
            .with_exit_candidates(vec![date(2025, 3, 1), date(2025, 4, 1), date(2025, 5, 1)]);

        let report = engine.evaluate(&request).unwrap();

        println!(
            "  hold to {}: {} ({}%)",
            report.hold.maturity_date,
            report.hold.pl.round_dp(2),
            report.hold.pl_percentage.round_dp(2)
        );
        for exit in &report.exits {
            println!("  {}", exit);
        }
        println!("\n  => {}\n", report.recommendation);
    }
}
