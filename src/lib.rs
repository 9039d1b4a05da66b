//! # fx-exposure-engine
//!
//! Forward-rate exposure and risk engine for letters of credit.
//!
//! Given a fixed-rate contract denominated in one currency and settled in
//! another, this engine builds a day-by-day mark-to-market P&L trajectory
//! against realized spot history, derived forward rates, or a supplied rate
//! table, and summarizes it into risk statistics and exit-versus-hold advice.
//!
//! ## Architecture
//!
//! - **core**: Foundational types: currencies, contracts, quotes, errors
//! - **market**: Quote sources, fallback repository, gap filling, synthetic series
//! - **pricing**: Forward rates and forward curves
//! - **exposure**: Daily P&L trajectories
//! - **risk**: VaR, expected shortfall, scenarios, portfolio totals, recommendations
//! - **engine**: The end-to-end pipeline with data provenance

pub mod config;
pub mod core;
pub mod engine;
pub mod exposure;
pub mod market;
pub mod pricing;
pub mod risk;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::contract::{Contract, ContractId, Direction};
    pub use crate::core::currency::{CurrencyCode, CurrencyPair};
    pub use crate::core::error::{EngineError, EngineResult};
    pub use crate::core::quote::{ForwardQuote, MarkRate, Provenance, Quote, RawQuote};
    pub use crate::engine::{ExposureEngine, ExposureReport, ExposureRequest, RateBasis};
    pub use crate::exposure::timeline::{ExposureTimeline, ExposureWindow, PLPoint};
    pub use crate::market::gap_fill::GapFiller;
    pub use crate::market::repository::RateSeriesRepository;
    pub use crate::market::source::{QuoteSource, StaticQuoteSource};
    pub use crate::pricing::forward::ForwardRateEngine;
    pub use crate::risk::engine::RiskEngine;
    pub use crate::risk::portfolio::PortfolioSummary;
    pub use crate::risk::recommendation::{Action, Recommendation};
    pub use crate::risk::summary::RiskSummary;
    pub use crate::risk::var::{ParametricVar, VarConfidence};
}
