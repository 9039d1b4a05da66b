use crate::core::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A daily OHLC row exactly as a quote source returns it. Unvalidated.
///
/// `is_observed` defaults to true when absent so vendor exports load as
/// market data; files written from synthesized series carry `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: u64,
    #[serde(default = "observed_by_default")]
    pub is_observed: bool,
}

fn observed_by_default() -> bool {
    true
}

impl RawQuote {
    /// A flat row where every price equals `close`.
    pub fn flat(date: NaiveDate, close: Decimal) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
            is_observed: true,
        }
    }
}

impl From<&Quote> for RawQuote {
    fn from(q: &Quote) -> Self {
        Self {
            date: q.date,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.volume,
            is_observed: q.is_observed,
        }
    }
}

/// One calendar day of exchange-rate data.
///
/// `close` is the authoritative rate. `is_observed` is false for days that
/// were synthesized, either by forward-filling a gap or by the synthetic
/// fallback series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuote")]
pub struct Quote {
    date: NaiveDate,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: u64,
    is_observed: bool,
}

impl Quote {
    /// Create a validated quote: all prices positive and `high >= low`.
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
        is_observed: bool,
    ) -> EngineResult<Self> {
        for (name, value) in [("open", open), ("high", high), ("low", low), ("close", close)] {
            if value <= Decimal::ZERO {
                return Err(EngineError::InvalidQuote {
                    date,
                    reason: format!("{name} must be positive, got {value}"),
                });
            }
        }
        if high < low {
            return Err(EngineError::InvalidQuote {
                date,
                reason: format!("high {high} is below low {low}"),
            });
        }
        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            is_observed,
        })
    }

    /// Validate a raw source row, keeping its observed flag.
    pub fn from_raw(raw: &RawQuote) -> EngineResult<Self> {
        Self::new(
            raw.date,
            raw.open,
            raw.high,
            raw.low,
            raw.close,
            raw.volume,
            raw.is_observed,
        )
    }

    /// A synthesized quote whose OHLC all equal `close`, with zero volume.
    pub fn filled(date: NaiveDate, close: Decimal) -> EngineResult<Self> {
        Self::new(date, close, close, close, close, 0, false)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn open(&self) -> Decimal {
        self.open
    }

    pub fn high(&self) -> Decimal {
        self.high
    }

    pub fn low(&self) -> Decimal {
        self.low
    }

    pub fn close(&self) -> Decimal {
        self.close
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }

    pub fn is_observed(&self) -> bool {
        self.is_observed
    }
}

impl TryFrom<RawQuote> for Quote {
    type Error = EngineError;

    fn try_from(raw: RawQuote) -> EngineResult<Self> {
        Self::from_raw(&raw)
    }
}

/// Where a forward quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardSource {
    /// Derived from a spot quote and an interest rate.
    Calculated,
    /// Taken verbatim from an externally supplied rate table.
    Table,
    /// Derived from the synthetic fallback series.
    Synthetic,
}

impl ForwardSource {
    /// Informational confidence score attached to quotes from this source.
    pub fn confidence(self, spot_observed: bool) -> Decimal {
        match (self, spot_observed) {
            (ForwardSource::Table, _) => Decimal::ONE,
            (ForwardSource::Calculated, true) => dec!(0.8),
            (ForwardSource::Calculated, false) => dec!(0.6),
            (ForwardSource::Synthetic, _) => dec!(0.2),
        }
    }
}

impl fmt::Display for ForwardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardSource::Calculated => write!(f, "calculated"),
            ForwardSource::Table => write!(f, "table"),
            ForwardSource::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// The market's expectation, on `quote_date`, of the spot rate on `maturity_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForwardQuoteRecord")]
pub struct ForwardQuote {
    quote_date: NaiveDate,
    maturity_date: NaiveDate,
    rate: Decimal,
    days_to_maturity: i64,
    source: ForwardSource,
    confidence: Decimal,
    is_observed: bool,
}

impl ForwardQuote {
    /// Create a validated forward quote. The quote date may not be after maturity.
    pub fn new(
        quote_date: NaiveDate,
        maturity_date: NaiveDate,
        rate: Decimal,
        source: ForwardSource,
        is_observed: bool,
    ) -> EngineResult<Self> {
        if rate <= Decimal::ZERO {
            return Err(EngineError::InvalidRate { rate });
        }
        if quote_date > maturity_date {
            return Err(EngineError::InvalidQuote {
                date: quote_date,
                reason: format!("quote date is after maturity {maturity_date}"),
            });
        }
        Ok(Self {
            quote_date,
            maturity_date,
            rate,
            days_to_maturity: (maturity_date - quote_date).num_days(),
            source,
            confidence: source.confidence(is_observed),
            is_observed,
        })
    }

    pub fn quote_date(&self) -> NaiveDate {
        self.quote_date
    }

    pub fn maturity_date(&self) -> NaiveDate {
        self.maturity_date
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn days_to_maturity(&self) -> i64 {
        self.days_to_maturity
    }

    pub fn source(&self) -> ForwardSource {
        self.source
    }

    pub fn confidence(&self) -> Decimal {
        self.confidence
    }

    pub fn is_observed(&self) -> bool {
        self.is_observed
    }
}

/// Input form of a [`ForwardQuote`]. Derived fields are recomputed on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardQuoteRecord {
    pub quote_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub rate: Decimal,
    pub source: ForwardSource,
    #[serde(default = "observed_by_default")]
    pub is_observed: bool,
}

impl TryFrom<ForwardQuoteRecord> for ForwardQuote {
    type Error = EngineError;

    fn try_from(record: ForwardQuoteRecord) -> EngineResult<Self> {
        Self::new(
            record.quote_date,
            record.maturity_date,
            record.rate,
            record.source,
            record.is_observed,
        )
    }
}

/// Anything that supplies a dated rate to mark a contract against.
///
/// Implemented by spot [`Quote`]s (realized history) and [`ForwardQuote`]s
/// (forward expectations) so the timeline treats both identically.
pub trait MarkRate {
    fn mark_date(&self) -> NaiveDate;
    fn mark_rate(&self) -> Decimal;
    fn mark_observed(&self) -> bool;

    /// Delivery date the rate refers to, when it is a forward expectation.
    fn mark_maturity(&self) -> Option<NaiveDate> {
        None
    }
}

impl MarkRate for Quote {
    fn mark_date(&self) -> NaiveDate {
        self.date
    }

    fn mark_rate(&self) -> Decimal {
        self.close
    }

    fn mark_observed(&self) -> bool {
        self.is_observed
    }
}

impl MarkRate for ForwardQuote {
    fn mark_date(&self) -> NaiveDate {
        self.quote_date
    }

    fn mark_rate(&self) -> Decimal {
        self.rate
    }

    fn mark_observed(&self) -> bool {
        self.is_observed
    }

    fn mark_maturity(&self) -> Option<NaiveDate> {
        Some(self.maturity_date)
    }
}

/// Whether a result rests on market data or on the synthetic fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Observed,
    Synthetic,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Observed => write!(f, "observed"),
            Provenance::Synthetic => write!(f, "synthetic"),
        }
    }
}
