use crate::core::currency::CurrencyPair;
use crate::core::error::{EngineError, EngineResult};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied identifier of a contract (typically the LC number).
///
/// # Examples
///
/// ```
/// use fx_exposure_engine::core::contract::ContractId;
///
/// let id = ContractId::new("LC-2025-001");
/// assert_eq!(id.to_string(), "LC-2025-001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which side of the trade the contract holder is on.
///
/// An importer pays foreign currency at maturity, so a cheaper foreign
/// currency is a gain. An exporter receives it, so the sign flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Import,
    Export,
}

impl Direction {
    /// Multiplier applied to `(contracted_rate - rate) * notional`.
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Import => Decimal::ONE,
            Direction::Export => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Import => Direction::Export,
            Direction::Export => Direction::Import,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Import => write!(f, "import"),
            Direction::Export => write!(f, "export"),
        }
    }
}

/// A fixed-rate forward exposure such as a letter of credit.
///
/// The notional is denominated in the pair's base currency; P&L is
/// expressed in the quote (settlement) currency. Contracts are validated on
/// construction and immutable afterwards.
///
/// # Examples
///
/// ```
/// use fx_exposure_engine::core::contract::{Contract, ContractId, Direction};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let lc = Contract::new(
///     ContractId::new("LC-001"),
///     dec!(500_000),
///     Direction::Import,
///     NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
///     dec!(82.50),
/// )
/// .unwrap();
///
/// assert_eq!(lc.maturity_days(), 30);
/// assert_eq!(lc.notional_value(), dec!(41_250_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContractRecord")]
pub struct Contract {
    id: ContractId,
    notional: Decimal,
    direction: Direction,
    signing_date: NaiveDate,
    maturity_date: NaiveDate,
    contracted_rate: Decimal,
    pair: CurrencyPair,
    description: Option<String>,
}

impl Contract {
    /// Create a validated contract.
    ///
    /// Fails with `InvalidContract` on a non-positive notional or rate, or a
    /// maturity date that is not strictly after the signing date.
    pub fn new(
        id: ContractId,
        notional: Decimal,
        direction: Direction,
        signing_date: NaiveDate,
        maturity_date: NaiveDate,
        contracted_rate: Decimal,
    ) -> EngineResult<Self> {
        if notional <= Decimal::ZERO {
            return Err(EngineError::InvalidContract {
                field: "notional",
                reason: format!("must be positive, got {notional}"),
            });
        }
        if contracted_rate <= Decimal::ZERO {
            return Err(EngineError::InvalidContract {
                field: "contracted_rate",
                reason: format!("must be positive, got {contracted_rate}"),
            });
        }
        if maturity_date <= signing_date {
            return Err(EngineError::InvalidContract {
                field: "maturity_date",
                reason: format!("{maturity_date} must be after signing date {signing_date}"),
            });
        }
        Ok(Self {
            id,
            notional,
            direction,
            signing_date,
            maturity_date,
            contracted_rate,
            pair: CurrencyPair::default(),
            description: None,
        })
    }

    /// Create a contract from a signing date and a tenor in days.
    pub fn from_tenor(
        id: ContractId,
        notional: Decimal,
        direction: Direction,
        signing_date: NaiveDate,
        maturity_days: i64,
        contracted_rate: Decimal,
    ) -> EngineResult<Self> {
        if maturity_days <= 0 {
            return Err(EngineError::InvalidContract {
                field: "maturity_days",
                reason: format!("must be positive, got {maturity_days}"),
            });
        }
        let maturity_date = signing_date
            .checked_add_days(Days::new(maturity_days.unsigned_abs()))
            .ok_or_else(|| EngineError::InvalidContract {
                field: "maturity_days",
                reason: format!("{maturity_days} days overflows the calendar"),
            })?;
        Self::new(id, notional, direction, signing_date, maturity_date, contracted_rate)
    }

    /// Set the currency pair (defaults to USD/INR).
    pub fn with_pair(mut self, pair: CurrencyPair) -> Self {
        self.pair = pair;
        self
    }

    /// Attach a free-text description (commodity, counterparty, ...).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The same contract seen from the other side of the trade.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> &ContractId {
        &self.id
    }

    pub fn notional(&self) -> Decimal {
        self.notional
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn signing_date(&self) -> NaiveDate {
        self.signing_date
    }

    pub fn maturity_date(&self) -> NaiveDate {
        self.maturity_date
    }

    pub fn contracted_rate(&self) -> Decimal {
        self.contracted_rate
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    // --- Derived ---

    pub fn maturity_days(&self) -> i64 {
        (self.maturity_date - self.signing_date).num_days()
    }

    /// Settlement-currency value locked at signing.
    pub fn notional_value(&self) -> Decimal {
        self.notional * self.contracted_rate
    }

    pub fn days_remaining(&self, as_of: NaiveDate) -> i64 {
        (self.maturity_date - as_of).num_days().max(0)
    }

    pub fn days_elapsed(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.signing_date).num_days().max(0)
    }

    pub fn is_matured(&self, as_of: NaiveDate) -> bool {
        as_of >= self.maturity_date
    }

    /// Share of the tenor already elapsed, 0–100.
    pub fn progress_percentage(&self, as_of: NaiveDate) -> Decimal {
        if self.is_matured(as_of) {
            return Decimal::ONE_HUNDRED;
        }
        let pct = Decimal::from(self.days_elapsed(as_of)) * Decimal::ONE_HUNDRED
            / Decimal::from(self.maturity_days());
        pct.min(Decimal::ONE_HUNDRED)
    }

    /// Signed mark-to-market P&L of the whole notional at `rate`.
    pub fn mark_to_market(&self, rate: Decimal) -> Decimal {
        self.direction.sign() * (self.contracted_rate - rate) * self.notional
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} {} @ {} {}, {} -> {} ({} days)",
            self.id,
            self.direction,
            self.pair.base,
            self.notional.round_dp(2),
            self.contracted_rate,
            self.pair.quote,
            self.signing_date,
            self.maturity_date,
            self.maturity_days()
        )
    }
}

/// Wire shape of a contract, validated into [`Contract`] on deserialization.
///
/// Either `maturity_date` or `maturity_days` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractRecord {
    pub id: ContractId,
    pub notional: Decimal,
    pub direction: Direction,
    pub signing_date: NaiveDate,
    #[serde(default)]
    pub maturity_date: Option<NaiveDate>,
    #[serde(default)]
    pub maturity_days: Option<i64>,
    pub contracted_rate: Decimal,
    #[serde(default)]
    pub pair: Option<CurrencyPair>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<ContractRecord> for Contract {
    type Error = EngineError;

    fn try_from(record: ContractRecord) -> EngineResult<Self> {
        let mut contract = match (record.maturity_date, record.maturity_days) {
            (Some(maturity), _) => Contract::new(
                record.id,
                record.notional,
                record.direction,
                record.signing_date,
                maturity,
                record.contracted_rate,
            )?,
            (None, Some(days)) => Contract::from_tenor(
                record.id,
                record.notional,
                record.direction,
                record.signing_date,
                days,
                record.contracted_rate,
            )?,
            (None, None) => {
                return Err(EngineError::InvalidContract {
                    field: "maturity_date",
                    reason: "either maturity_date or maturity_days is required".to_string(),
                })
            }
        };
        if let Some(pair) = record.pair {
            contract = contract.with_pair(pair);
        }
        if let Some(description) = record.description {
            contract = contract.with_description(description);
        }
        Ok(contract)
    }
}
