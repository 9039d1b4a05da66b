//! Engine configuration.
//!
//! Every threshold the risk stage uses lives here rather than in code, and
//! the whole tree can be loaded from a JSON file. Missing keys fall back to
//! the defaults below.

use crate::core::error::{EngineError, EngineResult};
use crate::risk::var::VarConfidence;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Top-level configuration for an [`ExposureEngine`](crate::engine::ExposureEngine).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub repository: RepositoryConfig,
    pub scenario: ScenarioConfig,
    pub recommendation: RecommendationConfig,
    pub var: VarConfig,
    pub synthetic: SyntheticConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("reading '{}': {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| EngineError::Config(format!("parsing JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the risk rules meaningless.
    pub fn validate(&self) -> EngineResult<()> {
        let s = &self.scenario;
        if s.low_impact_below_pct < Decimal::ZERO || s.high_impact_above_pct < s.low_impact_below_pct {
            return Err(EngineError::Config(format!(
                "impact thresholds must satisfy 0 <= low ({}) <= high ({})",
                s.low_impact_below_pct, s.high_impact_above_pct
            )));
        }
        if s.shifts_pct.iter().any(|shift| *shift <= dec!(-100)) {
            return Err(EngineError::Config(
                "scenario shifts must be greater than -100%".to_string(),
            ));
        }
        if self.recommendation.exit_margin_pct < Decimal::ZERO {
            return Err(EngineError::Config("exit margin cannot be negative".to_string()));
        }
        if self.synthetic.daily_volatility_pct < Decimal::ZERO
            || self.synthetic.band_pct <= Decimal::ZERO
        {
            return Err(EngineError::Config(
                "synthetic volatility must be >= 0 and band > 0".to_string(),
            ));
        }
        if self.var.horizon_days == 0 {
            return Err(EngineError::Config("VaR horizon must be at least one day".to_string()));
        }
        if self.repository.fetch_timeout_ms == 0 {
            return Err(EngineError::Config("fetch timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Market-data access settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Extra days fetched before the window so the first day can be forward-filled.
    pub lookback_days: u32,
    /// Per-source timeout; expiry counts as a source failure.
    pub fetch_timeout_ms: u64,
    /// Time-to-live of cached current rates.
    pub cache_ttl_secs: i64,
    /// Upper bound on cached pairs.
    pub cache_max_entries: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            fetch_timeout_ms: 10_000,
            cache_ttl_secs: 300,
            cache_max_entries: 256,
        }
    }
}

/// Rate-shift scenarios and their impact bands (percent of notional value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Proportional shifts applied to the final rate, in percent.
    pub shifts_pct: Vec<Decimal>,
    /// Impact strictly below this is `Low`.
    pub low_impact_below_pct: Decimal,
    /// Impact strictly above this is `High`.
    pub high_impact_above_pct: Decimal,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            shifts_pct: vec![dec!(-5), dec!(-2), dec!(0), dec!(2), dec!(5)],
            low_impact_below_pct: dec!(1),
            high_impact_above_pct: dec!(3),
        }
    }
}

/// Exit-versus-hold decision rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// An exit must beat holding by strictly more than this many percentage points.
    pub exit_margin_pct: Decimal,
    /// Holding at a P&L percentage below this switches `hold` to `monitor`.
    pub monitor_below_pct: Decimal,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            exit_margin_pct: Decimal::ZERO,
            monitor_below_pct: dec!(-3),
        }
    }
}

/// Parametric value-at-risk settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarConfig {
    pub confidence: VarConfidence,
    pub horizon_days: u32,
    /// Fewer day-over-day rate changes than this and no VaR is reported.
    pub min_observations: usize,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            confidence: VarConfidence::P95,
            horizon_days: 30,
            min_observations: 19,
        }
    }
}

/// Parameters of the deterministic synthetic fallback series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Starting rate per pair symbol (e.g. `USDINR`).
    pub base_rates: BTreeMap<String, Decimal>,
    /// Starting rate for pairs not listed above.
    pub default_base_rate: Decimal,
    /// Standard deviation of the daily relative move, in percent.
    pub daily_volatility_pct: Decimal,
    /// The walk is clamped to `base * (1 ± band_pct / 100)`.
    pub band_pct: Decimal,
}

impl SyntheticConfig {
    pub fn base_rate(&self, symbol: &str) -> Decimal {
        self.base_rates
            .get(symbol)
            .copied()
            .unwrap_or(self.default_base_rate)
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let mut base_rates = BTreeMap::new();
        base_rates.insert("USDINR".to_string(), dec!(83.0));
        base_rates.insert("EURINR".to_string(), dec!(90.0));
        base_rates.insert("GBPINR".to_string(), dec!(105.0));
        Self {
            base_rates,
            default_base_rate: dec!(85.0),
            daily_volatility_pct: dec!(0.3),
            band_pct: dec!(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "scenario": { "high_impact_above_pct": "4" }, "repository": { "lookback_days": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.scenario.high_impact_above_pct, dec!(4));
        assert_eq!(config.scenario.low_impact_below_pct, dec!(1));
        assert_eq!(config.repository.lookback_days, 3);
        assert_eq!(config.repository.cache_ttl_secs, 300);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = EngineConfig::from_json_str(
            r#"{ "scenario": { "low_impact_below_pct": "5", "high_impact_above_pct": "2" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_var_settings_from_json() {
        let config = EngineConfig::from_json_str(
            r#"{ "var": { "confidence": "0.99", "horizon_days": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.var.confidence, VarConfidence::P99);
        assert_eq!(config.var.horizon_days, 10);
        assert_eq!(config.var.min_observations, 19);

        assert!(EngineConfig::from_json_str(r#"{ "var": { "horizon_days": 0 } }"#).is_err());
        assert!(EngineConfig::from_json_str(r#"{ "var": { "confidence": "0.5" } }"#).is_err());
    }

    #[test]
    fn test_base_rate_lookup() {
        let synthetic = SyntheticConfig::default();
        assert_eq!(synthetic.base_rate("USDINR"), dec!(83.0));
        assert_eq!(synthetic.base_rate("CHFJPY"), dec!(85.0));
    }
}
