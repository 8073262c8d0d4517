//! Flow configuration and per-tick flow budget
//!
//! The host configures a maximum flow rate (amount per second) and a rate
//! multiplier. Each fixed step converts them into a [`FlowBudget`]:
//!
//! ```text
//! FlowBudget = max_flow_rate × rate_multiplier × delta_time
//! ```
//!
//! The budget is the ceiling on what one directed transfer may move in a
//! tick. The balance engine divides it further during its take phase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum flow rate (amount per second)
pub const DEFAULT_MAX_FLOW_RATE: f64 = 10.0;

/// Default rate multiplier
pub const DEFAULT_RATE_MULTIPLIER: f64 = 1.0;

/// Errors raised while building or loading a flow configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_flow_rate must be positive and finite, got {0}")]
    NonPositiveFlowRate(f64),

    #[error("rate_multiplier must be positive and finite, got {0}")]
    NonPositiveRateMultiplier(f64),

    #[error("Failed to parse flow config: {0}")]
    Parse(String),

    #[error("Failed to serialize flow config: {0}")]
    Serialize(String),
}

/// Host-supplied flow settings
///
/// # Example
/// ```
/// use fuel_balancer_core_rs::FlowConfig;
///
/// let config = FlowConfig::new(20.0, 2.0).unwrap();
/// assert_eq!(config.budget(0.5).amount(), 20.0);
///
/// assert!(FlowConfig::new(0.0, 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Maximum amount per second a single directed transfer may move
    pub max_flow_rate: f64,

    /// Scales `max_flow_rate` (UI "speed" setting)
    pub rate_multiplier: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_flow_rate: DEFAULT_MAX_FLOW_RATE,
            rate_multiplier: DEFAULT_RATE_MULTIPLIER,
        }
    }
}

impl FlowConfig {
    /// Create a validated configuration
    pub fn new(max_flow_rate: f64, rate_multiplier: f64) -> Result<Self, ConfigError> {
        let config = Self {
            max_flow_rate,
            rate_multiplier,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check both rates are positive and finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_flow_rate.is_finite() && self.max_flow_rate > 0.0) {
            return Err(ConfigError::NonPositiveFlowRate(self.max_flow_rate));
        }
        if !(self.rate_multiplier.is_finite() && self.rate_multiplier > 0.0) {
            return Err(ConfigError::NonPositiveRateMultiplier(self.rate_multiplier));
        }
        Ok(())
    }

    /// Load and validate a configuration from JSON
    ///
    /// Missing fields fall back to defaults, so an empty object is valid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: StoredFlowConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let config = Self {
            max_flow_rate: config.max_flow_rate.unwrap_or(DEFAULT_MAX_FLOW_RATE),
            rate_multiplier: config.rate_multiplier.unwrap_or(DEFAULT_RATE_MULTIPLIER),
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Flow budget for a step of `delta_time` seconds
    pub fn budget(&self, delta_time: f64) -> FlowBudget {
        FlowBudget(self.max_flow_rate * self.rate_multiplier * delta_time)
    }
}

/// On-disk shape: every field optional
#[derive(Deserialize)]
struct StoredFlowConfig {
    max_flow_rate: Option<f64>,
    rate_multiplier: Option<f64>,
}

/// Maximum amount a single directed operation may move in one tick
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct FlowBudget(f64);

impl FlowBudget {
    /// Budget of a fixed amount (negative and NaN clamp to zero)
    pub fn from_amount(amount: f64) -> Self {
        Self(if amount > 0.0 { amount } else { 0.0 })
    }

    /// Budget with no practical ceiling
    pub fn unbounded() -> Self {
        Self(f64::MAX)
    }

    /// Raw amount
    pub fn amount(&self) -> f64 {
        self.0
    }

    /// Share of the budget for one of `parts` participants
    ///
    /// Zero parts yield a zero share.
    pub fn share(&self, parts: usize) -> f64 {
        if parts == 0 {
            0.0
        } else {
            self.0 / parts as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FlowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_flow_rate, 10.0);
        assert_eq!(config.rate_multiplier, 1.0);
    }

    #[test]
    fn test_budget_scales_with_delta_time() {
        let config = FlowConfig::new(10.0, 3.0).unwrap();
        assert!((config.budget(0.02).amount() - 0.6).abs() < 1e-12);
        assert_eq!(config.budget(0.0).amount(), 0.0);
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        assert_eq!(
            FlowConfig::new(-1.0, 1.0),
            Err(ConfigError::NonPositiveFlowRate(-1.0))
        );
        assert_eq!(
            FlowConfig::new(1.0, 0.0),
            Err(ConfigError::NonPositiveRateMultiplier(0.0))
        );
        assert!(FlowConfig::new(f64::INFINITY, 1.0).is_err());
        assert!(FlowConfig::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_json_round_trip_and_defaults() {
        let config = FlowConfig::new(25.0, 4.0).unwrap();
        let json = config.to_json().unwrap();
        assert_eq!(FlowConfig::from_json(&json).unwrap(), config);

        let partial = FlowConfig::from_json(r#"{"rate_multiplier": 5.0}"#).unwrap();
        assert_eq!(partial.max_flow_rate, DEFAULT_MAX_FLOW_RATE);
        assert_eq!(partial.rate_multiplier, 5.0);
    }

    #[test]
    fn test_json_load_validates() {
        let err = FlowConfig::from_json(r#"{"max_flow_rate": 0.0}"#).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveFlowRate(0.0));

        let err = FlowConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_budget_share() {
        let budget = FlowBudget::from_amount(9.0);
        assert_eq!(budget.share(3), 3.0);
        assert_eq!(budget.share(0), 0.0);
        assert_eq!(FlowBudget::from_amount(-4.0).amount(), 0.0);
    }
}
