//! Aggregation engine configuration.

use crate::core::SessionError;
use crate::policy::RiskThresholds;
use crate::slots::{DEFAULT_SLOT_COUNT, MAX_SLOT_COUNT};

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Default upper bound on a session's claimed piece count.
pub const DEFAULT_MAX_TOTAL_PIECES: u64 = 1 << 20;

/// Default number of entries kept by the dashboard log.
pub const DEFAULT_LOG_CAPACITY: usize = 20;

/// Configuration shared by every session of an engine.
///
/// # Examples
///
/// ```rust
/// use std::num::NonZeroUsize;
/// use torrentguard::session::EngineConfig;
///
/// let config = EngineConfig::new()
///     .with_slot_count(NonZeroUsize::new(256).unwrap())
///     .with_max_total_pieces(100_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of display slots per session.
    pub slot_count: NonZeroUsize,

    /// Sessions claiming more pieces than this are rejected at creation.
    pub max_total_pieces: u64,

    /// Risk gauge thresholds.
    pub risk_thresholds: RiskThresholds,

    /// Number of entries kept by [`SessionLog`](crate::sink::SessionLog).
    pub log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_count: NonZeroUsize::new(DEFAULT_SLOT_COUNT).unwrap_or(NonZeroUsize::MIN),
            max_total_pieces: DEFAULT_MAX_TOTAL_PIECES,
            risk_thresholds: RiskThresholds::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration and validates it.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SessionError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of display slots.
    pub fn with_slot_count(mut self, slot_count: NonZeroUsize) -> Self {
        self.slot_count = slot_count;
        self
    }

    /// Sets the maximum accepted piece count.
    pub fn with_max_total_pieces(mut self, max: u64) -> Self {
        self.max_total_pieces = max;
        self
    }

    /// Sets the risk gauge thresholds.
    pub fn with_risk_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.risk_thresholds = thresholds;
        self
    }

    /// Sets the dashboard log capacity.
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Creates a configuration for sensitive environments.
    ///
    /// This configuration:
    /// - Raises the gauge earlier (elevated above 25, critical above 60)
    /// - Accepts at most 262 144 pieces per session
    /// - Keeps a longer operator log (100 entries)
    pub fn strict() -> Self {
        Self {
            max_total_pieces: 1 << 18,
            risk_thresholds: RiskThresholds::new(25.0, 60.0),
            log_capacity: 100,
            ..Self::default()
        }
    }

    /// Creates a configuration for small displays.
    ///
    /// This configuration:
    /// - Uses 100 display slots
    /// - Keeps a short operator log (10 entries)
    pub fn compact() -> Self {
        Self {
            slot_count: NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN),
            log_capacity: 10,
            ..Self::default()
        }
    }

    /// Checks the configuration for inconsistent values.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.slot_count.get() > MAX_SLOT_COUNT {
            return Err(SessionError::configuration(format!(
                "slot_count must be at most {MAX_SLOT_COUNT}, got {}",
                self.slot_count
            )));
        }
        if self.max_total_pieces == 0 {
            return Err(SessionError::configuration(
                "max_total_pieces must be greater than zero",
            ));
        }
        if !self.risk_thresholds.is_valid() {
            return Err(SessionError::configuration(format!(
                "risk thresholds must satisfy 0 <= elevated < critical <= 100, got {} / {}",
                self.risk_thresholds.elevated, self.risk_thresholds.critical
            )));
        }
        if self.log_capacity == 0 {
            return Err(SessionError::configuration(
                "log_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.slot_count.get(), 400);
        assert_eq!(config.max_total_pieces, 1_048_576);
        assert_eq!(config.log_capacity, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        let strict = EngineConfig::strict();
        assert!(strict.validate().is_ok());
        assert_eq!(strict.slot_count.get(), 400);
        assert_eq!(strict.risk_thresholds.critical, 60.0);

        let compact = EngineConfig::compact();
        assert!(compact.validate().is_ok());
        assert_eq!(compact.slot_count.get(), 100);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{"slot_count": 64, "risk_thresholds": {"critical": 90}}"#)
            .unwrap();
        assert_eq!(config.slot_count.get(), 64);
        assert_eq!(config.risk_thresholds.critical, 90.0);
        assert_eq!(config.risk_thresholds.elevated, 40.0);
        assert_eq!(config.max_total_pieces, DEFAULT_MAX_TOTAL_PIECES);
    }

    #[test]
    fn test_from_json_rejects_zero_slots() {
        let result = EngineConfig::from_json(r#"{"slot_count": 0}"#);
        assert!(matches!(result, Err(SessionError::Configuration { .. })));
    }

    #[test]
    fn test_from_json_rejects_oversized_slot_count() {
        let result = EngineConfig::from_json(r#"{"slot_count": 1099511627776}"#);
        assert!(matches!(result, Err(SessionError::Configuration { .. })));

        let config = EngineConfig::from_json(r#"{"slot_count": 65536}"#).unwrap();
        assert_eq!(config.slot_count.get(), MAX_SLOT_COUNT);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = EngineConfig::new().with_max_total_pieces(0);
        assert!(config.validate().is_err());

        let config = EngineConfig::new().with_risk_thresholds(RiskThresholds::new(90.0, 50.0));
        assert!(config.validate().is_err());

        let config = EngineConfig::new().with_log_capacity(0);
        assert!(config.validate().is_err());
    }
}
