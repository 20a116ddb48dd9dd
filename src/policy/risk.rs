//! Risk gauge tiers.

use serde::{Deserialize, Serialize};

/// Tier of the cumulative risk gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below the elevated threshold.
    #[default]
    Nominal,
    /// Above the elevated threshold.
    Elevated,
    /// Above the critical threshold.
    Critical,
}

impl RiskLevel {
    /// Returns the name of the tier.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        }
    }
}

/// Thresholds splitting the `[0, 100]` risk range into tiers.
///
/// Both bounds are exclusive: a risk of exactly `critical` is `Elevated`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Risk above this value is at least `Elevated`.
    pub elevated: f64,

    /// Risk above this value is `Critical`.
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            elevated: 40.0,
            critical: 80.0,
        }
    }
}

impl RiskThresholds {
    /// Creates thresholds from explicit bounds.
    pub fn new(elevated: f64, critical: f64) -> Self {
        Self { elevated, critical }
    }

    /// Classifies a risk value.
    pub fn classify(&self, risk: f64) -> RiskLevel {
        if risk > self.critical {
            RiskLevel::Critical
        } else if risk > self.elevated {
            RiskLevel::Elevated
        } else {
            RiskLevel::Nominal
        }
    }

    /// Returns `true` if `0 <= elevated < critical <= 100`.
    pub fn is_valid(&self) -> bool {
        (0.0..=100.0).contains(&self.elevated)
            && (0.0..=100.0).contains(&self.critical)
            && self.elevated < self.critical
    }
}
