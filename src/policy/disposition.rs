//! Final disposition of a scanned artifact.

use crate::core::Verdict;

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the dashboard shows as the outcome of a session.
///
/// The disposition is for display only. The true outcome is whatever the
/// terminal event reported; this type just resolves how to render it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The session has not completed.
    #[default]
    Pending,
    /// The artifact is clean and may be released.
    Clean,
    /// The artifact is suspicious.
    Suspicious,
    /// The artifact is malicious but was not contained.
    ThreatIdentified,
    /// The artifact was quarantined.
    Contained,
}

impl Disposition {
    /// Resolves the disposition from the terminal verdict and quarantine flag.
    ///
    /// Quarantine takes priority over the raw verdict: a quarantined
    /// artifact always renders as contained.
    pub fn resolve(verdict: Verdict, quarantined: bool) -> Self {
        if quarantined {
            return Self::Contained;
        }
        match verdict {
            Verdict::Malicious => Self::ThreatIdentified,
            Verdict::Suspicious => Self::Suspicious,
            Verdict::Clean => Self::Clean,
        }
    }

    /// Returns the dashboard headline.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Pending => "SCAN_PENDING",
            Self::Clean => "SPECIMEN_CLEAN",
            Self::Suspicious => "SUSPICIOUS_ACTIVITY",
            Self::ThreatIdentified => "THREAT_IDENTIFIED",
            Self::Contained => "CONTAINMENT_ACTIVE",
        }
    }

    /// Returns a one-line description for reports.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Scan in progress.",
            Self::Clean => "No malicious code structures detected. File release authorized.",
            Self::Suspicious => "Suspicious patterns detected. Review before release.",
            Self::ThreatIdentified => {
                "Malicious patterns detected. Manual intervention recommended."
            }
            Self::Contained => "High-confidence threat. Automated quarantine enforced.",
        }
    }

    /// Returns `true` once the session has a final outcome.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the severity level of the disposition (higher = more severe).
    pub fn severity(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Clean => 1,
            Self::Suspicious => 2,
            Self::ThreatIdentified => 3,
            Self::Contained => 4,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarantine_wins_over_verdict() {
        assert_eq!(
            Disposition::resolve(Verdict::Malicious, true),
            Disposition::Contained
        );
        assert_eq!(
            Disposition::resolve(Verdict::Clean, true),
            Disposition::Contained
        );
    }

    #[test]
    fn test_resolve_without_quarantine() {
        assert_eq!(
            Disposition::resolve(Verdict::Malicious, false),
            Disposition::ThreatIdentified
        );
        assert_eq!(
            Disposition::resolve(Verdict::Suspicious, false),
            Disposition::Suspicious
        );
        assert_eq!(Disposition::resolve(Verdict::Clean, false), Disposition::Clean);
    }

    #[test]
    fn test_headlines() {
        assert_eq!(Disposition::Contained.to_string(), "CONTAINMENT_ACTIVE");
        assert_eq!(Disposition::default().headline(), "SCAN_PENDING");
        assert!(!Disposition::Pending.is_final());
        assert!(Disposition::Contained.severity() > Disposition::ThreatIdentified.severity());
    }
}
