//! Core types used throughout the torrentguard library.
//!
//! This module defines the verdict scale shared by pieces and whole
//! artifacts, the derived slot states used for display, the session
//! lifecycle states, and session identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single piece or of a whole artifact.
///
/// Variants are ordered by severity, so `Ord` gives the worst-of
/// reduction directly: `Malicious > Suspicious > Clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// No threat indicators.
    Clean,
    /// Potentially harmful but not conclusive.
    Suspicious,
    /// Confirmed threat.
    Malicious,
}

impl Verdict {
    /// Returns the more severe of the two verdicts.
    pub fn worst(self, other: Verdict) -> Verdict {
        self.max(other)
    }

    /// Returns `true` for [`Verdict::Malicious`].
    pub fn is_malicious(&self) -> bool {
        matches!(self, Self::Malicious)
    }

    /// Returns `true` for [`Verdict::Clean`].
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Returns the wire representation of the verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "CLEAN",
            Self::Suspicious => "SUSPICIOUS",
            Self::Malicious => "MALICIOUS",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display state of a visual slot.
///
/// A slot with no contributing piece is `Empty`. Ordering matches the
/// worst-of rule: `Malicious > Suspicious > Clean > Empty`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// No piece mapped to this slot yet.
    #[default]
    Empty,
    /// Every contributing piece was clean.
    Clean,
    /// At least one contributing piece was suspicious, none malicious.
    Suspicious,
    /// At least one contributing piece was malicious.
    Malicious,
}

impl SlotState {
    /// Folds a piece verdict into this slot state.
    ///
    /// The fold is commutative and idempotent, so the result does not
    /// depend on arrival order or on replays.
    pub fn absorb(self, verdict: Verdict) -> SlotState {
        self.max(SlotState::from(verdict))
    }

    /// Returns `true` if no piece has been mapped to the slot.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Verdict> for SlotState {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Clean => Self::Clean,
            Verdict::Suspicious => Self::Suspicious,
            Verdict::Malicious => Self::Malicious,
        }
    }
}

/// Lifecycle state of a scan session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, nothing received yet.
    #[default]
    Idle,
    /// At least one piece or a start signal was received.
    Scanning,
    /// The terminal event was applied. No transition leaves this state.
    Complete,
}

impl SessionState {
    /// Returns `true` once the terminal event has been applied.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns the name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque identifier of a scan session.
///
/// In practice this is the content hash of the uploaded artifact; see
/// [`crate::core::ArtifactHasher`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the session ID from the artifact contents (BLAKE3).
    pub fn from_artifact(data: &[u8]) -> Self {
        crate::core::ArtifactHasher::new()
            .hash_bytes(data)
            .session_id()
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Clamps a percentage-like value (risk score, progress) into `[0, 100]`.
///
/// `NaN` maps to `0`; infinities saturate.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_ordering() {
        assert!(Verdict::Clean < Verdict::Suspicious);
        assert!(Verdict::Suspicious < Verdict::Malicious);
        assert_eq!(Verdict::Clean.worst(Verdict::Malicious), Verdict::Malicious);
        assert_eq!(Verdict::Suspicious.worst(Verdict::Clean), Verdict::Suspicious);
    }

    #[test]
    fn test_verdict_wire_format() {
        let json = serde_json::to_string(&Verdict::Suspicious).unwrap();
        assert_eq!(json, "\"SUSPICIOUS\"");

        let parsed: Verdict = serde_json::from_str("\"MALICIOUS\"").unwrap();
        assert_eq!(parsed, Verdict::Malicious);

        assert!(serde_json::from_str::<Verdict>("\"malicious\"").is_err());
    }

    #[test]
    fn test_slot_state_absorb() {
        let slot = SlotState::Empty.absorb(Verdict::Clean);
        assert_eq!(slot, SlotState::Clean);

        let slot = slot.absorb(Verdict::Malicious).absorb(Verdict::Clean);
        assert_eq!(slot, SlotState::Malicious);

        assert!(SlotState::default().is_empty());
    }

    #[test]
    fn test_session_id_from_artifact() {
        let a = SessionId::from_artifact(b"d8:announce...e");
        let b = SessionId::from_artifact(b"d8:announce...e");
        let c = SessionId::from_artifact(b"other torrent");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(42.5), 42.5);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 100.0);
        assert_eq!(clamp_percent(f64::NEG_INFINITY), 0.0);
    }
}
