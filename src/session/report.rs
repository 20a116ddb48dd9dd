//! Serializable session exports.

use crate::core::{SessionError, SessionId, SessionState, Verdict};
use crate::policy::{Disposition, RiskLevel};
use crate::session::scan_session::{CompletionSummary, PieceResult, ScanSession};
use crate::slots::SlotCounts;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recorded pieces tallied by verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    /// Clean pieces.
    pub clean: usize,
    /// Suspicious pieces.
    pub suspicious: usize,
    /// Malicious pieces.
    pub malicious: usize,
}

impl VerdictCounts {
    /// Adds one verdict to the tally.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Clean => self.clean += 1,
            Verdict::Suspicious => self.suspicious += 1,
            Verdict::Malicious => self.malicious += 1,
        }
    }

    /// Returns the number of tallied pieces.
    pub fn total(&self) -> usize {
        self.clean + self.suspicious + self.malicious
    }
}

impl FromIterator<Verdict> for VerdictCounts {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        let mut counts = Self::default();
        for verdict in iter {
            counts.record(verdict);
        }
        counts
    }
}

/// Session metadata included in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Piece count fixed at creation.
    pub total_pieces: u64,

    /// Number of pieces the session intended to scan.
    pub requested_pieces: u64,

    /// Piece length from the start signal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piece_size: Option<u64>,

    /// Lifecycle state at export time.
    pub state: SessionState,

    /// Completion percentage at export time.
    pub progress: f64,

    /// Most recent source error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

/// Point-in-time export of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique identifier for this report.
    pub id: String,

    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// Session the report describes.
    pub session_id: SessionId,

    /// Session metadata.
    pub metadata: SessionMetadata,

    /// Display outcome.
    pub disposition: Disposition,

    /// Maximum risk.
    pub max_risk: f64,

    /// Gauge tier for `max_risk`.
    pub risk_level: RiskLevel,

    /// Terminal event, if the session completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CompletionSummary>,

    /// Recorded pieces by verdict.
    pub verdict_counts: VerdictCounts,

    /// Slot grid tallies.
    pub slot_counts: SlotCounts,

    /// Recorded pieces, ordered by index.
    pub pieces: Vec<PieceResult>,
}

impl SessionReport {
    /// Builds a report from the session's current state.
    pub fn from_session(session: &ScanSession) -> Self {
        let view = session.current_view();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            session_id: session.id().clone(),
            metadata: SessionMetadata {
                total_pieces: session.total_pieces(),
                requested_pieces: session.requested_pieces(),
                piece_size: session.piece_size(),
                state: session.state(),
                progress: session.progress(),
                last_error: session.last_error().map(str::to_string),
                created_at: session.created_at(),
            },
            disposition: view.disposition,
            max_risk: view.max_risk,
            risk_level: view.risk_level,
            summary: view.summary,
            verdict_counts: session.verdict_counts(),
            slot_counts: session.slots().counts(),
            pieces: session.pieces_seen().values().cloned().collect(),
        }
    }

    /// Returns the recorded pieces with a malicious verdict.
    pub fn malicious_pieces(&self) -> impl Iterator<Item = &PieceResult> {
        self.pieces.iter().filter(|p| p.verdict.is_malicious())
    }

    /// Serializes the report as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompletionEvent, PieceEvent, StartEvent};
    use crate::session::EngineConfig;

    fn finished_session() -> ScanSession {
        let mut session =
            ScanSession::new(SessionId::new("report"), 500, 5, &EngineConfig::default()).unwrap();
        session.on_start(&StartEvent {
            total_pieces: 500,
            downloading_pieces: 5,
            piece_size: Some(16_384),
        });
        session.on_piece_result(&PieceEvent::new(420, Verdict::Clean, 4.0));
        session.on_piece_result(&PieceEvent::new(20, Verdict::Malicious, 87.0));
        session.on_piece_result(&PieceEvent::new(3, Verdict::Suspicious, 51.0));
        session.on_complete(
            &CompletionEvent::new(Verdict::Malicious, 87.0)
                .with_quarantined(true)
                .with_counts(1, 3),
        );
        session
    }

    #[test]
    fn test_verdict_counts_from_iter() {
        let counts: VerdictCounts = [Verdict::Clean, Verdict::Malicious, Verdict::Clean]
            .into_iter()
            .collect();
        assert_eq!(counts.clean, 2);
        assert_eq!(counts.malicious, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_report_from_session() {
        let report = SessionReport::from_session(&finished_session());

        assert_eq!(report.disposition, Disposition::Contained);
        assert_eq!(report.risk_level, RiskLevel::Critical);
        assert_eq!(report.metadata.piece_size, Some(16_384));
        assert_eq!(report.verdict_counts.total(), 3);

        let indices: Vec<u64> = report.pieces.iter().map(|p| p.piece_index).collect();
        assert_eq!(indices, vec![3, 20, 420]);
        assert_eq!(report.malicious_pieces().count(), 1);

        // 420 wraps onto slot 20, where the malicious piece already sits.
        assert_eq!(report.slot_counts.malicious, 1);
        assert_eq!(report.slot_counts.suspicious, 1);
        assert_eq!(report.slot_counts.clean, 0);
    }

    #[test]
    fn test_report_json() {
        let report = SessionReport::from_session(&finished_session());
        let json = report.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["session_id"], "report");
        assert_eq!(value["disposition"], "contained");
        assert_eq!(value["summary"]["verdict"], "MALICIOUS");
        assert_eq!(value["summary"]["quarantined"], true);
        assert_eq!(value["pieces"][1]["verdict"], "MALICIOUS");
        assert_eq!(value["metadata"]["state"], "complete");
        assert!(uuid::Uuid::parse_str(value["id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_report_for_pending_session() {
        let session =
            ScanSession::new(SessionId::new("fresh"), 8, 8, &EngineConfig::default()).unwrap();
        let report = SessionReport::from_session(&session);

        assert_eq!(report.disposition, Disposition::Pending);
        assert!(report.summary.is_none());
        assert!(report.pieces.is_empty());
        assert_eq!(report.slot_counts.empty, 400);
    }
}
