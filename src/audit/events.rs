//! Audit event types and emission functions.

use crate::core::SessionId;
use crate::session::{CompletionSummary, SessionReport};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit record for a session reaching its terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionAuditEvent {
    /// When the terminal event was applied.
    pub timestamp: DateTime<Utc>,

    /// Session ID.
    pub session_id: String,

    /// Terminal verdict.
    pub verdict: String,

    /// Display outcome.
    pub disposition: String,

    /// Authoritative maximum risk.
    pub max_risk_score: f64,

    /// Whether the artifact was quarantined.
    pub quarantined: bool,

    /// Quarantine ID, if the scanner reported one.
    pub quarantine_id: Option<String>,

    /// Malicious piece count reported by the scanner.
    pub malicious_pieces: u64,

    /// Distinct pieces recorded by the session.
    pub pieces_recorded: usize,
}

impl CompletionAuditEvent {
    /// Builds the record from a session's terminal summary.
    pub fn new(session_id: &SessionId, summary: &CompletionSummary, pieces_recorded: usize) -> Self {
        Self {
            timestamp: summary.completed_at,
            session_id: session_id.to_string(),
            verdict: summary.verdict.as_str().to_string(),
            disposition: summary.disposition().headline().to_string(),
            max_risk_score: summary.max_risk_score,
            quarantined: summary.quarantined,
            quarantine_id: summary
                .quarantine_info
                .as_ref()
                .and_then(|info| info.quarantine_id.clone()),
            malicious_pieces: summary.malicious_pieces,
            pieces_recorded,
        }
    }
}

impl AuditEvent for CompletionAuditEvent {
    fn event_type(&self) -> &'static str {
        "session_completed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a new session.
pub fn emit_session_created(session_id: &SessionId, total_pieces: u64, requested_pieces: u64) {
    tracing::info!(
        target: "torrentguard::audit",
        event_type = "session_created",
        session_id = %session_id,
        total_pieces,
        requested_pieces,
        "Session created"
    );
}

/// Emits an audit event for a discarded out-of-range piece.
pub fn emit_piece_rejected(session_id: &SessionId, piece_index: i64, total_pieces: u64) {
    tracing::warn!(
        target: "torrentguard::audit",
        event_type = "piece_rejected",
        session_id = %session_id,
        piece_index,
        total_pieces,
        "Piece rejected"
    );
}

/// Emits an audit event for a malicious piece.
pub fn emit_threat_detected(session_id: &SessionId, piece_index: u64, risk_score: f64) {
    tracing::warn!(
        target: "torrentguard::audit",
        event_type = "threat_detected",
        session_id = %session_id,
        piece_index,
        risk_score,
        "Threat detected"
    );
}

/// Emits an audit event for a reconciled maximum risk.
pub fn emit_risk_reconciled(session_id: &SessionId, local: f64, authoritative: f64) {
    tracing::info!(
        target: "torrentguard::audit",
        event_type = "risk_reconciled",
        session_id = %session_id,
        local_max_risk = local,
        authoritative_max_risk = authoritative,
        "Maximum risk reconciled with terminal event"
    );
}

/// Emits an audit event for a completed session.
pub fn emit_session_completed(
    session_id: &SessionId,
    summary: &CompletionSummary,
    pieces_recorded: usize,
) {
    let event = CompletionAuditEvent::new(session_id, summary, pieces_recorded);

    tracing::info!(
        target: "torrentguard::audit",
        event_type = event.event_type(),
        session_id = %event.session_id,
        verdict = %event.verdict,
        disposition = %event.disposition,
        max_risk_score = event.max_risk_score,
        quarantined = event.quarantined,
        quarantine_id = ?event.quarantine_id,
        malicious_pieces = event.malicious_pieces,
        pieces_recorded = event.pieces_recorded,
        "Session completed"
    );
}

/// Emits an audit event for a terminal event received twice.
pub fn emit_completion_ignored(session_id: &SessionId) {
    tracing::info!(
        target: "torrentguard::audit",
        event_type = "completion_ignored",
        session_id = %session_id,
        "Redundant completion ignored"
    );
}

/// Emits an audit event for an undecodable payload.
pub fn emit_malformed_event(session_id: &SessionId, reason: &str) {
    tracing::warn!(
        target: "torrentguard::audit",
        event_type = "malformed_event",
        session_id = %session_id,
        reason = %reason,
        "Malformed event discarded"
    );
}

/// Emits an audit event for a session removed from a registry.
pub fn emit_session_discarded(session_id: &SessionId, completed: bool) {
    tracing::info!(
        target: "torrentguard::audit",
        event_type = "session_discarded",
        session_id = %session_id,
        completed,
        "Session discarded"
    );
}

/// Emits an audit event for a generated report.
pub fn emit_report_generated(report: &SessionReport) {
    tracing::info!(
        target: "torrentguard::audit",
        event_type = "report_generated",
        report_id = %report.id,
        session_id = %report.session_id,
        disposition = %report.disposition,
        clean = report.verdict_counts.clean,
        suspicious = report.verdict_counts.suspicious,
        malicious = report.verdict_counts.malicious,
        "Session report generated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompletionEvent, QuarantineInfo, Verdict};
    use crate::session::{EngineConfig, ScanSession};

    #[test]
    fn test_completion_audit_event() {
        let mut session =
            ScanSession::new(SessionId::new("s-1"), 10, 10, &EngineConfig::default()).unwrap();
        session.on_complete(
            &CompletionEvent::new(Verdict::Malicious, 93.0)
                .with_quarantined(true)
                .with_counts(2, 10)
                .with_quarantine_info(QuarantineInfo {
                    quarantine_id: Some("q-77".into()),
                    message: None,
                    error: None,
                }),
        );

        let event = CompletionAuditEvent::new(session.id(), session.summary().unwrap(), 0);
        assert_eq!(event.event_type(), "session_completed");
        assert_eq!(event.verdict, "MALICIOUS");
        assert_eq!(event.disposition, "CONTAINMENT_ACTIVE");
        assert_eq!(event.quarantine_id.as_deref(), Some("q-77"));
        assert_eq!(event.timestamp(), session.summary().unwrap().completed_at);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["malicious_pieces"], 2);
    }
}
