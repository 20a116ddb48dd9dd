//! Structured audit logging.
//!
//! Session lifecycle and threat events are emitted through `tracing`
//! under the `torrentguard::audit` target, so any subscriber (JSON file,
//! OpenTelemetry, etc.) can capture them separately from diagnostics.

mod events;

pub use events::{
    emit_completion_ignored, emit_malformed_event, emit_piece_rejected, emit_report_generated,
    emit_risk_reconciled, emit_session_completed, emit_session_created, emit_session_discarded,
    emit_threat_detected, AuditEvent, CompletionAuditEvent,
};
