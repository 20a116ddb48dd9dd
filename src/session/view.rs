//! Read-only snapshots handed to presentation sinks.

use crate::core::{SessionId, SessionState, SlotState};
use crate::policy::{Disposition, RiskLevel};
use crate::session::notice::{Notice, Severity};
use crate::session::scan_session::CompletionSummary;

use serde::{Deserialize, Serialize};

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// Session ID.
    pub session_id: SessionId,

    /// Lifecycle state.
    pub state: SessionState,

    /// Piece count fixed at creation.
    pub total_pieces: u64,

    /// Number of pieces the session intends to scan.
    pub requested_pieces: u64,

    /// Number of distinct pieces recorded.
    pub pieces_seen: usize,

    /// Maximum risk so far, or the authoritative value once complete.
    pub max_risk: f64,

    /// Completion percentage.
    pub progress: f64,

    /// Gauge tier for `max_risk`.
    pub risk_level: RiskLevel,

    /// Slot states, always `slot_count` long.
    pub slots: Vec<SlotState>,

    /// Number of leading slots that can receive pieces.
    pub active_slots: usize,

    /// Final display outcome, `Pending` until complete.
    pub disposition: Disposition,

    /// Terminal event, once complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CompletionSummary>,

    /// Most recent source error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionView {
    /// Returns `true` once the terminal event was applied.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Fraction of requested pieces recorded, in `[0, 100]`.
    pub fn coverage(&self) -> f64 {
        if self.requested_pieces == 0 {
            return 0.0;
        }
        (self.pieces_seen as f64 / self.requested_pieces as f64 * 100.0).min(100.0)
    }
}

/// Result of applying one event: the new view and what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// Lifecycle state before the event.
    pub previous_state: SessionState,

    /// View after the event.
    pub view: SessionView,

    /// Notices raised while applying the event.
    pub notices: Vec<Notice>,
}

impl SessionUpdate {
    /// Returns the highest notice severity, if any notice was raised.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.notices.iter().map(Notice::severity).max()
    }

    /// Returns the new state if the event moved the session forward.
    pub fn transition(&self) -> Option<SessionState> {
        (self.previous_state != self.view.state).then_some(self.view.state)
    }

    /// Returns `true` if no notice was raised.
    pub fn is_quiet(&self) -> bool {
        self.notices.is_empty()
    }
}
