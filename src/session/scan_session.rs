//! The per-session aggregation state machine.

use crate::audit;
use crate::core::{
    clamp_percent, CompletionEvent, ErrorEvent, PieceEvent, ProgressEvent, QuarantineInfo,
    ScanEvent, SessionError, SessionId, SessionState, StartEvent, Verdict,
};
use crate::policy::{Disposition, RiskThresholds};
use crate::session::config::EngineConfig;
use crate::session::notice::Notice;
use crate::session::report::VerdictCounts;
use crate::session::view::{SessionUpdate, SessionView};
use crate::slots::SlotGrid;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Differences below this are treated as equal when reconciling risk.
const RISK_TOLERANCE: f64 = 1e-6;

/// Recorded result of one piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceResult {
    /// Index of the piece.
    pub piece_index: u64,

    /// Verdict for the piece.
    pub verdict: Verdict,

    /// Risk score, clamped to `[0, 100]`.
    pub risk_score: f64,

    /// Piece hash, if the source reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piece_hash: Option<String>,
}

/// The terminal event as recorded by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Authoritative verdict.
    pub verdict: Verdict,

    /// Authoritative maximum risk, clamped to `[0, 100]`.
    pub max_risk_score: f64,

    /// Whether the artifact was quarantined.
    pub quarantined: bool,

    /// Malicious piece count reported by the scanner.
    pub malicious_pieces: u64,

    /// Downloaded piece count reported by the scanner.
    pub pieces_downloaded: u64,

    /// Payload location, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Quarantine details, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_info: Option<QuarantineInfo>,

    /// When the terminal event was applied.
    pub completed_at: DateTime<Utc>,
}

impl CompletionSummary {
    fn from_event(event: &CompletionEvent) -> Self {
        Self {
            verdict: event.verdict,
            max_risk_score: clamp_percent(event.max_risk_score),
            quarantined: event.quarantined,
            malicious_pieces: event.malicious_pieces,
            pieces_downloaded: event.pieces_downloaded,
            file_path: event.file_path.clone(),
            quarantine_info: event.quarantine_info.clone(),
            completed_at: Utc::now(),
        }
    }

    /// Returns the display disposition for this outcome.
    pub fn disposition(&self) -> Disposition {
        Disposition::resolve(self.verdict, self.quarantined)
    }
}

/// Aggregated state of one upload/download-and-scan lifecycle.
///
/// Every operation is a bounded synchronous update that returns a
/// [`SessionUpdate`]: the resulting view plus any [`Notice`]s describing
/// discarded or reconciled input. Bad input never fails an operation and
/// never leaves the session in an undefined state.
///
/// Memory is bounded by one [`PieceResult`] per distinct in-range index
/// plus a fixed-size [`SlotGrid`].
///
/// # Examples
///
/// ```rust
/// use torrentguard::core::{CompletionEvent, PieceEvent, SessionId, Verdict};
/// use torrentguard::policy::Disposition;
/// use torrentguard::session::{EngineConfig, ScanSession};
///
/// let mut session = ScanSession::new(SessionId::new("abc"), 1000, 25, &EngineConfig::default())?;
/// session.on_piece_result(&PieceEvent::new(400, Verdict::Malicious, 92.0));
///
/// let update = session.on_complete(
///     &CompletionEvent::new(Verdict::Malicious, 92.0).with_quarantined(true),
/// );
/// assert_eq!(update.view.disposition, Disposition::Contained);
/// # Ok::<(), torrentguard::core::SessionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ScanSession {
    id: SessionId,
    total_pieces: u64,
    requested_pieces: u64,
    pieces_seen: BTreeMap<u64, PieceResult>,
    max_risk: f64,
    progress: f64,
    state: SessionState,
    slots: SlotGrid,
    thresholds: RiskThresholds,
    piece_size: Option<u64>,
    last_error: Option<String>,
    summary: Option<CompletionSummary>,
    created_at: DateTime<Utc>,
}

impl ScanSession {
    /// Creates a session in the `Idle` state.
    ///
    /// `requested_pieces` above `total_pieces` is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TotalPiecesTooLarge`] when `total_pieces`
    /// exceeds `config.max_total_pieces`, and [`SessionError::Configuration`]
    /// when `config` does not validate; nothing is allocated in either case.
    pub fn new(
        id: SessionId,
        total_pieces: u64,
        requested_pieces: u64,
        config: &EngineConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if total_pieces > config.max_total_pieces {
            return Err(SessionError::TotalPiecesTooLarge {
                total: total_pieces,
                max: config.max_total_pieces,
            });
        }

        let requested_pieces = requested_pieces.min(total_pieces);
        audit::emit_session_created(&id, total_pieces, requested_pieces);

        Ok(Self {
            slots: SlotGrid::new(total_pieces, config.slot_count),
            id,
            total_pieces,
            requested_pieces,
            pieces_seen: BTreeMap::new(),
            max_risk: 0.0,
            progress: 0.0,
            state: SessionState::Idle,
            thresholds: config.risk_thresholds,
            piece_size: None,
            last_error: None,
            summary: None,
            created_at: Utc::now(),
        })
    }

    /// Applies a piece scan result.
    pub fn on_piece_result(&mut self, event: &PieceEvent) -> SessionUpdate {
        let previous = self.state;
        let mut notices = Vec::new();

        if self.state.is_complete() {
            notices.push(self.ignored_after_completion("piece_downloaded"));
            return self.update(previous, notices);
        }

        let index = match u64::try_from(event.piece_index) {
            Ok(index) if index < self.total_pieces => index,
            _ => {
                tracing::warn!(
                    session_id = %self.id,
                    piece_index = event.piece_index,
                    total_pieces = self.total_pieces,
                    "Discarding out-of-range piece"
                );
                audit::emit_piece_rejected(&self.id, event.piece_index, self.total_pieces);
                notices.push(Notice::PieceOutOfRange {
                    piece_index: event.piece_index,
                    total_pieces: self.total_pieces,
                });
                return self.update(previous, notices);
            }
        };

        let risk_score = clamp_percent(event.risk_score);
        let (verdict, piece_hash) = match self.pieces_seen.get(&index) {
            Some(existing) => (
                existing.verdict.worst(event.verdict),
                event.piece_hash.clone().or_else(|| existing.piece_hash.clone()),
            ),
            None => (event.verdict, event.piece_hash.clone()),
        };

        self.pieces_seen.insert(
            index,
            PieceResult {
                piece_index: index,
                verdict,
                risk_score,
                piece_hash,
            },
        );
        self.slots.apply(index, verdict);
        self.max_risk = self.max_risk.max(risk_score);

        if let Some(progress) = event.progress {
            self.advance_progress(progress, &mut notices);
        }
        self.begin_scanning();

        if event.verdict.is_malicious() {
            audit::emit_threat_detected(&self.id, index, risk_score);
            notices.push(Notice::ThreatDetected {
                piece_index: index,
                risk_score,
            });
        }

        tracing::trace!(
            session_id = %self.id,
            piece_index = index,
            verdict = %verdict,
            risk_score,
            max_risk = self.max_risk,
            "Piece recorded"
        );

        self.update(previous, notices)
    }

    /// Applies the terminal event.
    ///
    /// The terminal verdict and maximum risk are authoritative. Accepted
    /// once; later terminal events are ignored.
    pub fn on_complete(&mut self, event: &CompletionEvent) -> SessionUpdate {
        let previous = self.state;
        let mut notices = Vec::new();

        if self.state.is_complete() {
            tracing::info!(session_id = %self.id, "Ignoring redundant completion event");
            audit::emit_completion_ignored(&self.id);
            notices.push(Notice::RedundantCompletion);
            return self.update(previous, notices);
        }

        let summary = CompletionSummary::from_event(event);

        if (self.max_risk - summary.max_risk_score).abs() > RISK_TOLERANCE {
            audit::emit_risk_reconciled(&self.id, self.max_risk, summary.max_risk_score);
            notices.push(Notice::RiskReconciled {
                local: self.max_risk,
                authoritative: summary.max_risk_score,
            });
        }
        self.max_risk = summary.max_risk_score;

        // The terminal verdict is trusted even when the ledger disagrees.
        let ledger = self.ledger_verdict();
        if ledger.unwrap_or(Verdict::Clean) != summary.verdict {
            tracing::info!(
                session_id = %self.id,
                ledger = ?ledger,
                terminal = %summary.verdict,
                "Terminal verdict differs from piece ledger"
            );
            notices.push(Notice::VerdictDisagreement {
                ledger,
                terminal: summary.verdict,
            });
        }

        audit::emit_session_completed(&self.id, &summary, self.pieces_seen.len());
        self.summary = Some(summary);
        self.state = SessionState::Complete;

        self.update(previous, notices)
    }

    /// Applies the start signal.
    ///
    /// The piece counts fixed at creation are kept; a different count in
    /// the signal is reported but not adopted.
    pub fn on_start(&mut self, event: &StartEvent) -> SessionUpdate {
        let previous = self.state;
        let mut notices = Vec::new();

        if self.state.is_complete() {
            notices.push(self.ignored_after_completion("download_started"));
            return self.update(previous, notices);
        }

        if event.total_pieces != self.total_pieces {
            notices.push(Notice::TotalPiecesMismatch {
                expected: self.total_pieces,
                reported: event.total_pieces,
            });
        }
        if event.piece_size.is_some() {
            self.piece_size = event.piece_size;
        }
        self.begin_scanning();

        tracing::debug!(
            session_id = %self.id,
            downloading_pieces = event.downloading_pieces,
            piece_size = ?self.piece_size,
            "Download started"
        );

        self.update(previous, notices)
    }

    /// Applies an aggregate progress tick.
    pub fn on_progress(&mut self, event: &ProgressEvent) -> SessionUpdate {
        let mut notices = Vec::new();

        if self.state.is_complete() {
            notices.push(self.ignored_after_completion("download_progress"));
        } else {
            self.advance_progress(event.progress, &mut notices);
        }

        self.update(self.state, notices)
    }

    /// Records a failure reported by the source.
    ///
    /// The session stays in its current state; stalled sessions are the
    /// transport layer's concern.
    pub fn on_error(&mut self, event: &ErrorEvent) -> SessionUpdate {
        if self.state.is_complete() {
            let notice = self.ignored_after_completion("download_error");
            return self.update(self.state, vec![notice]);
        }

        tracing::warn!(session_id = %self.id, error = %event.error, "Scan source reported an error");
        self.last_error = Some(event.error.clone());
        self.update(self.state, vec![Notice::SourceError {
            message: event.error.clone(),
        }])
    }

    /// Applies any decoded event.
    pub fn apply(&mut self, event: &ScanEvent) -> SessionUpdate {
        match event {
            ScanEvent::Started(e) => self.on_start(e),
            ScanEvent::Piece(e) => self.on_piece_result(e),
            ScanEvent::Progress(e) => self.on_progress(e),
            ScanEvent::Complete(e) => self.on_complete(e),
            ScanEvent::Error(e) => self.on_error(e),
        }
    }

    /// Decodes and applies a JSON event.
    ///
    /// A payload that cannot be decoded is discarded whole and reported as
    /// [`Notice::MalformedEvent`]; the session is not touched.
    pub fn apply_raw(&mut self, payload: &str) -> SessionUpdate {
        match ScanEvent::from_json(payload) {
            Ok(event) => self.apply(&event),
            Err(err) => self.reject_malformed(err),
        }
    }

    /// Decodes and applies an already parsed JSON event.
    pub fn apply_value(&mut self, payload: serde_json::Value) -> SessionUpdate {
        match ScanEvent::from_value(payload) {
            Ok(event) => self.apply(&event),
            Err(err) => self.reject_malformed(err),
        }
    }

    /// Returns a snapshot for presentation. Never mutates.
    pub fn current_view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            state: self.state,
            total_pieces: self.total_pieces,
            requested_pieces: self.requested_pieces,
            pieces_seen: self.pieces_seen.len(),
            max_risk: self.max_risk,
            progress: self.progress,
            risk_level: self.thresholds.classify(self.max_risk),
            slots: self.slots.states().to_vec(),
            active_slots: self.slots.active_slots(),
            disposition: self.disposition(),
            summary: self.summary.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Returns the display disposition.
    pub fn disposition(&self) -> Disposition {
        self.summary
            .as_ref()
            .map(CompletionSummary::disposition)
            .unwrap_or(Disposition::Pending)
    }

    /// Returns the worst verdict in the piece ledger.
    pub fn ledger_verdict(&self) -> Option<Verdict> {
        self.pieces_seen.values().map(|p| p.verdict).max()
    }

    /// Tallies recorded pieces by verdict.
    pub fn verdict_counts(&self) -> VerdictCounts {
        self.pieces_seen.values().map(|p| p.verdict).collect()
    }

    /// Returns the session ID.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the piece count fixed at creation.
    pub fn total_pieces(&self) -> u64 {
        self.total_pieces
    }

    /// Returns the number of pieces the session intends to scan.
    pub fn requested_pieces(&self) -> u64 {
        self.requested_pieces
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the running maximum risk.
    pub fn max_risk(&self) -> f64 {
        self.max_risk
    }

    /// Returns the completion percentage.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Returns the piece ledger, ordered by index.
    pub fn pieces_seen(&self) -> &BTreeMap<u64, PieceResult> {
        &self.pieces_seen
    }

    /// Returns the recorded result of a piece.
    pub fn piece(&self, index: u64) -> Option<&PieceResult> {
        self.pieces_seen.get(&index)
    }

    /// Returns the slot grid.
    pub fn slots(&self) -> &SlotGrid {
        &self.slots
    }

    /// Returns the recorded terminal event.
    pub fn summary(&self) -> Option<&CompletionSummary> {
        self.summary.as_ref()
    }

    /// Returns the most recent source error.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the piece length reported by the start signal.
    pub fn piece_size(&self) -> Option<u64> {
        self.piece_size
    }

    /// Returns when the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn begin_scanning(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Scanning;
            tracing::debug!(session_id = %self.id, "Session scanning");
        }
    }

    fn advance_progress(&mut self, incoming: f64, notices: &mut Vec<Notice>) {
        let incoming = clamp_percent(incoming);
        if incoming < self.progress {
            notices.push(Notice::ProgressRegressed {
                current: self.progress,
                incoming,
            });
        } else {
            self.progress = incoming;
        }
    }

    fn ignored_after_completion(&self, event: &str) -> Notice {
        tracing::debug!(session_id = %self.id, event, "Ignoring event after completion");
        Notice::IgnoredAfterCompletion {
            event: event.to_string(),
        }
    }

    fn reject_malformed(&self, err: SessionError) -> SessionUpdate {
        let reason = match err {
            SessionError::MalformedEvent { reason } => reason,
            other => other.to_string(),
        };
        tracing::error!(session_id = %self.id, reason = %reason, "Discarding malformed event");
        audit::emit_malformed_event(&self.id, &reason);
        self.update(self.state, vec![Notice::MalformedEvent { reason }])
    }

    fn update(&self, previous_state: SessionState, notices: Vec<Notice>) -> SessionUpdate {
        SessionUpdate {
            previous_state,
            view: self.current_view(),
            notices,
        }
    }
}
