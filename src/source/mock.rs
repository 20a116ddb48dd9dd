//! Scripted scan source for tests and demos.
//!
//! The mock produces the same event sequence a live downloader-and-scanner
//! would: a start signal, one piece result plus a progress tick per
//! downloaded piece, and a terminal event whose verdict is derived from
//! the maximum risk.

use crate::core::{
    CompletionEvent, PieceEvent, ProgressEvent, QuarantineInfo, ScanEvent, StartEvent, Verdict,
};

use std::collections::HashMap;

#[cfg(feature = "tokio-runtime")]
use crate::core::{SessionError, SessionId};
#[cfg(feature = "tokio-runtime")]
use crate::manager::Envelope;
#[cfg(feature = "tokio-runtime")]
use std::time::Duration;
#[cfg(feature = "tokio-runtime")]
use tokio::sync::mpsc;

/// Terminal verdict is MALICIOUS above this maximum risk.
pub const MALICIOUS_RISK: f64 = 70.0;

/// Terminal verdict is SUSPICIOUS above this maximum risk.
pub const SUSPICIOUS_RISK: f64 = 40.0;

/// Derives the terminal verdict from a maximum risk.
pub fn verdict_for_risk(max_risk: f64) -> Verdict {
    if max_risk > MALICIOUS_RISK {
        Verdict::Malicious
    } else if max_risk > SUSPICIOUS_RISK {
        Verdict::Suspicious
    } else {
        Verdict::Clean
    }
}

/// A scripted source of scan events.
///
/// # Examples
///
/// ```rust
/// use torrentguard::core::{ScanEvent, Verdict};
/// use torrentguard::source::MockSource;
///
/// let source = MockSource::new(1000, 3).with_piece(1, Verdict::Malicious, 91.0);
/// let events = source.events();
///
/// assert!(matches!(events.first(), Some(ScanEvent::Started(_))));
/// assert!(matches!(events.last(), Some(ScanEvent::Complete(c)) if c.quarantined));
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    total_pieces: u64,
    requested_pieces: u64,
    piece_size: Option<u64>,
    default_result: (Verdict, f64),
    scripted: HashMap<u64, (Verdict, f64)>,
    order: Option<Vec<u64>>,
    quarantine: bool,
    file_path: Option<String>,
}

impl MockSource {
    /// Creates a source that downloads the first `requested_pieces` pieces.
    ///
    /// `requested_pieces` above `total_pieces` is clamped.
    pub fn new(total_pieces: u64, requested_pieces: u64) -> Self {
        Self {
            total_pieces,
            requested_pieces: requested_pieces.min(total_pieces),
            piece_size: None,
            default_result: (Verdict::Clean, 5.0),
            scripted: HashMap::new(),
            order: None,
            quarantine: true,
            file_path: None,
        }
    }

    /// Scripts the result of one piece.
    pub fn with_piece(mut self, index: u64, verdict: Verdict, risk_score: f64) -> Self {
        self.scripted.insert(index, (verdict, risk_score));
        self
    }

    /// Sets the result of pieces that are not scripted.
    pub fn with_default(mut self, verdict: Verdict, risk_score: f64) -> Self {
        self.default_result = (verdict, risk_score);
        self
    }

    /// Sets the order in which pieces arrive.
    ///
    /// Indices are emitted as given, including duplicates and indices
    /// outside the torrent.
    pub fn with_order(mut self, order: Vec<u64>) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the piece length reported in the start signal.
    pub fn with_piece_size(mut self, piece_size: u64) -> Self {
        self.piece_size = Some(piece_size);
        self
    }

    /// Enables or disables quarantine of malicious payloads.
    pub fn with_quarantine(mut self, enabled: bool) -> Self {
        self.quarantine = enabled;
        self
    }

    /// Sets the payload location reported on completion.
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Returns the torrent's piece count.
    pub fn total_pieces(&self) -> u64 {
        self.total_pieces
    }

    /// Returns the number of pieces the source downloads.
    pub fn requested_pieces(&self) -> u64 {
        self.requested_pieces
    }

    /// Returns the full event sequence.
    pub fn events(&self) -> Vec<ScanEvent> {
        let order = self
            .order
            .clone()
            .unwrap_or_else(|| (0..self.requested_pieces).collect());
        let expected = order.len().max(1) as f64;

        let mut events = Vec::with_capacity(order.len() * 2 + 2);
        events.push(ScanEvent::Started(StartEvent {
            total_pieces: self.total_pieces,
            downloading_pieces: order.len() as u64,
            piece_size: self.piece_size,
        }));

        let mut max_risk: f64 = 0.0;
        let mut malicious_pieces = 0;
        for (done, &index) in order.iter().enumerate() {
            let (verdict, risk_score) = self.result_for(index);
            let progress = (done + 1) as f64 / expected * 100.0;

            max_risk = max_risk.max(risk_score);
            if verdict.is_malicious() {
                malicious_pieces += 1;
            }

            events.push(ScanEvent::Piece(
                PieceEvent::new(index as i64, verdict, risk_score)
                    .with_progress(progress)
                    .with_piece_hash(piece_hash(index)),
            ));
            events.push(ScanEvent::Progress(ProgressEvent {
                progress,
                pieces_completed: Some(done as u64 + 1),
                total_pieces: Some(order.len() as u64),
            }));
        }

        events.push(ScanEvent::Complete(self.completion(
            max_risk,
            malicious_pieces,
            order.len() as u64,
        )));
        events
    }

    /// Sends every event to a feed, pausing `latency` between events.
    ///
    /// Returns the number of events sent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::FeedClosed`] if the feed stopped.
    #[cfg(feature = "tokio-runtime")]
    pub async fn stream_into(
        &self,
        session_id: &SessionId,
        feed: &mpsc::Sender<Envelope>,
        latency: Option<Duration>,
    ) -> Result<usize, SessionError> {
        let events = self.events();
        let count = events.len();

        for event in events {
            feed.send(Envelope::event(session_id.clone(), event))
                .await
                .map_err(|_| SessionError::FeedClosed)?;
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
        }

        tracing::debug!(session_id = %session_id, events = count, "Mock source finished");
        Ok(count)
    }

    fn result_for(&self, index: u64) -> (Verdict, f64) {
        self.scripted
            .get(&index)
            .copied()
            .unwrap_or(self.default_result)
    }

    fn completion(&self, max_risk: f64, malicious_pieces: u64, downloaded: u64) -> CompletionEvent {
        let verdict = verdict_for_risk(max_risk);
        let mut event = CompletionEvent::new(verdict, max_risk)
            .with_counts(malicious_pieces, downloaded);

        if let Some(path) = &self.file_path {
            event = event.with_file_path(path.clone());
        }

        if verdict.is_malicious() && self.quarantine {
            let quarantine_id = uuid::Uuid::new_v4().simple().to_string();
            event = event
                .with_quarantined(true)
                .with_quarantine_info(QuarantineInfo {
                    message: Some(format!("File quarantined: {quarantine_id}")),
                    quarantine_id: Some(quarantine_id),
                    error: None,
                });
        }

        event
    }
}

fn piece_hash(index: u64) -> String {
    blake3::hash(&index.to_le_bytes()).to_hex().to_string()
}
