//! Events emitted by the piece scan source.
//!
//! The source speaks JSON. Each event kind has its own payload struct;
//! [`ScanEvent`] wraps them under an `event` tag using the source's
//! socket event names (`piece_downloaded`, `download_complete`, ...).

use crate::core::error::SessionError;
use crate::core::types::Verdict;

use serde::{Deserialize, Serialize};

/// Result of scanning one piece.
///
/// Accepts both the flat shape
/// `{"piece_index": 3, "verdict": "CLEAN", "risk_score": 4.2}` and the
/// nested shape emitted by the download server,
/// `{"piece_index": 3, "scan_result": {"verdict": "CLEAN", "risk_score": 4.2}}`.
/// Flat fields win when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WirePieceEvent")]
pub struct PieceEvent {
    /// Index of the piece. Signed so that negative indices from a
    /// misbehaving source are reported as out of range rather than as
    /// decode failures. Indices above `i64::MAX` saturate.
    pub piece_index: i64,

    /// Verdict for this piece.
    pub verdict: Verdict,

    /// Risk score, nominally in `[0, 100]`.
    pub risk_score: f64,

    /// Cumulative completion percentage, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    /// Piece hash, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piece_hash: Option<String>,
}

impl PieceEvent {
    /// Creates a new piece event.
    pub fn new(piece_index: i64, verdict: Verdict, risk_score: f64) -> Self {
        Self {
            piece_index,
            verdict,
            risk_score,
            progress: None,
            piece_hash: None,
        }
    }

    /// Sets the progress percentage.
    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the piece hash.
    pub fn with_piece_hash(mut self, hash: impl Into<String>) -> Self {
        self.piece_hash = Some(hash.into());
        self
    }
}

#[derive(Deserialize)]
struct WirePieceEvent {
    #[serde(deserialize_with = "saturating_index")]
    piece_index: i64,
    #[serde(default)]
    verdict: Option<Verdict>,
    #[serde(default)]
    risk_score: Option<f64>,
    #[serde(default)]
    scan_result: Option<WireScanResult>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    piece_hash: Option<String>,
}

#[derive(Deserialize)]
struct WireScanResult {
    #[serde(default)]
    verdict: Option<Verdict>,
    #[serde(default)]
    risk_score: Option<f64>,
}

fn saturating_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct IndexVisitor;

    impl serde::de::Visitor<'_> for IndexVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("an integer piece index")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_i128<E: serde::de::Error>(self, v: i128) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX }))
        }

        fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }
    }

    deserializer.deserialize_i64(IndexVisitor)
}

impl TryFrom<WirePieceEvent> for PieceEvent {
    type Error = String;

    fn try_from(wire: WirePieceEvent) -> Result<Self, Self::Error> {
        let nested = wire.scan_result.as_ref();
        let verdict = wire
            .verdict
            .or_else(|| nested.and_then(|r| r.verdict))
            .ok_or_else(|| "missing field `verdict`".to_string())?;
        let risk_score = wire
            .risk_score
            .or_else(|| nested.and_then(|r| r.risk_score))
            .ok_or_else(|| "missing field `risk_score`".to_string())?;

        Ok(Self {
            piece_index: wire.piece_index,
            verdict,
            risk_score,
            progress: wire.progress,
            piece_hash: wire.piece_hash,
        })
    }
}

/// Quarantine details attached to a completion event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarantineInfo {
    /// Identifier assigned by the quarantine store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarantine_id: Option<String>,

    /// Human-readable status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Failure reason, if quarantining failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal event closing a session.
///
/// Its fields are authoritative: the scanner may apply policy beyond
/// simple aggregation (quarantine thresholds, for example).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Final verdict for the artifact.
    pub verdict: Verdict,

    /// Authoritative maximum risk score.
    pub max_risk_score: f64,

    /// Whether the artifact was moved to quarantine.
    pub quarantined: bool,

    /// Number of pieces the scanner classified as malicious.
    pub malicious_pieces: u64,

    /// Number of pieces that were downloaded and scanned.
    pub pieces_downloaded: u64,

    /// Where the downloaded payload was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Quarantine details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarantine_info: Option<QuarantineInfo>,
}

impl CompletionEvent {
    /// Creates a completion event with zero counts and no quarantine.
    pub fn new(verdict: Verdict, max_risk_score: f64) -> Self {
        Self {
            verdict,
            max_risk_score,
            quarantined: false,
            malicious_pieces: 0,
            pieces_downloaded: 0,
            file_path: None,
            quarantine_info: None,
        }
    }

    /// Sets the quarantine flag.
    pub fn with_quarantined(mut self, quarantined: bool) -> Self {
        self.quarantined = quarantined;
        self
    }

    /// Sets the piece counters.
    pub fn with_counts(mut self, malicious_pieces: u64, pieces_downloaded: u64) -> Self {
        self.malicious_pieces = malicious_pieces;
        self.pieces_downloaded = pieces_downloaded;
        self
    }

    /// Sets the payload path.
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Sets the quarantine details.
    pub fn with_quarantine_info(mut self, info: QuarantineInfo) -> Self {
        self.quarantine_info = Some(info);
        self
    }
}

/// Start signal sent when the download begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartEvent {
    /// Piece count reported by the source.
    pub total_pieces: u64,

    /// Number of pieces the source will fetch and scan.
    pub downloading_pieces: u64,

    /// Piece length in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece_size: Option<u64>,
}

/// Aggregate progress tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion percentage.
    pub progress: f64,

    /// Pieces completed so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces_completed: Option<u64>,

    /// Pieces the source intends to complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pieces: Option<u64>,
}

/// Transport or download failure reported by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Failure message.
    pub error: String,
}

/// Any event produced by the scan source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ScanEvent {
    /// The download started.
    #[serde(rename = "download_started")]
    Started(StartEvent),

    /// A piece finished downloading and was scanned.
    #[serde(rename = "piece_downloaded")]
    Piece(PieceEvent),

    /// Aggregate progress tick.
    #[serde(rename = "download_progress")]
    Progress(ProgressEvent),

    /// The session ended.
    #[serde(rename = "download_complete")]
    Complete(CompletionEvent),

    /// The source reported a failure.
    #[serde(rename = "download_error")]
    Error(ErrorEvent),
}

impl ScanEvent {
    /// Decodes an event from a JSON string.
    pub fn from_json(payload: &str) -> Result<Self, SessionError> {
        serde_json::from_str(payload).map_err(SessionError::malformed)
    }

    /// Decodes an event from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SessionError> {
        serde_json::from_value(value).map_err(SessionError::malformed)
    }

    /// Returns the wire name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started(_) => "download_started",
            Self::Piece(_) => "piece_downloaded",
            Self::Progress(_) => "download_progress",
            Self::Complete(_) => "download_complete",
            Self::Error(_) => "download_error",
        }
    }

    /// Returns `true` for the terminal event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

impl From<PieceEvent> for ScanEvent {
    fn from(event: PieceEvent) -> Self {
        Self::Piece(event)
    }
}

impl From<CompletionEvent> for ScanEvent {
    fn from(event: CompletionEvent) -> Self {
        Self::Complete(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_flat_piece() {
        let event = ScanEvent::from_json(
            r#"{"event":"piece_downloaded","piece_index":12,"verdict":"SUSPICIOUS","risk_score":55.5,"progress":40}"#,
        )
        .unwrap();

        let expected = PieceEvent::new(12, Verdict::Suspicious, 55.5).with_progress(40.0);
        assert_eq!(event, ScanEvent::Piece(expected));
    }

    #[test]
    fn test_decode_huge_index_saturates() {
        let event = ScanEvent::from_json(
            r#"{"event":"piece_downloaded","piece_index":18446744073709551615,"verdict":"CLEAN","risk_score":1}"#,
        )
        .unwrap();
        assert!(matches!(event, ScanEvent::Piece(ref p) if p.piece_index == i64::MAX));

        let event = ScanEvent::from_value(json!({
            "event": "piece_downloaded",
            "piece_index": u64::MAX,
            "verdict": "CLEAN",
            "risk_score": 1
        }))
        .unwrap();
        assert!(matches!(event, ScanEvent::Piece(ref p) if p.piece_index == i64::MAX));

        let result = ScanEvent::from_json(
            r#"{"event":"piece_downloaded","piece_index":"7","verdict":"CLEAN","risk_score":1}"#,
        );
        assert!(matches!(result, Err(SessionError::MalformedEvent { .. })));
    }

    #[test]
    fn test_decode_nested_piece() {
        let event = ScanEvent::from_value(json!({
            "event": "piece_downloaded",
            "download_id": "dl-1",
            "piece_index": 3,
            "piece_hash": "piece_3_abcd1234",
            "scan_result": {
                "malicious": true,
                "confidence": 0.93,
                "risk_score": 91.0,
                "verdict": "MALICIOUS",
                "scanner": "hybrid"
            },
            "progress": 12.0
        }))
        .unwrap();

        match event {
            ScanEvent::Piece(piece) => {
                assert_eq!(piece.piece_index, 3);
                assert_eq!(piece.verdict, Verdict::Malicious);
                assert_eq!(piece.risk_score, 91.0);
                assert_eq!(piece.piece_hash.as_deref(), Some("piece_3_abcd1234"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let err = ScanEvent::from_json(r#"{"event":"piece_downloaded","piece_index":1,"risk_score":3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("verdict"));

        let err = ScanEvent::from_json(r#"{"event":"piece_downloaded","verdict":"CLEAN","risk_score":3}"#)
            .unwrap_err();
        assert!(err.to_string().contains("piece_index"));

        assert!(ScanEvent::from_json(r#"{"event":"piece_downloaded","piece_index":1,"verdict":"BENIGN","risk_score":1}"#).is_err());
        assert!(ScanEvent::from_json(r#"{"event":"mystery"}"#).is_err());
    }

    #[test]
    fn test_decode_completion() {
        let event = ScanEvent::from_value(json!({
            "event": "download_complete",
            "download_id": "dl-1",
            "pieces_downloaded": 25,
            "file_path": "/downloads/payload.iso",
            "verdict": "MALICIOUS",
            "max_risk_score": 92.4,
            "malicious_pieces": 3,
            "quarantined": true,
            "quarantine_info": {"success": true, "quarantine_id": "q-77", "message": "File quarantined"}
        }))
        .unwrap();

        let ScanEvent::Complete(done) = event else {
            panic!("expected completion");
        };
        assert!(done.quarantined);
        assert_eq!(done.pieces_downloaded, 25);
        assert_eq!(
            done.quarantine_info.and_then(|q| q.quarantine_id).as_deref(),
            Some("q-77")
        );
    }

    #[test]
    fn test_decode_completion_null_quarantine_info() {
        let event = ScanEvent::from_value(json!({
            "event": "download_complete",
            "verdict": "CLEAN",
            "max_risk_score": 3,
            "malicious_pieces": 0,
            "pieces_downloaded": 10,
            "quarantined": false,
            "quarantine_info": null
        }))
        .unwrap();
        assert!(event.is_terminal());
    }

    #[test]
    fn test_kind_matches_tag() {
        let event = ScanEvent::Progress(ProgressEvent {
            progress: 50.0,
            pieces_completed: Some(5),
            total_pieces: Some(10),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], event.kind());
    }
}
