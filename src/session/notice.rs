//! Status notices returned alongside session updates.

use crate::core::Verdict;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a presentation sink should surface a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; nothing was lost.
    Info,
    /// Data was discarded or a threat was seen.
    Warning,
    /// An event could not be used at all.
    Error,
}

impl Severity {
    /// Returns the name of the severity.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A data-quality or status report produced while applying an event.
///
/// Notices never change session state; they describe what the engine did
/// with an event so the sink can decide how to show it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A piece index outside `[0, total_pieces)` was discarded.
    PieceOutOfRange {
        /// Index as received.
        piece_index: i64,
        /// Session piece count.
        total_pieces: u64,
    },

    /// A malicious piece was recorded.
    ThreatDetected {
        /// Index of the piece.
        piece_index: u64,
        /// Clamped risk score of the piece.
        risk_score: f64,
    },

    /// An event arrived after the terminal event and was ignored.
    IgnoredAfterCompletion {
        /// Wire name of the ignored event.
        event: String,
    },

    /// A progress value lower than the current one was ignored.
    ProgressRegressed {
        /// Progress kept.
        current: f64,
        /// Progress received.
        incoming: f64,
    },

    /// The terminal maximum risk replaced the locally tracked one.
    RiskReconciled {
        /// Locally tracked maximum.
        local: f64,
        /// Authoritative maximum from the terminal event.
        authoritative: f64,
    },

    /// The ledger's worst verdict differs from the terminal verdict.
    VerdictDisagreement {
        /// Worst verdict in the piece ledger, if any piece was recorded.
        ledger: Option<Verdict>,
        /// Verdict from the terminal event (kept).
        terminal: Verdict,
    },

    /// A second terminal event was ignored.
    RedundantCompletion,

    /// The start signal reported a different piece count than the session.
    TotalPiecesMismatch {
        /// Piece count fixed at session creation.
        expected: u64,
        /// Piece count in the start signal.
        reported: u64,
    },

    /// An event payload could not be decoded and was discarded.
    MalformedEvent {
        /// Decoder message.
        reason: String,
    },

    /// The source reported a failure.
    SourceError {
        /// Failure message.
        message: String,
    },
}

impl Notice {
    /// Returns the severity of the notice.
    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedEvent { .. } | Self::SourceError { .. } => Severity::Error,
            Self::PieceOutOfRange { .. } | Self::ThreatDetected { .. } => Severity::Warning,
            Self::IgnoredAfterCompletion { .. }
            | Self::ProgressRegressed { .. }
            | Self::RiskReconciled { .. }
            | Self::VerdictDisagreement { .. }
            | Self::RedundantCompletion
            | Self::TotalPiecesMismatch { .. } => Severity::Info,
        }
    }

    /// Returns the snake_case name of the notice kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PieceOutOfRange { .. } => "piece_out_of_range",
            Self::ThreatDetected { .. } => "threat_detected",
            Self::IgnoredAfterCompletion { .. } => "ignored_after_completion",
            Self::ProgressRegressed { .. } => "progress_regressed",
            Self::RiskReconciled { .. } => "risk_reconciled",
            Self::VerdictDisagreement { .. } => "verdict_disagreement",
            Self::RedundantCompletion => "redundant_completion",
            Self::TotalPiecesMismatch { .. } => "total_pieces_mismatch",
            Self::MalformedEvent { .. } => "malformed_event",
            Self::SourceError { .. } => "source_error",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PieceOutOfRange {
                piece_index,
                total_pieces,
            } => write!(
                f,
                "discarded piece {piece_index}: outside 0..{total_pieces}"
            ),
            Self::ThreatDetected {
                piece_index,
                risk_score,
            } => write!(f, "THREAT_DETECT [IDX:{piece_index}] risk {risk_score:.1}%"),
            Self::IgnoredAfterCompletion { event } => {
                write!(f, "ignored {event}: session already complete")
            }
            Self::ProgressRegressed { current, incoming } => write!(
                f,
                "ignored progress regression from {current:.1}% to {incoming:.1}%"
            ),
            Self::RiskReconciled {
                local,
                authoritative,
            } => write!(
                f,
                "max risk reconciled from {local:.1}% to {authoritative:.1}%"
            ),
            Self::VerdictDisagreement { ledger, terminal } => match ledger {
                Some(ledger) => write!(
                    f,
                    "terminal verdict {terminal} differs from piece ledger {ledger}"
                ),
                None => write!(f, "terminal verdict {terminal} with no recorded pieces"),
            },
            Self::RedundantCompletion => f.write_str("ignored redundant completion event"),
            Self::TotalPiecesMismatch { expected, reported } => write!(
                f,
                "start signal reports {reported} pieces, session has {expected}"
            ),
            Self::MalformedEvent { reason } => write!(f, "malformed event discarded: {reason}"),
            Self::SourceError { message } => write!(f, "source error: {message}"),
        }
    }
}
