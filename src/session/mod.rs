//! Per-session aggregation.
//!
//! A [`ScanSession`] folds the piece verdicts and the terminal event of one
//! upload/download-and-scan lifecycle into a running maximum risk, a piece
//! ledger, a bounded [`SlotGrid`](crate::slots::SlotGrid) and a final
//! [`Disposition`](crate::policy::Disposition). Each operation returns a
//! [`SessionUpdate`] that presentation sinks consume.

mod config;
mod notice;
mod report;
mod scan_session;
mod view;

pub use config::{EngineConfig, DEFAULT_LOG_CAPACITY, DEFAULT_MAX_TOTAL_PIECES};
pub use notice::{Notice, Severity};
pub use report::{SessionMetadata, SessionReport, VerdictCounts};
pub use scan_session::{CompletionSummary, PieceResult, ScanSession};
pub use view::{SessionUpdate, SessionView};
