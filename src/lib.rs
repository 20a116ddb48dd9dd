//! # Torrentguard
//!
//! Aggregation and disposition engine for piece-level torrent malware
//! scanning.
//!
//! ## Overview
//!
//! A torrent is downloaded piece by piece and every piece is scanned as it
//! arrives. Torrentguard consumes that stream of per-piece verdicts and the
//! final scan result, and maintains for each session:
//!
//! - A running maximum risk score and completion percentage
//! - A ledger of per-piece verdicts, idempotent under replays
//! - A fixed-size slot grid summarizing pieces for dashboards
//! - A final disposition once the stream ends (clean, suspicious, threat
//!   identified, or contained by quarantine)
//!
//! Data-quality problems in the stream (out-of-range pieces, malformed
//! payloads, late or duplicate terminal events) never fail an operation;
//! they come back as notices next to the updated view.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use torrentguard::manager::{EventFeed, SessionRegistry};
//! use torrentguard::sink::{SessionLog, TracingSink};
//! use torrentguard::source::MockSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(SessionRegistry::with_defaults());
//!     registry.create("demo", 1000, 25)?;
//!
//!     let (feed, stopped) = EventFeed::new(Arc::clone(&registry))
//!         .add_sink(TracingSink::new())
//!         .add_sink(SessionLog::default())
//!         .spawn();
//!
//!     MockSource::new(1000, 25)
//!         .stream_into(&"demo".into(), &feed, None)
//!         .await?;
//!     drop(feed);
//!     stopped.await?;
//!
//!     println!("{}", registry.report(&"demo".into())?.to_json_pretty()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes tokio runtime support
//! - `tokio-runtime` - Event feed, watch sink and async exports via tokio
//!
//! ## Architecture
//!
//! - **Core**: Verdicts, events, IDs and error handling
//! - **Slots**: Projection of piece indices onto a bounded grid
//! - **Policy**: Risk tiers and final dispositions
//! - **Session**: The per-session aggregation state machine
//! - **Manager**: Session registry and the async event feed
//! - **Sink**: Presentation sinks (tracing, operator log, watch channel)
//! - **Source**: Scripted event source for tests and demos
//! - **Audit**: Structured audit events

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod core;
pub mod manager;
pub mod policy;
pub mod session;
pub mod sink;
pub mod slots;
pub mod source;

// Re-export commonly used types at the crate root
pub use crate::core::{
    CompletionEvent, PieceEvent, ScanEvent, SessionError, SessionId, SessionState, SlotState,
    Verdict,
};

pub use crate::manager::SessionRegistry;
pub use crate::policy::{Disposition, RiskLevel};
pub use crate::session::{EngineConfig, Notice, ScanSession, SessionUpdate, SessionView};
pub use crate::sink::PresentationSink;

/// Prelude module for convenient imports.
///
/// ```rust
/// use torrentguard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        CompletionEvent, PieceEvent, ScanEvent, SessionError, SessionId, SessionState, SlotState,
        Verdict,
    };
    #[cfg(feature = "tokio-runtime")]
    pub use crate::manager::{Envelope, EventFeed};
    pub use crate::manager::SessionRegistry;
    pub use crate::policy::{Disposition, RiskLevel};
    pub use crate::session::{
        EngineConfig, Notice, ScanSession, SessionReport, SessionUpdate, SessionView, Severity,
    };
    pub use crate::sink::{PresentationSink, SessionLog, TracingSink};
}
