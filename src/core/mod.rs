//! Core types for the torrentguard library.
//!
//! This module provides the building blocks used throughout the library:
//!
//! - [`types`] - Verdicts, slot and session states, session IDs
//! - [`event`] - Scan source events and their wire decoding
//! - [`error`] - Structured error types
//! - [`hasher`] - BLAKE3-based artifact hashing

pub mod error;
pub mod event;
pub mod hasher;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{SessionError, SessionResult, SinkError, SinkResult};
pub use event::{
    CompletionEvent, ErrorEvent, PieceEvent, ProgressEvent, QuarantineInfo, ScanEvent, StartEvent,
};
pub use hasher::{ArtifactDigest, ArtifactHasher};
pub use types::{clamp_percent, SessionId, SessionState, SlotState, Verdict};
