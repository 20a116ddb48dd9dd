//! Error types for the torrentguard library.
//!
//! Data-quality problems in the event stream are never errors: they are
//! reported as [`Notice`](crate::session::Notice) values next to the
//! updated view. The types here cover operational failures only, such as
//! unknown sessions, invalid configuration, or a sink that cannot accept
//! updates.

use thiserror::Error;

/// The main error type for session and registry operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session is registered under the given ID.
    #[error("session '{session_id}' not found")]
    NotFound {
        /// ID that was looked up.
        session_id: String,
    },

    /// A session with the same ID is already registered.
    #[error("session '{session_id}' already exists")]
    AlreadyExists {
        /// The conflicting ID.
        session_id: String,
    },

    /// The claimed piece count is above the configured bound.
    #[error("total_pieces {total} exceeds the maximum of {max}")]
    TotalPiecesTooLarge {
        /// Claimed piece count.
        total: u64,
        /// Configured maximum.
        max: u64,
    },

    /// An event payload could not be decoded.
    #[error("malformed event: {reason}")]
    MalformedEvent {
        /// Decoder message.
        reason: String,
    },

    /// The event feed is no longer accepting envelopes.
    #[error("event feed is closed")]
    FeedClosed,

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A report could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    /// Creates a `NotFound` error.
    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound {
            session_id: session_id.into(),
        }
    }

    /// Creates an `AlreadyExists` error.
    pub fn already_exists(session_id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            session_id: session_id.into(),
        }
    }

    /// Creates a `MalformedEvent` error.
    pub fn malformed(reason: impl ToString) -> Self {
        Self::MalformedEvent {
            reason: reason.to_string(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the session ID if this error is about a specific session.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::NotFound { session_id } | Self::AlreadyExists { session_id } => {
                Some(session_id)
            }
            _ => None,
        }
    }
}

/// Error type for presentation sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink refused the update.
    #[error("sink '{sink}' rejected update: {reason}")]
    Rejected {
        /// Name of the sink.
        sink: String,
        /// Reason for rejection.
        reason: String,
    },

    /// The sink's consumer side has gone away.
    #[error("sink '{sink}' is closed")]
    Closed {
        /// Name of the sink.
        sink: String,
    },
}

impl SinkError {
    /// Creates a `Rejected` error.
    pub fn rejected(sink: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            sink: sink.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Closed` error.
    pub fn closed(sink: impl Into<String>) -> Self {
        Self::Closed { sink: sink.into() }
    }
}

/// A specialized `Result` type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A specialized `Result` type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;
