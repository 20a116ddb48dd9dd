//! Session management.
//!
//! The [`SessionRegistry`] owns independent sessions keyed by ID. With the
//! `tokio-runtime` feature, an [`EventFeed`] task routes incoming events
//! into the registry and publishes every resulting update to the
//! configured sinks.

#[cfg(feature = "tokio-runtime")]
mod feed;
mod registry;

#[cfg(feature = "tokio-runtime")]
pub use feed::{Envelope, EventFeed, FeedConfig, FeedPayload, FeedStats, DEFAULT_CHANNEL_CAPACITY};
pub use registry::{SessionHandle, SessionRegistry};
