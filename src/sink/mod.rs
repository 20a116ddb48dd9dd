//! Presentation sinks.
//!
//! Sinks consume [`SessionUpdate`](crate::session::SessionUpdate)s and turn
//! them into something an operator sees: log lines, a bounded dashboard
//! feed, or a watch channel holding the latest view.

mod session_log;
mod tracing_sink;
mod traits;
#[cfg(feature = "tokio-runtime")]
mod watch;

pub use session_log::{LogEntry, SessionLog};
pub use tracing_sink::TracingSink;
pub use traits::{ArcSink, PresentationSink};
#[cfg(feature = "tokio-runtime")]
pub use watch::WatchSink;
