//! Presentation sink trait definition.

use crate::core::error::SinkResult;
use crate::session::SessionUpdate;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Consumer of session updates.
///
/// Sinks render or forward what the engine produced. They receive a shared
/// reference and never write back into the session.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; the feed notifies all sinks
///   concurrently.
/// - A failing sink is logged and counted by the feed; it never affects
///   session state or other sinks.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use torrentguard::sink::PresentationSink;
/// use torrentguard::session::SessionUpdate;
/// use torrentguard::core::SinkResult;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct GaugeSink;
///
/// #[async_trait]
/// impl PresentationSink for GaugeSink {
///     fn name(&self) -> &str {
///         "gauge"
///     }
///
///     async fn publish(&self, update: &SessionUpdate) -> SinkResult<()> {
///         println!("{:.1}%", update.view.max_risk);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PresentationSink: Send + Sync + Debug {
    /// Returns a stable name for logs.
    fn name(&self) -> &str;

    /// Consumes one update.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`](crate::core::SinkError) if the update could not be delivered.
    async fn publish(&self, update: &SessionUpdate) -> SinkResult<()>;
}

/// A sink wrapped in an Arc for sharing between the feed and its owner.
pub type ArcSink = Arc<dyn PresentationSink>;
