//! Sink that writes updates to `tracing`.

use crate::core::error::SinkResult;
use crate::session::{SessionUpdate, Severity};
use crate::sink::traits::PresentationSink;

use async_trait::async_trait;

/// Logs every update and notice as a structured event.
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    /// Creates a sink named `tracing`.
    pub fn new() -> Self {
        Self {
            name: "tracing".to_string(),
        }
    }

    /// Sets the sink name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresentationSink for TracingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, update: &SessionUpdate) -> SinkResult<()> {
        let view = &update.view;

        tracing::debug!(
            sink = %self.name,
            session_id = %view.session_id,
            state = %view.state,
            pieces_seen = view.pieces_seen,
            max_risk = view.max_risk,
            risk_level = view.risk_level.name(),
            progress = view.progress,
            disposition = %view.disposition,
            "Session updated"
        );

        for notice in &update.notices {
            match notice.severity() {
                Severity::Error => tracing::error!(
                    sink = %self.name,
                    session_id = %view.session_id,
                    kind = notice.kind(),
                    "{notice}"
                ),
                Severity::Warning => tracing::warn!(
                    sink = %self.name,
                    session_id = %view.session_id,
                    kind = notice.kind(),
                    "{notice}"
                ),
                Severity::Info => tracing::info!(
                    sink = %self.name,
                    session_id = %view.session_id,
                    kind = notice.kind(),
                    "{notice}"
                ),
            }
        }

        Ok(())
    }
}
