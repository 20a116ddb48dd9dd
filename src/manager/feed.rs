//! Event feed that routes scan events into the registry and out to sinks.

use crate::core::{ScanEvent, SessionError, SessionId, SessionResult};
use crate::manager::registry::SessionRegistry;
use crate::session::SessionUpdate;
use crate::sink::{ArcSink, PresentationSink};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default capacity of the feed's input channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Body of an envelope.
#[derive(Debug, Clone)]
pub enum FeedPayload {
    /// An already decoded event.
    Event(ScanEvent),
    /// A JSON payload decoded by the session.
    Raw(String),
}

/// One event addressed to a session.
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Target session.
    pub session_id: SessionId,
    /// Event body.
    pub payload: FeedPayload,
}

impl Envelope {
    /// Wraps a decoded event.
    pub fn event(session_id: impl Into<SessionId>, event: impl Into<ScanEvent>) -> Self {
        Self {
            session_id: session_id.into(),
            payload: FeedPayload::Event(event.into()),
        }
    }

    /// Wraps a raw JSON payload.
    pub fn raw(session_id: impl Into<SessionId>, payload: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            payload: FeedPayload::Raw(payload.into()),
        }
    }
}

/// Configuration for the event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Capacity of the input channel created by [`EventFeed::spawn`].
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl FeedConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// Counters reported when the feed stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    /// Envelopes received.
    pub envelopes: u64,
    /// Updates delivered to the sink set.
    pub updates_published: u64,
    /// Envelopes addressed to an unregistered session.
    pub unknown_sessions: u64,
    /// Individual sink deliveries that failed.
    pub sink_failures: u64,
}

/// Consumes envelopes, applies them to the registry and notifies sinks.
///
/// Events of one session are applied in arrival order. Sinks are notified
/// concurrently; a failing sink is logged and counted and does not affect
/// the session or the other sinks.
#[derive(Debug)]
pub struct EventFeed {
    registry: Arc<SessionRegistry>,
    sinks: Vec<ArcSink>,
    config: FeedConfig,
}

impl EventFeed {
    /// Creates a feed over a registry with no sinks.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            sinks: Vec::new(),
            config: FeedConfig::default(),
        }
    }

    /// Adds a sink.
    pub fn add_sink<S: PresentationSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Adds a sink wrapped in an Arc.
    pub fn add_arc_sink(mut self, sink: ArcSink) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: FeedConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the number of sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Starts the feed on the tokio runtime.
    ///
    /// The task stops once every sender is dropped and returns its counters.
    pub fn spawn(self) -> (mpsc::Sender<Envelope>, JoinHandle<FeedStats>) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let handle = tokio::spawn(async move { self.run(rx).await });
        (tx, handle)
    }

    /// Processes envelopes until the channel closes.
    pub async fn run(&self, mut rx: mpsc::Receiver<Envelope>) -> FeedStats {
        let mut stats = FeedStats::default();

        tracing::debug!(sinks = self.sinks.len(), "Event feed started");

        while let Some(envelope) = rx.recv().await {
            stats.envelopes += 1;

            match self.dispatch(&envelope) {
                Ok(update) => {
                    stats.sink_failures += self.publish(&update).await;
                    stats.updates_published += 1;
                }
                Err(SessionError::NotFound { session_id }) => {
                    tracing::warn!(session_id = %session_id, "Dropping event for unknown session");
                    stats.unknown_sessions += 1;
                }
                Err(e) => {
                    tracing::error!(session_id = %envelope.session_id, error = %e, "Failed to apply event");
                }
            }
        }

        tracing::debug!(
            envelopes = stats.envelopes,
            updates_published = stats.updates_published,
            unknown_sessions = stats.unknown_sessions,
            sink_failures = stats.sink_failures,
            "Event feed stopped"
        );

        stats
    }

    /// Applies one envelope to its session.
    pub fn dispatch(&self, envelope: &Envelope) -> SessionResult<SessionUpdate> {
        match &envelope.payload {
            FeedPayload::Event(event) => self.registry.apply(&envelope.session_id, event),
            FeedPayload::Raw(payload) => self.registry.apply_raw(&envelope.session_id, payload),
        }
    }

    /// Delivers an update to every sink and returns the number of failures.
    pub async fn publish(&self, update: &SessionUpdate) -> u64 {
        let deliveries = self.sinks.iter().map(|sink| async move {
            let result = sink.publish(update).await;
            (sink.name().to_string(), result)
        });

        let mut failures = 0;
        for (sink, result) in join_all(deliveries).await {
            if let Err(e) = result {
                tracing::warn!(
                    sink = %sink,
                    session_id = %update.view.session_id,
                    error = %e,
                    "Sink failed, continuing with others"
                );
                failures += 1;
            }
        }
        failures
    }
}
