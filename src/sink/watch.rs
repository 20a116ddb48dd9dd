//! Sink that exposes the latest view of one session over a watch channel.

use crate::core::error::{SinkError, SinkResult};
use crate::core::SessionId;
use crate::session::{SessionUpdate, SessionView};
use crate::sink::traits::PresentationSink;

use async_trait::async_trait;
use tokio::sync::watch;

/// Publishes the latest [`SessionView`] of a single session.
///
/// Updates for other sessions are skipped. Late subscribers read the most
/// recent snapshot without replaying the event stream.
#[derive(Debug)]
pub struct WatchSink {
    name: String,
    session_id: SessionId,
    sender: watch::Sender<Option<SessionView>>,
}

impl WatchSink {
    /// Creates a sink for one session and the receiver that observes it.
    pub fn for_session(session_id: SessionId) -> (Self, watch::Receiver<Option<SessionView>>) {
        let (sender, receiver) = watch::channel(None);
        let sink = Self {
            name: format!("watch:{session_id}"),
            session_id,
            sender,
        };
        (sink, receiver)
    }

    /// Returns the watched session.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Creates another receiver for the same session.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionView>> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl PresentationSink for WatchSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, update: &SessionUpdate) -> SinkResult<()> {
        if update.view.session_id != self.session_id {
            return Ok(());
        }

        self.sender
            .send(Some(update.view.clone()))
            .map_err(|_| SinkError::closed(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PieceEvent, Verdict};
    use crate::session::{EngineConfig, ScanSession};

    fn session(id: &str) -> ScanSession {
        ScanSession::new(SessionId::new(id), 10, 10, &EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_watch_sink_publishes_latest_view() {
        let (sink, mut rx) = WatchSink::for_session(SessionId::new("w"));
        let mut s = session("w");

        sink.publish(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 10.0)))
            .await
            .unwrap();
        sink.publish(&s.on_piece_result(&PieceEvent::new(1, Verdict::Suspicious, 60.0)))
            .await
            .unwrap();

        assert!(rx.has_changed().unwrap());
        let view = rx.borrow_and_update().clone().unwrap();
        assert_eq!(view.pieces_seen, 2);
        assert_eq!(view.max_risk, 60.0);

        let late = sink.subscribe();
        assert_eq!(late.borrow().as_ref().map(|v| v.pieces_seen), Some(2));
    }

    #[tokio::test]
    async fn test_watch_sink_skips_other_sessions() {
        let (sink, rx) = WatchSink::for_session(SessionId::new("mine"));
        let mut other = session("other");

        sink.publish(&other.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)))
            .await
            .unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_watch_sink_closed() {
        let (sink, rx) = WatchSink::for_session(SessionId::new("w"));
        drop(rx);
        let mut s = session("w");

        let result = sink
            .publish(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)))
            .await;
        assert!(matches!(result, Err(SinkError::Closed { .. })));
    }
}
