//! Registry of independent scan sessions.

use crate::audit;
use crate::core::{ScanEvent, SessionError, SessionId, SessionResult};
use crate::session::{EngineConfig, ScanSession, SessionReport, SessionUpdate, SessionView};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Handle to one registered session.
pub type SessionHandle = Arc<Mutex<ScanSession>>;

/// Owns the sessions of one engine.
///
/// Each session sits behind its own lock, so events for different sessions
/// never contend on shared state beyond the map lookup.
#[derive(Debug)]
pub struct SessionRegistry {
    config: EngineConfig,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    created: AtomicU64,
    discarded: AtomicU64,
}

impl SessionRegistry {
    /// Creates a registry after validating the configuration.
    pub fn new(config: EngineConfig) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            created: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        })
    }

    /// Creates a registry with the default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
            sessions: RwLock::new(HashMap::new()),
            created: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Registers a new session and returns its initial view.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyExists`] if the ID is taken, or
    /// [`SessionError::TotalPiecesTooLarge`] if `total_pieces` exceeds
    /// the configured bound.
    pub fn create(
        &self,
        session_id: impl Into<SessionId>,
        total_pieces: u64,
        requested_pieces: u64,
    ) -> SessionResult<SessionView> {
        let session_id = session_id.into();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if sessions.contains_key(&session_id) {
            return Err(SessionError::already_exists(session_id.as_str()));
        }

        let session = ScanSession::new(
            session_id.clone(),
            total_pieces,
            requested_pieces,
            &self.config,
        )?;
        let view = session.current_view();
        sessions.insert(session_id, Arc::new(Mutex::new(session)));
        self.created.fetch_add(1, Ordering::Relaxed);

        Ok(view)
    }

    /// Applies a decoded event to a session.
    pub fn apply(
        &self,
        session_id: &SessionId,
        event: &ScanEvent,
    ) -> SessionResult<SessionUpdate> {
        self.with_session(session_id, |session| session.apply(event))
    }

    /// Decodes and applies a JSON event to a session.
    ///
    /// A payload that does not decode is reported in the update's notices,
    /// not as an error.
    pub fn apply_raw(
        &self,
        session_id: &SessionId,
        payload: &str,
    ) -> SessionResult<SessionUpdate> {
        self.with_session(session_id, |session| session.apply_raw(payload))
    }

    /// Returns the current view of a session.
    pub fn view(&self, session_id: &SessionId) -> SessionResult<SessionView> {
        self.with_session(session_id, |session| session.current_view())
    }

    /// Builds a report for a session.
    pub fn report(&self, session_id: &SessionId) -> SessionResult<SessionReport> {
        let report = self.with_session(session_id, |session| SessionReport::from_session(session))?;
        audit::emit_report_generated(&report);
        Ok(report)
    }

    /// Removes a session and drops its state.
    pub fn discard(&self, session_id: &SessionId) -> SessionResult<()> {
        let handle = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(session_id)
            .ok_or_else(|| SessionError::not_found(session_id.as_str()))?;

        let completed = handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .state()
            .is_complete();
        self.discarded.fetch_add(1, Ordering::Relaxed);
        audit::emit_session_discarded(session_id, completed);

        Ok(())
    }

    /// Returns a handle to a session.
    pub fn get(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(session_id)
            .cloned()
    }

    /// Returns `true` if the session is registered.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(session_id)
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the registered session IDs, sorted.
    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Returns the number of sessions created so far.
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Returns the number of sessions discarded so far.
    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn with_session<T>(
        &self,
        session_id: &SessionId,
        f: impl FnOnce(&mut ScanSession) -> T,
    ) -> SessionResult<T> {
        let handle = self
            .get(session_id)
            .ok_or_else(|| SessionError::not_found(session_id.as_str()))?;
        let mut session = handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(f(&mut session))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
