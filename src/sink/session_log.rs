//! Bounded operator log fed by session updates.

use crate::core::error::SinkResult;
use crate::core::{SessionId, SessionState};
use crate::policy::Disposition;
use crate::session::{EngineConfig, SessionUpdate, Severity, DEFAULT_LOG_CAPACITY};
use crate::sink::traits::PresentationSink;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

#[cfg(feature = "tokio-runtime")]
use crate::core::SessionError;
#[cfg(feature = "tokio-runtime")]
use std::path::{Path, PathBuf};

/// One line of the operator log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,

    /// How the entry should be highlighted.
    pub severity: Severity,

    /// Session the entry belongs to.
    pub session_id: SessionId,

    /// Message text.
    pub message: String,
}

impl LogEntry {
    /// Formats the entry as `[HH:MM:SS] message`.
    pub fn to_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Keeps the most recent log entries, newest first.
///
/// Lifecycle transitions and every notice become entries; once the log is
/// full the oldest entry is dropped. No per-session state is kept.
#[derive(Debug)]
pub struct SessionLog {
    capacity: usize,
    entries: RwLock<VecDeque<LogEntry>>,
}

impl SessionLog {
    /// Creates a log holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Creates a log sized by the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.log_capacity)
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Folds an update into the log.
    pub fn record(&self, update: &SessionUpdate) {
        let view = &update.view;
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(next) = update.transition() {
            let transition = match next {
                SessionState::Scanning => Some((Severity::Info, "DOWNLOAD_STARTED".to_string())),
                SessionState::Complete => Some((
                    completion_severity(view.disposition),
                    format!(
                        "SCAN_COMPLETE: {} (risk {:.1}%)",
                        view.disposition.headline(),
                        view.max_risk
                    ),
                )),
                SessionState::Idle => None,
            };
            if let Some((severity, message)) = transition {
                self.push(&mut entries, &view.session_id, severity, message);
            }
        }

        for notice in &update.notices {
            self.push(&mut entries, &view.session_id, notice.severity(), notice.to_string());
        }
    }

    /// Returns the entries, newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Renders the log as text, one `[HH:MM:SS] message` line per entry.
    pub fn export_text(&self) -> String {
        self.entries()
            .iter()
            .map(LogEntry::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the export file name for the given time.
    ///
    /// `torrentguard_log_<ISO-8601 time with ':' and '.' replaced by '-'>.txt`
    pub fn export_file_name(at: DateTime<Utc>) -> String {
        let stamp = at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        format!("torrentguard_log_{stamp}.txt")
    }

    /// Writes the exported text into `dir` and returns the file path.
    #[cfg(feature = "tokio-runtime")]
    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, SessionError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(Self::export_file_name(Utc::now()));
        tokio::fs::write(&path, self.export_text()).await?;

        tracing::info!(path = %path.display(), entries = self.len(), "Exported session log");
        Ok(path)
    }

    fn push(
        &self,
        entries: &mut VecDeque<LogEntry>,
        session_id: &SessionId,
        severity: Severity,
        message: String,
    ) {
        entries.push_front(LogEntry {
            timestamp: Utc::now(),
            severity,
            session_id: session_id.clone(),
            message,
        });
        entries.truncate(self.capacity);
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

fn completion_severity(disposition: Disposition) -> Severity {
    match disposition {
        Disposition::Contained | Disposition::ThreatIdentified => Severity::Error,
        Disposition::Suspicious => Severity::Warning,
        Disposition::Clean | Disposition::Pending => Severity::Info,
    }
}

#[async_trait]
impl PresentationSink for SessionLog {
    fn name(&self) -> &str {
        "session_log"
    }

    async fn publish(&self, update: &SessionUpdate) -> SinkResult<()> {
        self.record(update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompletionEvent, PieceEvent, Verdict};
    use crate::session::ScanSession;
    use chrono::TimeZone;

    fn session(total: u64) -> ScanSession {
        ScanSession::new(SessionId::new("log"), total, total, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_transitions_and_notices_are_logged() {
        let log = SessionLog::default();
        let mut s = session(10);

        log.record(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 3.0)));
        log.record(&s.on_piece_result(&PieceEvent::new(1, Verdict::Clean, 3.0)));
        log.record(&s.on_piece_result(&PieceEvent::new(7, Verdict::Malicious, 91.3)));
        log.record(&s.on_complete(&CompletionEvent::new(Verdict::Malicious, 91.3).with_quarantined(true)));

        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec![
                "SCAN_COMPLETE: CONTAINMENT_ACTIVE (risk 91.3%)".to_string(),
                "THREAT_DETECT [IDX:7] risk 91.3%".to_string(),
                "DOWNLOAD_STARTED".to_string(),
            ]
        );
        assert_eq!(log.entries()[0].severity, Severity::Error);
    }

    #[test]
    fn test_capacity_keeps_newest() {
        let log = SessionLog::new(3);
        let mut s = session(100);

        for i in 0..10 {
            log.record(&s.on_piece_result(&PieceEvent::new(100 + i, Verdict::Clean, 0.0)));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].message.contains("discarded piece 109"));
        assert!(entries[2].message.contains("discarded piece 107"));
    }

    #[test]
    fn test_export_text_format() {
        let log = SessionLog::default();
        let mut s = session(10);
        log.record(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)));

        let text = log.export_text();
        let line = text.lines().next().unwrap();
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] DOWNLOAD_STARTED");
    }

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            SessionLog::export_file_name(at),
            "torrentguard_log_2024-03-09T14-05-07-000Z.txt"
        );
    }

    #[test]
    fn test_clear() {
        let log = SessionLog::default();
        let mut s = session(10);
        log.record(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)));
        log.record(&s.on_piece_result(&PieceEvent::new(1, Verdict::Clean, 1.0)));
        assert_eq!(log.len(), 1);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_redundant_completion_logged_once() {
        let log = SessionLog::default();
        let mut s = session(10);
        log.record(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)));
        log.record(&s.on_complete(&CompletionEvent::new(Verdict::Clean, 1.0)));
        log.record(&s.on_complete(&CompletionEvent::new(Verdict::Clean, 1.0)));
        log.record(&s.apply_raw("not json"));

        let completions = log
            .entries()
            .iter()
            .filter(|e| e.message.starts_with("SCAN_COMPLETE"))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_many_sessions_stay_bounded() {
        let log = SessionLog::new(5);
        let config = EngineConfig::default();

        for i in 0..1000 {
            let mut s = ScanSession::new(SessionId::new(format!("s{i}")), 4, 4, &config).unwrap();
            log.record(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)));
            log.record(&s.on_complete(&CompletionEvent::new(Verdict::Clean, 1.0)));
        }
        assert_eq!(log.len(), 5);

        let entries = log.entries();
        assert_eq!(entries[0].session_id, SessionId::new("s999"));
        assert!(entries[0].message.starts_with("SCAN_COMPLETE: SPECIMEN_CLEAN"));
    }

    #[cfg(feature = "tokio-runtime")]
    #[tokio::test]
    async fn test_export_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::default();
        let mut s = session(10);
        log.record(&s.on_piece_result(&PieceEvent::new(0, Verdict::Clean, 1.0)));

        let path = log.export_to_dir(dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("torrentguard_log_"));
        assert!(name.ends_with(".txt"));

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.ends_with("] DOWNLOAD_STARTED"));
    }
}
