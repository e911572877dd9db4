//! Key-value persistence for the resume snapshot and the session history log.
//!
//! Both slots are whole-value, last-write-wins JSON documents under fixed keys.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, StorageError};
use crate::model::{Answer, Format, PooledQuestion, Region, Scope, System};
use crate::session::{QuizSession, SessionParts, SessionSummary};

/// Key of the resume snapshot slot.
pub const PROGRESS_KEY: &str = "ivri-quiz-progress";
/// Key of the session history slot.
pub const HISTORY_KEY: &str = "ivri-quiz-history";

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Saved state of an in-progress quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub mode: Format,
    pub selected_region: Scope<Region>,
    pub selected_system: Scope<System>,
    pub questions: Vec<PooledQuestion>,
    pub current_index: usize,
    pub score: u32,
    pub wrong: u32,
    pub user_answers: Vec<Option<Answer>>,
    #[serde(default)]
    pub bookmarks: Vec<usize>,
    #[serde(default)]
    pub flagged: Vec<usize>,
    pub start_time: i64,
    /// Whole seconds.
    pub elapsed_time: u64,
}

impl Snapshot {
    pub fn capture(session: &QuizSession, now_ms: i64) -> Self {
        Self {
            mode: session.format(),
            selected_region: session.region(),
            selected_system: session.system(),
            questions: session.questions().to_vec(),
            current_index: session.current_index(),
            score: session.score(),
            wrong: session.wrong(),
            user_answers: session.answers().to_vec(),
            bookmarks: session.bookmarks().iter().copied().collect(),
            flagged: session.flags().iter().copied().collect(),
            start_time: session.start_time_ms(),
            elapsed_time: session.elapsed_secs(now_ms),
        }
    }

    /// Rebuild a live session whose clock reads `elapsed_time` at `now_ms`.
    pub fn restore(self, now_ms: i64) -> Result<QuizSession, QuizError> {
        let len = self.questions.len();
        let mut answers = self.user_answers;
        // Trailing unanswered slots may be missing from older saves.
        if answers.len() < len {
            answers.resize(len, None);
        }
        let elapsed_ms = i64::try_from(self.elapsed_time)
            .ok()
            .and_then(|s| s.checked_mul(1000))
            .ok_or_else(|| QuizError::CorruptProgress("elapsed time out of range".into()))?;

        QuizSession::from_parts(SessionParts {
            format: self.mode,
            region: self.selected_region,
            system: self.selected_system,
            questions: self.questions,
            current_index: self.current_index,
            answers,
            score: self.score,
            wrong: self.wrong,
            bookmarks: self.bookmarks,
            flags: self.flagged,
            start_time_ms: now_ms - elapsed_ms,
        })
        .map_err(QuizError::CorruptProgress)
    }
}

/// The single resume slot.
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore").field("key", &PROGRESS_KEY).finish()
    }
}

impl ProgressStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot).map_err(|source| StorageError::Encode {
            key: PROGRESS_KEY.to_string(),
            source,
        })?;
        self.store.set(PROGRESS_KEY, &json)
    }

    /// Read the snapshot. A missing or unreadable slot is `CorruptProgress`.
    pub fn load(&self) -> Result<Snapshot, QuizError> {
        let raw = self
            .store
            .get(PROGRESS_KEY)?
            .ok_or_else(|| QuizError::CorruptProgress("no saved progress".into()))?;
        serde_json::from_str(&raw).map_err(|e| QuizError::CorruptProgress(e.to_string()))
    }

    /// Whether anything is stored in the slot. Read failures count as absent.
    pub fn exists(&self) -> bool {
        matches!(self.store.get(PROGRESS_KEY), Ok(Some(_)))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(PROGRESS_KEY)
    }
}

/// One completed quiz in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub region: Scope<Region>,
    pub system: Scope<System>,
    #[serde(rename = "mode")]
    pub format: Format,
    pub score: u32,
    /// Questions attempted, not pool size.
    #[serde(rename = "total")]
    pub attempted: u32,
    #[serde(rename = "accuracy")]
    pub accuracy_percent: u32,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    #[serde(rename = "date")]
    pub display_date: String,
}

impl HistoryEntry {
    pub fn from_summary<Tz: TimeZone>(summary: &SessionSummary, at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            region: summary.region,
            system: summary.system,
            format: summary.format,
            score: summary.score,
            attempted: summary.attempted,
            accuracy_percent: summary.accuracy,
            timestamp_ms: at.timestamp_millis(),
            display_date: at.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Append-only log of completed quizzes.
#[derive(Clone)]
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for HistoryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLog").field("key", &HISTORY_KEY).finish()
    }
}

impl HistoryLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All entries, oldest first. Unreadable logs read as empty.
    pub fn read(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "history unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "history corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn append(&self, entry: HistoryEntry) -> Result<(), StorageError> {
        let mut entries = self.read();
        entries.push(entry);
        let json = serde_json::to_string(&entries).map_err(|source| StorageError::Encode {
            key: HISTORY_KEY.to_string(),
            source,
        })?;
        self.store.set(HISTORY_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(HISTORY_KEY)
    }
}
