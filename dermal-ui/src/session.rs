//! Per-session key/value storage
//!
//! Stages of the flow hand data to each other through three keys:
//! the quiz answers, the image data URL, and the finished report. Values
//! are stored as JSON text (the image as its raw data URL).

use dermal_common::{DermalReport, QuizAnswers};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

pub const QUIZ_KEY: &str = "dermal_quiz";
pub const IMAGE_KEY: &str = "dermal_image";
pub const REPORT_KEY: &str = "dermal_report";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.clear();
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Store persisted as one JSON object, rewritten on every change
///
/// Lets separate invocations of the binary share a session.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            debug!("Session file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy, persist it, then commit it in memory
    ///
    /// A failed write leaves the in-memory values untouched.
    fn update<F>(&self, change: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        let mut next = values.clone();
        change(&mut next);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Write a sibling file, then rename over the original
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|values| {
            values.remove(key);
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.update(BTreeMap::clear)
    }
}

// ============================================================================
// Typed access
// ============================================================================

/// Typed view over a `SessionStore`
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn save_quiz(&self, quiz: &QuizAnswers) -> Result<(), SessionError> {
        self.store.set(QUIZ_KEY, &serde_json::to_string(quiz)?)
    }

    /// Stored quiz answers; missing or unreadable answers yield an empty quiz
    pub fn quiz(&self) -> QuizAnswers {
        match self.store.get(QUIZ_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => QuizAnswers::from_value(&value),
                Err(e) => {
                    warn!("Stored quiz unreadable, using empty answers: {}", e);
                    QuizAnswers::default()
                }
            },
            Ok(None) => QuizAnswers::default(),
            Err(e) => {
                warn!("Session read failed: {}", e);
                QuizAnswers::default()
            }
        }
    }

    pub fn save_image(&self, data_url: &str) -> Result<(), SessionError> {
        self.store.set(IMAGE_KEY, data_url)
    }

    pub fn image(&self) -> Option<String> {
        match self.store.get(IMAGE_KEY) {
            Ok(image) => image.filter(|image| !image.is_empty()),
            Err(e) => {
                warn!("Session read failed: {}", e);
                None
            }
        }
    }

    pub fn save_report(&self, report: &DermalReport) -> Result<(), SessionError> {
        self.store.set(REPORT_KEY, &serde_json::to_string(report)?)
    }

    /// Stored report, if present and schema-valid
    pub fn report(&self) -> Option<DermalReport> {
        let raw = match self.store.get(REPORT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Session read failed: {}", e);
                return None;
            }
        };
        match DermalReport::from_json_str(&raw) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Stored report invalid: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.clear()
    }
}
