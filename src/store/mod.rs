// Result store: the append-only detection history plus user settings.
//
// The store owns an in-memory copy of the history and writes the full
// sequence through the injected StorageBackend after every change. There is
// no incremental diff: one JSON array under one key, last write wins.

pub mod backend;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{DetectionResult, Feedback, Settings};
use backend::StorageBackend;

pub const HISTORY_KEY: &str = "cyberShieldHistory";
pub const SETTINGS_KEY: &str = "cyberShieldSettings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend error: {0:#}")]
    Storage(anyhow::Error),

    #[error("malformed data under key '{key}': {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize data for key '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Storage(err)
    }
}

pub struct ResultStore {
    backend: Arc<dyn StorageBackend>,
    history: Vec<DetectionResult>,
    /// Oldest entries are evicted once the history grows past this.
    max_history: Option<usize>,
}

impl ResultStore {
    /// Wrap a backend without touching it. The in-memory history starts empty;
    /// most callers want [`ResultStore::open`] instead.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            history: Vec::new(),
            max_history: None,
        }
    }

    /// Initialize persisted state if needed and load the history.
    ///
    /// A malformed persisted history is logged and replaced by an empty one;
    /// backend failures are returned to the caller.
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        max_history: Option<usize>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(backend);
        store.max_history = max_history;
        store.initialize()?;

        let mut history = match store.load() {
            Ok(history) => history,
            Err(e @ StoreError::Malformed { .. }) => {
                warn!(error = %e, "Stored history is unreadable, starting from an empty history");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if enforce_cap(&mut history, max_history) > 0 {
            store.persist_history(&history)?;
        }
        store.history = history;

        info!(results = store.history.len(), "Result store opened");
        Ok(store)
    }

    /// Write an empty history and default settings where none exist yet.
    ///
    /// This is idempotent: existing state is left untouched.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if self.backend.get(HISTORY_KEY)?.is_none() {
            self.backend.set(HISTORY_KEY, "[]")?;
            debug!("Initialized empty history");
        }
        if self.backend.get(SETTINGS_KEY)?.is_none() {
            self.write_settings(&Settings::default())?;
            debug!("Initialized default settings");
        }
        Ok(())
    }

    /// Append a result and persist the whole history.
    ///
    /// Ids are not checked for uniqueness. The in-memory history only changes
    /// once the write succeeded.
    pub fn append(&mut self, result: DetectionResult) -> Result<(), StoreError> {
        debug!(id = %result.id, is_toxic = result.is_toxic, "Appending result");
        let mut next = self.history.clone();
        next.push(result);
        enforce_cap(&mut next, self.max_history);

        self.persist_history(&next)?;
        self.history = next;
        Ok(())
    }

    /// Read the persisted history. Never-initialized storage yields an empty list.
    pub fn load(&self) -> Result<Vec<DetectionResult>, StoreError> {
        match self.backend.get(HISTORY_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                key: HISTORY_KEY,
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// The in-memory history, oldest first.
    pub fn history(&self) -> &[DetectionResult] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_history(&self) -> Option<usize> {
        self.max_history
    }

    /// Wipe history and settings, then reinitialize defaults. Irreversible.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.backend.remove(HISTORY_KEY)?;
        self.backend.remove(SETTINGS_KEY)?;
        self.history.clear();
        self.initialize()?;
        info!("Result store cleared");
        Ok(())
    }

    /// Current settings. Missing or unreadable settings fall back to defaults.
    pub fn settings(&self) -> Result<Settings, StoreError> {
        let Some(json) = self.backend.get(SETTINGS_KEY)? else {
            return Ok(Settings::default());
        };
        match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(error = %e, "Stored settings are unreadable, using defaults");
                Ok(Settings::default())
            }
        }
    }

    pub fn update_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.write_settings(settings)?;
        info!(
            sensitivity = settings.sensitivity.as_str(),
            enable_feedback = settings.enable_feedback,
            auto_save = settings.auto_save,
            "Settings updated"
        );
        Ok(())
    }

    /// Attach reviewer feedback to a stored result and persist it.
    ///
    /// Returns `false` without writing anything when the id is unknown or
    /// feedback is disabled in settings.
    pub fn record_feedback(&mut self, id: &str, feedback: Feedback) -> Result<bool, StoreError> {
        if !self.settings()?.enable_feedback {
            info!(id, "Feedback is disabled, ignoring");
            return Ok(false);
        }

        let Some(index) = self.history.iter().position(|r| r.id == id) else {
            debug!(id, "Feedback for unknown result, ignoring");
            return Ok(false);
        };
        let mut next = self.history.clone();
        next[index].feedback = Some(feedback);

        self.persist_history(&next)?;
        self.history = next;
        info!(id, feedback = feedback.as_str(), "Feedback recorded");
        Ok(true)
    }

    fn persist_history(&self, history: &[DetectionResult]) -> Result<(), StoreError> {
        let json = serde_json::to_string(history).map_err(|source| StoreError::Serialize {
            key: HISTORY_KEY,
            source,
        })?;
        self.backend.set(HISTORY_KEY, &json)?;
        Ok(())
    }

    fn write_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let json = serde_json::to_string(settings).map_err(|source| StoreError::Serialize {
            key: SETTINGS_KEY,
            source,
        })?;
        self.backend.set(SETTINGS_KEY, &json)?;
        Ok(())
    }
}

/// Drop the oldest entries beyond `cap`. Returns how many were evicted.
fn enforce_cap(history: &mut Vec<DetectionResult>, cap: Option<usize>) -> usize {
    let Some(cap) = cap else {
        return 0;
    };
    let excess = history.len().saturating_sub(cap);
    if excess > 0 {
        history.drain(..excess);
        debug!(evicted = excess, cap, "Evicted oldest results");
    }
    excess
}
