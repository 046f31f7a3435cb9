// Analysis session: the caller side of a single analyze interaction.
//
// A session owns the classifier and the result store. Each submit trims the
// text, holds the busy flag while the simulated network latency and the
// classifier run, then appends the result to the store unless autosave is
// off. Only one analysis may be in flight at a time; a second submit during
// that window is rejected rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::classifier::traits::TextClassifier;
use crate::models::{DetectionResult, LanguageHint};
use crate::store::{ResultStore, StoreError};

/// Default caller-side character limit.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 1000;

/// Simulated network latency range, lower bound inclusive.
pub const DEFAULT_NETWORK_LATENCY: (Duration, Duration) =
    (Duration::from_millis(1000), Duration::from_millis(2000));

/// Sample inputs covering each supported language.
pub const EXAMPLE_TEXTS: &[&str] = &[
    "You are so stupid and worthless",
    "आप बहुत अच्छे व्यक्ति हैं",
    "நீங்கள் மிகவும் நல்லவர்",
    "I hate you so much, go kill yourself",
    "Great job on your presentation!",
];

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("an analysis is already in progress")]
    Busy,

    #[error("nothing to analyze: text is empty")]
    EmptyText,

    #[error("text is {length} characters long; the limit is {limit}")]
    TooLong { length: usize, limit: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Clears the busy flag when dropped, including on early return.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session {
    classifier: Box<dyn TextClassifier>,
    store: Mutex<ResultStore>,
    busy: AtomicBool,
    network_latency: (Duration, Duration),
    max_text_chars: usize,
}

impl Session {
    pub fn new(classifier: Box<dyn TextClassifier>, store: ResultStore) -> Self {
        Self {
            classifier,
            store: Mutex::new(store),
            busy: AtomicBool::new(false),
            network_latency: DEFAULT_NETWORK_LATENCY,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
        }
    }

    /// Override the simulated latency range (`(ZERO, ZERO)` disables it).
    pub fn with_network_latency(mut self, min: Duration, max: Duration) -> Self {
        self.network_latency = (min, max.max(min));
        self
    }

    pub fn with_max_text_chars(mut self, limit: usize) -> Self {
        self.max_text_chars = limit;
        self
    }

    /// Whether an analysis is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Analyze `text` and record the result.
    ///
    /// The text is trimmed first; the stored result carries the trimmed text.
    pub async fn submit(
        &self,
        text: &str,
        hint: LanguageHint,
    ) -> Result<DetectionResult, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyText);
        }
        let length = text.chars().count();
        if length > self.max_text_chars {
            return Err(SessionError::TooLong {
                length,
                limit: self.max_text_chars,
            });
        }

        let _busy = BusyGuard::acquire(&self.busy).ok_or(SessionError::Busy)?;

        self.simulate_latency().await;
        let result = self.classifier.analyze(text, hint).await;

        let mut store = self.store.lock().await;
        if store.settings()?.auto_save {
            store.append(result.clone())?;
        } else {
            debug!(id = %result.id, "Autosave disabled, result not stored");
        }

        info!(
            id = %result.id,
            language = %result.language,
            is_toxic = result.is_toxic,
            confidence = result.confidence,
            "Analysis complete"
        );
        Ok(result)
    }

    /// Lock the store for reads or admin operations.
    pub async fn store(&self) -> MutexGuard<'_, ResultStore> {
        self.store.lock().await
    }

    pub fn into_store(self) -> ResultStore {
        self.store.into_inner()
    }

    async fn simulate_latency(&self) {
        let (min, max) = self.network_latency;
        let delay = if max > min {
            rand::rng().random_range(min..max)
        } else {
            min
        };
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Simulating network latency");
            tokio::time::sleep(delay).await;
        }
    }
}
