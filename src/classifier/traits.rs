// Classifier traits: the swap-ready abstractions.
//
// TextClassifier is what callers hold. JitterSource isolates the randomness
// in confidence scoring so tests can script it and assert exact values.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rand::Rng;

use crate::models::{DetectionResult, LanguageHint};

/// Trait for classifying a piece of text. Analysis always produces a result:
/// empty or very long input is not an error.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Analyze a single text.
    async fn analyze(&self, text: &str, hint: LanguageHint) -> DetectionResult;

    /// Analyze multiple texts, returning results in the same order.
    /// Default implementation calls analyze sequentially.
    async fn analyze_batch(&self, texts: &[String], hint: LanguageHint) -> Vec<DetectionResult> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.analyze(text, hint).await);
        }
        results
    }
}

/// Source of uniform random values in [0, 1).
pub trait JitterSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Production jitter backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Replays a fixed list of values, cycling when it runs out.
///
/// An empty script always yields 0.0.
#[derive(Debug, Default)]
pub struct ScriptedJitter {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedJitter {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }

    /// A source that always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// How many values have been drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl JitterSource for ScriptedJitter {
    fn next_unit(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()]
    }
}
