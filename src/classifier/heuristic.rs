// Heuristic toxicity classifier.
//
// Stands in for a trained model: script detection for the language, regex
// rule tables for the verdict, and a jittered confidence so repeated runs look
// like model output. The jitter comes from an injected JitterSource.
//
// Confidence pipeline:
//   1. start at 0.5
//   2. each matching toxicity pattern adds 0.2 + jitter*0.1, capped at 0.95
//   3. no match: 5% false positive in [0.5, 0.7), otherwise clean in [0.8, 0.95)
//   4. short text (< 10 chars) * 0.8, long text (> 100 chars) * 1.1
//   5. clamp to [0.51, 0.99]

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::language::resolve_language;
use super::rules::RuleSet;
use super::traits::{JitterSource, TextClassifier, ThreadRngJitter};
use crate::models::{DetectionResult, LanguageHint};

/// Fixed latency modeling model inference.
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(500);

const BASE_CONFIDENCE: f64 = 0.5;
const MATCH_INCREMENT: f64 = 0.2;
const MATCH_JITTER: f64 = 0.1;
const RUNNING_CAP: f64 = 0.95;

const FALSE_POSITIVE_RATE: f64 = 0.05;
const FALSE_POSITIVE_BASE: f64 = 0.5;
const FALSE_POSITIVE_SPREAD: f64 = 0.2;
const CLEAN_BASE: f64 = 0.8;
const CLEAN_SPREAD: f64 = 0.15;

const SHORT_TEXT_CHARS: usize = 10;
const SHORT_TEXT_FACTOR: f64 = 0.8;
const LONG_TEXT_CHARS: usize = 100;
const LONG_TEXT_FACTOR: f64 = 1.1;

pub const MIN_CONFIDENCE: f64 = 0.51;
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Compute the toxicity verdict and confidence.
///
/// `match_count` is how many toxicity patterns matched; `char_len` is the
/// text length in characters. Draws one jitter value per match, or two
/// (false-positive coin, then confidence) when nothing matched.
pub fn score_toxicity(match_count: usize, char_len: usize, jitter: &dyn JitterSource) -> (bool, f64) {
    let mut is_toxic = false;
    let mut confidence = BASE_CONFIDENCE;

    for _ in 0..match_count {
        is_toxic = true;
        confidence =
            (confidence + MATCH_INCREMENT + jitter.next_unit() * MATCH_JITTER).min(RUNNING_CAP);
    }

    if !is_toxic {
        if jitter.next_unit() < FALSE_POSITIVE_RATE {
            is_toxic = true;
            confidence = FALSE_POSITIVE_BASE + jitter.next_unit() * FALSE_POSITIVE_SPREAD;
        } else {
            confidence = CLEAN_BASE + jitter.next_unit() * CLEAN_SPREAD;
        }
    }

    if char_len < SHORT_TEXT_CHARS {
        confidence *= SHORT_TEXT_FACTOR;
    } else if char_len > LONG_TEXT_CHARS {
        confidence *= LONG_TEXT_FACTOR;
    }

    (is_toxic, confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
}

/// Pattern-based classifier for Tamil, Hindi, English and mixed text.
pub struct HeuristicClassifier {
    rules: RuleSet,
    jitter: Box<dyn JitterSource>,
    processing_delay: Duration,
}

impl HeuristicClassifier {
    /// Production classifier: thread RNG jitter and the default delay.
    pub fn new() -> Result<Self> {
        Self::with_jitter(Box::new(ThreadRngJitter))
    }

    /// Classifier with a caller-supplied jitter source and the default delay.
    pub fn with_jitter(jitter: Box<dyn JitterSource>) -> Result<Self> {
        Ok(Self {
            rules: RuleSet::compile()?,
            jitter,
            processing_delay: DEFAULT_PROCESSING_DELAY,
        })
    }

    /// Override the simulated processing delay (use `Duration::ZERO` in tests).
    pub fn with_processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The synchronous core of `analyze`, without the simulated delay.
    pub fn classify(&self, text: &str, hint: LanguageHint) -> DetectionResult {
        let language = resolve_language(text, hint);
        let matches = self.rules.toxicity_matches(text);
        let char_len = text.chars().count();
        let (is_toxic, confidence) = score_toxicity(matches.len(), char_len, self.jitter.as_ref());
        let categories = self.rules.categorize(text, is_toxic);

        let result = DetectionResult::new(text, language, is_toxic, confidence, categories);
        debug!(
            id = %result.id,
            language = %result.language,
            patterns_matched = matches.len(),
            is_toxic,
            confidence,
            "Classified text"
        );
        result
    }
}

#[async_trait]
impl TextClassifier for HeuristicClassifier {
    async fn analyze(&self, text: &str, hint: LanguageHint) -> DetectionResult {
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
        self.classify(text, hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::rules::{PERSONAL_ATTACK, SAFE_CONTENT};
    use crate::classifier::traits::ScriptedJitter;
    use crate::models::Language;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_match_no_jitter() {
        let jitter = ScriptedJitter::constant(0.0);
        let (toxic, conf) = score_toxicity(1, 31, &jitter);
        assert!(toxic);
        assert!(approx(conf, 0.7), "got {conf}");
        assert_eq!(jitter.draws(), 1);
    }

    #[test]
    fn test_running_cap_at_095() {
        let jitter = ScriptedJitter::constant(0.99);
        let (_, conf) = score_toxicity(3, 50, &jitter);
        // 0.5 + 0.299 = 0.799, then capped at 0.95 twice
        assert!(approx(conf, 0.95), "got {conf}");
    }

    #[test]
    fn test_clean_path() {
        // coin 0.5 >= 0.05 → clean, then 0.8 + 0.4 * 0.15 = 0.86
        let jitter = ScriptedJitter::new(vec![0.5, 0.4]);
        let (toxic, conf) = score_toxicity(0, 30, &jitter);
        assert!(!toxic);
        assert!(approx(conf, 0.86), "got {conf}");
        assert_eq!(jitter.draws(), 2);
    }

    #[test]
    fn test_false_positive_path() {
        // coin 0.01 < 0.05 → false positive, 0.5 + 0.5 * 0.2 = 0.6
        let jitter = ScriptedJitter::new(vec![0.01, 0.5]);
        let (toxic, conf) = score_toxicity(0, 30, &jitter);
        assert!(toxic);
        assert!(approx(conf, 0.6), "got {conf}");
    }

    #[test]
    fn test_short_text_penalty_and_floor() {
        // 0.7 * 0.8 = 0.56
        let (_, conf) = score_toxicity(1, 5, &ScriptedJitter::constant(0.0));
        assert!(approx(conf, 0.56), "got {conf}");
        // false positive at 0.5 * 0.8 = 0.4 → floor 0.51
        let (_, conf) = score_toxicity(0, 3, &ScriptedJitter::new(vec![0.0, 0.0]));
        assert!(approx(conf, 0.51), "got {conf}");
    }

    #[test]
    fn test_long_text_boost_and_ceiling() {
        // 0.95 * 1.1 = 1.045 → ceiling 0.99
        let (_, conf) = score_toxicity(0, 150, &ScriptedJitter::new(vec![0.9, 0.999]));
        assert!(approx(conf, 0.99), "got {conf}");
        // 0.7 * 1.1 = 0.77
        let (_, conf) = score_toxicity(1, 101, &ScriptedJitter::constant(0.0));
        assert!(approx(conf, 0.77), "got {conf}");
    }

    #[test]
    fn test_length_boundaries_unadjusted() {
        let (_, at_ten) = score_toxicity(1, 10, &ScriptedJitter::constant(0.0));
        let (_, at_hundred) = score_toxicity(1, 100, &ScriptedJitter::constant(0.0));
        assert!(approx(at_ten, 0.7));
        assert!(approx(at_hundred, 0.7));
    }

    #[test]
    fn test_classify_personal_attack() {
        let classifier =
            HeuristicClassifier::with_jitter(Box::new(ScriptedJitter::constant(0.0))).unwrap();
        let result = classifier.classify("You are so stupid and worthless", LanguageHint::Auto);
        assert_eq!(result.language, Language::English);
        assert!(result.is_toxic);
        assert!(approx(result.confidence, 0.7));
        assert_eq!(result.categories, vec![PERSONAL_ATTACK]);
        assert_eq!(result.text, "You are so stupid and worthless");
    }

    #[test]
    fn test_classify_clean_text() {
        let classifier =
            HeuristicClassifier::with_jitter(Box::new(ScriptedJitter::new(vec![0.5, 0.0])))
                .unwrap();
        let result = classifier.classify("Great job on your presentation!", LanguageHint::Auto);
        assert!(!result.is_toxic);
        assert_eq!(result.categories, vec![SAFE_CONTENT]);
        assert!(approx(result.confidence, 0.8));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 7 Tamil characters but 21 bytes: still short text
        let classifier =
            HeuristicClassifier::with_jitter(Box::new(ScriptedJitter::new(vec![0.5, 0.0])))
                .unwrap();
        let result = classifier.classify("நல்லவர்", LanguageHint::Auto);
        assert_eq!(result.language, Language::Tamil);
        assert!(approx(result.confidence, 0.8 * 0.8));
    }

    #[tokio::test]
    async fn test_analyze_respects_zero_delay() {
        let classifier = HeuristicClassifier::new()
            .unwrap()
            .with_processing_delay(Duration::ZERO);
        let result = classifier.analyze("", LanguageHint::Auto).await;
        assert_eq!(result.language, Language::English);
        assert!(!result.categories.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_waits_processing_delay() {
        let classifier = HeuristicClassifier::new().unwrap();
        let start = tokio::time::Instant::now();
        classifier.analyze("hello there", LanguageHint::Auto).await;
        assert!(start.elapsed() >= DEFAULT_PROCESSING_DELAY);
    }
}
