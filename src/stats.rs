// Admin statistics and result filtering: pure functions over a history slice.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{DetectionResult, Language};

/// Result counts per resolved language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LanguageStats {
    pub tamil: usize,
    pub hindi: usize,
    pub english: usize,
    pub mixed: usize,
}

impl LanguageStats {
    pub fn get(&self, language: Language) -> usize {
        match language {
            Language::Tamil => self.tamil,
            Language::Hindi => self.hindi,
            Language::English => self.english,
            Language::Mixed => self.mixed,
        }
    }

    fn increment(&mut self, language: Language) {
        match language {
            Language::Tamil => self.tamil += 1,
            Language::Hindi => self.hindi += 1,
            Language::English => self.english += 1,
            Language::Mixed => self.mixed += 1,
        }
    }

    /// (language, count) pairs in breakdown order.
    pub fn entries(&self) -> [(Language, usize); 4] {
        Language::ALL.map(|language| (language, self.get(language)))
    }
}

/// Aggregate numbers for the admin view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_analyzed: usize,
    pub toxic_detected: usize,
    pub clean_messages: usize,
    pub language_breakdown: LanguageStats,
    /// 0.0 for an empty history
    pub avg_confidence: f64,
}

/// Aggregate a history. Always satisfies `toxic + clean == total`.
pub fn compute_stats(history: &[DetectionResult]) -> AdminStats {
    let total_analyzed = history.len();
    let toxic_detected = history.iter().filter(|r| r.is_toxic).count();

    let mut language_breakdown = LanguageStats::default();
    for result in history {
        language_breakdown.increment(result.language);
    }

    let avg_confidence = if total_analyzed > 0 {
        history.iter().map(|r| r.confidence).sum::<f64>() / total_analyzed as f64
    } else {
        0.0
    };

    AdminStats {
        total_analyzed,
        toxic_detected,
        clean_messages: total_analyzed - toxic_detected,
        language_breakdown,
        avg_confidence,
    }
}

/// Which slice of the history an admin view or export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFilter {
    #[default]
    All,
    Toxic,
    Clean,
}

impl ResultFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFilter::All => "all",
            ResultFilter::Toxic => "toxic",
            ResultFilter::Clean => "clean",
        }
    }

    pub fn matches(&self, result: &DetectionResult) -> bool {
        match self {
            ResultFilter::All => true,
            ResultFilter::Toxic => result.is_toxic,
            ResultFilter::Clean => !result.is_toxic,
        }
    }

    /// Matching results, preserving history order.
    pub fn apply<'a>(&self, history: &'a [DetectionResult]) -> Vec<&'a DetectionResult> {
        history.iter().filter(|r| self.matches(r)).collect()
    }
}

impl fmt::Display for ResultFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResultFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ResultFilter::All),
            "toxic" => Ok(ResultFilter::Toxic),
            "clean" => Ok(ResultFilter::Clean),
            other => Err(format!(
                "unknown filter '{other}' (expected all, toxic or clean)"
            )),
        }
    }
}
