// Data model: the types that flow between the classifier, the result store
// and the output layer.
//
// Field names serialize in camelCase so the persisted JSON keeps the same
// shape the history has always had (`isToxic`, `enableFeedback`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A resolved language. Never `auto`: see [`LanguageHint`] for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tamil,
    Hindi,
    English,
    Mixed,
}

impl Language {
    /// Every language in breakdown order.
    pub const ALL: [Language; 4] = [
        Language::Tamil,
        Language::Hindi,
        Language::English,
        Language::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Tamil => "tamil",
            Language::Hindi => "hindi",
            Language::English => "english",
            Language::Mixed => "mixed",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Tamil => "Tamil",
            Language::Hindi => "Hindi",
            Language::English => "English",
            Language::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the caller asks for: either a fixed language or script detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageHint {
    #[default]
    Auto,
    Tamil,
    Hindi,
    English,
}

impl LanguageHint {
    /// Parse a hint, treating anything unrecognized as `Auto`.
    ///
    /// A hint can never make analysis fail, so there is no error path here.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => LanguageHint::Auto,
            "tamil" => LanguageHint::Tamil,
            "hindi" => LanguageHint::Hindi,
            "english" => LanguageHint::English,
            other => {
                debug!(hint = other, "Unrecognized language hint, falling back to auto");
                LanguageHint::Auto
            }
        }
    }

    /// The language this hint pins, or `None` when detection should run.
    pub fn fixed(&self) -> Option<Language> {
        match self {
            LanguageHint::Auto => None,
            LanguageHint::Tamil => Some(Language::Tamil),
            LanguageHint::Hindi => Some(Language::Hindi),
            LanguageHint::English => Some(Language::English),
        }
    }
}

/// A reviewer's verdict on a single result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Correct,
    Incorrect,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Correct => "correct",
            Feedback::Incorrect => "incorrect",
        }
    }
}

impl FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Feedback::Correct),
            "incorrect" => Ok(Feedback::Incorrect),
            other => Err(format!(
                "unknown feedback '{other}' (expected 'correct' or 'incorrect')"
            )),
        }
    }
}

/// Detection sensitivity preference stored alongside the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => Err(format!(
                "unknown sensitivity '{other}' (expected low, medium or high)"
            )),
        }
    }
}

/// User settings persisted next to the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub sensitivity: Sensitivity,
    /// When false, feedback submissions are ignored.
    pub enable_feedback: bool,
    /// When false, analysis results are shown but not appended to the history.
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::Medium,
            enable_feedback: true,
            auto_save: true,
        }
    }
}

/// The outcome of analyzing one piece of text.
///
/// Everything except `feedback` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub id: String,
    pub text: String,
    pub language: Language,
    pub is_toxic: bool,
    /// Always within [0.51, 0.99]
    pub confidence: f64,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Never empty; rule-evaluation order, no duplicates
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl DetectionResult {
    /// Build a fresh result stamped with the current time and a new id.
    pub fn new(
        text: &str,
        language: Language,
        is_toxic: bool,
        confidence: f64,
        categories: Vec<String>,
    ) -> Self {
        // Persisted timestamps carry milliseconds, so drop anything finer
        // up front and a reload compares equal.
        let timestamp = Utc::now().trunc_subsecs(3);
        Self {
            id: generate_id(timestamp),
            text: text.to_string(),
            language,
            is_toxic,
            confidence,
            timestamp,
            categories,
            feedback: None,
        }
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Epoch milliseconds followed by a short base-36 random suffix.
///
/// Uniqueness is best-effort: two results created in the same millisecond
/// collide only if the suffixes also match.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", now.timestamp_millis(), suffix)
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix,
/// e.g. `2024-05-01T10:00:00.000Z`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
