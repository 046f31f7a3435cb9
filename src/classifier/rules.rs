// Rule tables: ordered (pattern, label) data driving toxicity and categories.
//
// Every entry is a word-boundary anchored, case-insensitive alternation.
// Toxicity patterns are all evaluated (no short-circuit) because each match
// raises confidence. Category rules are evaluated in table order and each
// contributes its label at most once.

use anyhow::{Context, Result};
use regex_lite::Regex;

use crate::models::Language;

pub const SAFE_CONTENT: &str = "Safe Content";
pub const GENERAL_TOXICITY: &str = "General Toxicity";
pub const HATE_SPEECH: &str = "Hate Speech";
pub const THREATS_VIOLENCE: &str = "Threats/Violence";
pub const PERSONAL_ATTACK: &str = "Personal Attack";
pub const BODY_SHAMING: &str = "Body Shaming";
pub const PROFANITY: &str = "Profanity";

/// Toxicity patterns grouped by the language family they target.
/// Hindi and Tamil entries are transliterated into Latin script.
pub const TOXICITY_PATTERNS: &[(Language, &str)] = &[
    (
        Language::English,
        "hate|kill|die|stupid|loser|worthless|ugly|fat|dumb",
    ),
    (Language::English, "kys|kill yourself|go die"),
    (Language::English, r"f[*u]ck|sh[*i]t|damn|b[*i]tch"),
    (Language::Hindi, "maro|maar|pagal|bewakoof|gandu|chutiya"),
    (Language::Hindi, "tere ko|teri ma|bhag ja"),
    (Language::Tamil, "po|poda|poyi|kelu|kothadimai"),
    (Language::Tamil, "naaye|paithiyam|pochu"),
];

/// Category rules in evaluation order.
pub const CATEGORY_RULES: &[(&str, &str)] = &[
    ("hate|racist|discrimination", HATE_SPEECH),
    ("kill|die|suicide|harm", THREATS_VIOLENCE),
    ("stupid|dumb|loser|worthless", PERSONAL_ATTACK),
    ("ugly|fat|skinny|appearance", BODY_SHAMING),
    (r"f[*u]ck|sh[*i]t|b[*i]tch", PROFANITY),
];

/// A toxicity pattern that matched, identified by its table position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub index: usize,
    pub family: Language,
}

/// The compiled rule tables.
pub struct RuleSet {
    toxicity: Vec<(Language, Regex)>,
    categories: Vec<(Regex, &'static str)>,
}

impl RuleSet {
    /// Compile the built-in tables.
    pub fn compile() -> Result<Self> {
        let toxicity = TOXICITY_PATTERNS
            .iter()
            .map(|(family, alternation)| Ok((*family, word_pattern(alternation)?)))
            .collect::<Result<Vec<_>>>()?;
        let categories = CATEGORY_RULES
            .iter()
            .map(|(alternation, label)| Ok((word_pattern(alternation)?, *label)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            toxicity,
            categories,
        })
    }

    /// Every toxicity pattern that matches `text`, in table order.
    pub fn toxicity_matches(&self, text: &str) -> Vec<PatternMatch> {
        self.toxicity
            .iter()
            .enumerate()
            .filter(|(_, (_, pattern))| pattern.is_match(text))
            .map(|(index, (family, _))| PatternMatch {
                index,
                family: *family,
            })
            .collect()
    }

    /// Category labels for a finalized toxicity verdict.
    ///
    /// Clean text is always `["Safe Content"]`, whatever it matches. Toxic
    /// text with no category hit falls back to `["General Toxicity"]`.
    pub fn categorize(&self, text: &str, is_toxic: bool) -> Vec<String> {
        if !is_toxic {
            return vec![SAFE_CONTENT.to_string()];
        }

        let categories: Vec<String> = self
            .categories
            .iter()
            .filter(|(pattern, _)| pattern.is_match(text))
            .map(|(_, label)| label.to_string())
            .collect();

        if categories.is_empty() {
            vec![GENERAL_TOXICITY.to_string()]
        } else {
            categories
        }
    }
}

fn word_pattern(alternation: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
        .with_context(|| format!("Invalid rule pattern: {alternation}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::compile().unwrap()
    }

    #[test]
    fn test_tables_compile() {
        let rules = rules();
        assert_eq!(rules.toxicity.len(), TOXICITY_PATTERNS.len());
        assert_eq!(rules.categories.len(), CATEGORY_RULES.len());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let matches = rules().toxicity_matches("You are STUPID");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].family, Language::English);
    }

    #[test]
    fn test_word_boundaries() {
        // "skill" contains "kill" but not as a whole word
        assert!(rules().toxicity_matches("great skill shown").is_empty());
        // "po" only matches standalone
        assert!(rules().toxicity_matches("a powerful point").is_empty());
        assert_eq!(rules().toxicity_matches("po da").len(), 1);
    }

    #[test]
    fn test_all_patterns_evaluated() {
        // Pattern 0 (kill) and pattern 1 (kill yourself) both hit
        let matches = rules().toxicity_matches("I hate you so much, go kill yourself");
        let indices: Vec<usize> = matches.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_masked_profanity() {
        let matches = rules().toxicity_matches("what the f*ck");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 2);
    }

    #[test]
    fn test_transliterated_families() {
        let hindi = rules().toxicity_matches("tu pagal hai");
        assert_eq!(hindi[0].family, Language::Hindi);
        let tamil = rules().toxicity_matches("nee oru paithiyam");
        assert_eq!(tamil[0].family, Language::Tamil);
    }

    #[test]
    fn test_clean_is_safe_content_even_with_hits() {
        assert_eq!(rules().categorize("stupid ugly", false), vec![SAFE_CONTENT]);
    }

    #[test]
    fn test_categories_in_rule_order() {
        let cats = rules().categorize("ugly stupid hate, go die", true);
        assert_eq!(
            cats,
            vec![HATE_SPEECH, THREATS_VIOLENCE, PERSONAL_ATTACK, BODY_SHAMING]
        );
    }

    #[test]
    fn test_toxic_without_category_is_general() {
        assert_eq!(rules().categorize("tu pagal hai", true), vec![GENERAL_TOXICITY]);
        assert_eq!(rules().categorize("", true), vec![GENERAL_TOXICITY]);
    }

    #[test]
    fn test_damn_is_toxic_but_not_profanity_category() {
        let rules = rules();
        assert_eq!(rules.toxicity_matches("damn it").len(), 1);
        assert_eq!(rules.categorize("damn it", true), vec![GENERAL_TOXICITY]);
    }
}
