// Script-range language detection.
//
// Each script test only asks whether any character of that range appears.
// Two or more scripts present means the text is mixed.

use std::ops::RangeInclusive;

use crate::models::{Language, LanguageHint};

const TAMIL_BLOCK: RangeInclusive<char> = '\u{0B80}'..='\u{0BFF}';
const DEVANAGARI_BLOCK: RangeInclusive<char> = '\u{0900}'..='\u{097F}';

/// Which scripts appear in a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptPresence {
    pub tamil: bool,
    pub hindi: bool,
    pub english: bool,
}

impl ScriptPresence {
    pub fn scan(text: &str) -> Self {
        let mut presence = Self::default();
        for c in text.chars() {
            if TAMIL_BLOCK.contains(&c) {
                presence.tamil = true;
            } else if DEVANAGARI_BLOCK.contains(&c) {
                presence.hindi = true;
            } else if c.is_ascii_alphabetic() {
                presence.english = true;
            }
            if presence.tamil && presence.hindi && presence.english {
                break;
            }
        }
        presence
    }

    pub fn count(&self) -> usize {
        [self.tamil, self.hindi, self.english]
            .iter()
            .filter(|&&present| present)
            .count()
    }
}

/// Detect the language of a text from the scripts it uses.
///
/// Text with no recognized script (empty, digits, emoji) defaults to English.
pub fn detect_language(text: &str) -> Language {
    let presence = ScriptPresence::scan(text);
    if presence.count() > 1 {
        Language::Mixed
    } else if presence.tamil {
        Language::Tamil
    } else if presence.hindi {
        Language::Hindi
    } else {
        Language::English
    }
}

/// Resolve the language for a result: a fixed hint wins, `Auto` detects.
pub fn resolve_language(text: &str, hint: LanguageHint) -> Language {
    match hint.fixed() {
        Some(language) => language,
        None => detect_language(text),
    }
}
