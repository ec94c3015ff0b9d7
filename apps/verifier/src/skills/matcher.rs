//! Dictionary matcher: finds vocabulary skills as whole words in résumé text.
//!
//! A word boundary is the start/end of the text or any character that is not
//! alphanumeric or `_`. Entries ending in symbols (`c++`, `c#`) therefore match
//! where a plain `\b` would not.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use crate::skills::vocabulary::SkillVocabulary;

/// Vocabulary with one compiled pattern per skill. Compiled once at startup.
pub struct SkillMatcher {
    patterns: Vec<(String, Regex)>,
}

impl SkillMatcher {
    pub fn new(vocabulary: &SkillVocabulary) -> Self {
        let mut patterns: Vec<(String, Regex)> = vocabulary
            .iter()
            .filter_map(|skill| match whole_word_pattern(skill) {
                Ok(re) => Some((skill.to_string(), re)),
                Err(e) => {
                    // Escaped literals always compile; only the size limit can trip this.
                    debug!("Skipping skill '{skill}': {e}");
                    None
                }
            })
            .collect();
        patterns.sort_by(|a, b| a.0.cmp(&b.0));
        Self { patterns }
    }

    /// Returns every vocabulary entry that occurs as a whole word in `text`.
    pub fn find_skills(&self, text: &str) -> BTreeSet<String> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(skill, _)| skill.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn whole_word_pattern(skill: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)(?:^|[^\p{{Alphabetic}}\p{{Nd}}_]){}(?:[^\p{{Alphabetic}}\p{{Nd}}_]|$)",
        regex::escape(skill)
    ))
}
