//! Skill extraction: picks dictionary matching or the NER fallback for one résumé text.
//!
//! Both paths receive the same normalized text (lowercased, whitespace runs
//! collapsed). The NER model only runs when the text has nothing the
//! dictionary could match.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::ner::{skill_mentions, SkillTagger};
use crate::skills::matcher::SkillMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Dictionary,
    Ner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillExtraction {
    pub skills: BTreeSet<String>,
    pub method: ExtractionMethod,
}

/// Lowercases and collapses every whitespace run into a single space.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Text is usable when it contains at least one alphanumeric character.
pub fn has_usable_text(normalized: &str) -> bool {
    normalized.chars().any(char::is_alphanumeric)
}

/// Extracts the skill set from raw extracted text.
/// Dictionary matching when the text is usable, otherwise the NER tagger.
pub fn extract_skills(
    raw_text: &str,
    matcher: &SkillMatcher,
    tagger: &dyn SkillTagger,
) -> anyhow::Result<SkillExtraction> {
    let normalized = normalize_text(raw_text);

    if has_usable_text(&normalized) {
        let skills = matcher.find_skills(&normalized);
        info!("Dictionary matcher found {} skills", skills.len());
        return Ok(SkillExtraction {
            skills,
            method: ExtractionMethod::Dictionary,
        });
    }

    let spans = tagger.tag(&normalized)?;
    let skills = skill_mentions(&spans)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect::<BTreeSet<_>>();
    info!("No usable text extracted; NER fallback found {} skills", skills.len());
    Ok(SkillExtraction {
        skills,
        method: ExtractionMethod::Ner,
    })
}
