//! Skill NER: labels skill mentions in free text with a pre-trained
//! token-classification model.
//!
//! `AppState` holds an `Arc<dyn SkillTagger>`; the production backend is
//! [`bert::BertSkillTagger`], tests substitute a fake.

pub mod bert;
pub mod dataset;
pub mod train;

use std::collections::BTreeSet;

/// Entity label for skill mentions.
pub const SKILL_LABEL: &str = "SKILL";

/// A labeled span. Offsets are character (not byte) positions into the tagged text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub text: String,
}

/// Sequence labeler for skill mentions. Inference is CPU-bound; callers run it
/// inside `spawn_blocking`.
pub trait SkillTagger: Send + Sync {
    fn tag(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>>;
}

/// Distinct surface texts of the `SKILL` spans.
pub fn skill_mentions(spans: &[EntitySpan]) -> BTreeSet<String> {
    spans
        .iter()
        .filter(|span| span.label == SKILL_LABEL)
        .map(|span| span.text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}
