// Résumé skill extraction: PDF text, vocabulary, dictionary matching, and the
// decision between dictionary and NER extraction.

pub mod extract;
pub mod matcher;
pub mod pdf;
pub mod vocabulary;

pub use extract::{extract_skills, ExtractionMethod, SkillExtraction};
pub use matcher::SkillMatcher;
pub use vocabulary::SkillVocabulary;
