//! Verification pipeline: extracted text → skills → repository languages → match report.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::errors::AppError;
use crate::github::{aggregate_languages, RepositorySource};
use crate::ner::SkillTagger;
use crate::skills::{extract_skills, ExtractionMethod, SkillMatcher};
use crate::verification::matching::{compute_score, match_skills};

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub resume_skills: BTreeSet<String>,
    pub matching_skills: BTreeSet<String>,
    pub repositories_checked: usize,
    pub score: f64,
    pub extraction_method: ExtractionMethod,
}

/// Runs the full pipeline for one résumé text.
///
/// Extraction (dictionary or NER) runs in `spawn_blocking`. A GitHub user that
/// cannot be listed aborts with `NotFound` before any language lookups.
pub async fn verify_text(
    matcher: Arc<SkillMatcher>,
    tagger: Arc<dyn SkillTagger>,
    source: &dyn RepositorySource,
    raw_text: String,
    username: &str,
) -> Result<VerificationReport, AppError> {
    let extraction =
        tokio::task::spawn_blocking(move || extract_skills(&raw_text, &matcher, tagger.as_ref()))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "spawn_blocking failed in skill extraction: {e}"
                ))
            })?
            .map_err(AppError::Internal)?;

    let repositories = aggregate_languages(source, username).await?;

    let matching_skills = match_skills(&extraction.skills, &repositories.languages);
    let score = compute_score(matching_skills.len(), extraction.skills.len());

    Ok(VerificationReport {
        resume_skills: extraction.skills,
        matching_skills,
        repositories_checked: repositories.repositories_checked,
        score,
        extraction_method: extraction.method,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::github::languages::tests::FakeRepositorySource;
    use crate::ner::EntitySpan;
    use crate::skills::SkillVocabulary;

    struct FixedTagger(Vec<&'static str>);

    impl SkillTagger for FixedTagger {
        fn tag(&self, _text: &str) -> anyhow::Result<Vec<EntitySpan>> {
            Ok(self
                .0
                .iter()
                .map(|skill| EntitySpan {
                    start: 0,
                    end: skill.len(),
                    label: "SKILL".to_string(),
                    text: skill.to_string(),
                })
                .collect())
        }
    }

    struct BrokenTagger;

    impl SkillTagger for BrokenTagger {
        fn tag(&self, _text: &str) -> anyhow::Result<Vec<EntitySpan>> {
            anyhow::bail!("model exploded")
        }
    }

    fn matcher() -> Arc<SkillMatcher> {
        Arc::new(SkillMatcher::new(&SkillVocabulary::new(["python", "docker"])))
    }

    fn source() -> FakeRepositorySource {
        FakeRepositorySource::default().with_user(
            "octocat",
            &[("repoA", Some(&["Python"][..])), ("repoB", Some(&["Go"][..]))],
        )
    }

    #[tokio::test]
    async fn test_dictionary_pipeline_end_to_end() {
        let report = verify_text(
            matcher(),
            Arc::new(FixedTagger(vec![])),
            &source(),
            "Experienced in Python and Docker tools".to_string(),
            "octocat",
        )
        .await
        .unwrap();

        assert_eq!(report.extraction_method, ExtractionMethod::Dictionary);
        assert_eq!(report.resume_skills.len(), 2);
        assert_eq!(
            report.matching_skills,
            BTreeSet::from(["python".to_string()])
        );
        assert_eq!(report.repositories_checked, 2);
        assert_eq!(report.score, 50.0);
    }

    #[tokio::test]
    async fn test_ner_pipeline_for_blank_text() {
        let report = verify_text(
            matcher(),
            Arc::new(FixedTagger(vec!["Go", "Kotlin"])),
            &source(),
            "   ".to_string(),
            "octocat",
        )
        .await
        .unwrap();

        assert_eq!(report.extraction_method, ExtractionMethod::Ner);
        assert_eq!(
            report.resume_skills,
            BTreeSet::from(["go".to_string(), "kotlin".to_string()])
        );
        assert_eq!(report.matching_skills, BTreeSet::from(["go".to_string()]));
        assert_eq!(report.score, 50.0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let source = source();
        let result = verify_text(
            matcher(),
            Arc::new(FixedTagger(vec![])),
            &source,
            "python".to_string(),
            "ghost",
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(source.language_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_skills_scores_zero() {
        let report = verify_text(
            matcher(),
            Arc::new(FixedTagger(vec![])),
            &source(),
            "nothing relevant here".to_string(),
            "octocat",
        )
        .await
        .unwrap();
        assert!(report.resume_skills.is_empty());
        assert_eq!(report.score, 0.0);
    }

    #[tokio::test]
    async fn test_tagger_failure_is_internal() {
        let result = verify_text(
            matcher(),
            Arc::new(BrokenTagger),
            &source(),
            String::new(),
            "octocat",
        )
        .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
