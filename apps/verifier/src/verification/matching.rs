//! Matching & scoring: which résumé skills are backed by repository languages.

use std::collections::{BTreeSet, HashSet};

use crate::github::RepoLanguageMap;

/// Skills that appear, case-insensitively and exactly, in at least one repository's languages.
pub fn match_skills(skills: &BTreeSet<String>, languages: &RepoLanguageMap) -> BTreeSet<String> {
    let known: HashSet<String> = languages
        .values()
        .flatten()
        .map(|language| language.to_lowercase())
        .collect();

    skills
        .iter()
        .filter(|skill| known.contains(&skill.to_lowercase()))
        .cloned()
        .collect()
}

/// Percentage of extracted skills that matched, rounded to two decimals.
/// Zero when nothing was extracted.
pub fn compute_score(matched: usize, extracted: usize) -> f64 {
    if extracted == 0 {
        return 0.0;
    }
    let percent = (matched.min(extracted) as f64 / extracted as f64) * 100.0;
    round2(percent)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn language_map(entries: &[(&str, &[&str])]) -> RepoLanguageMap {
        entries
            .iter()
            .map(|(repo, langs)| {
                (
                    repo.to_string(),
                    langs.iter().map(|l| l.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_end_to_end_example() {
        let skills = set(&["python", "docker"]);
        let languages = language_map(&[("repoA", &["Python"]), ("repoB", &["Go"])]);
        let matched = match_skills(&skills, &languages);
        assert_eq!(matched, set(&["python"]));
        assert_eq!(compute_score(matched.len(), skills.len()), 50.0);
    }

    #[test]
    fn test_match_is_case_insensitive_both_ways() {
        let skills = set(&["Rust", "typescript"]);
        let languages = language_map(&[("r", &["rust", "TypeScript"])]);
        assert_eq!(match_skills(&skills, &languages), set(&["Rust", "typescript"]));
    }

    #[test]
    fn test_match_is_exact_not_substring() {
        let skills = set(&["java", "c"]);
        let languages = language_map(&[("web", &["JavaScript", "C++"])]);
        assert!(match_skills(&skills, &languages).is_empty());
    }

    #[test]
    fn test_empty_skills_score_zero() {
        let languages = language_map(&[("repoA", &["Python"])]);
        let matched = match_skills(&BTreeSet::new(), &languages);
        assert!(matched.is_empty());
        assert_eq!(compute_score(0, 0), 0.0);
    }

    #[test]
    fn test_score_rounds_to_two_decimals() {
        assert_eq!(compute_score(1, 3), 33.33);
        assert_eq!(compute_score(2, 3), 66.67);
        assert_eq!(compute_score(3, 3), 100.0);
    }

    #[test]
    fn test_score_is_bounded() {
        for extracted in 0..20 {
            for matched in 0..=extracted + 2 {
                let score = compute_score(matched, extracted);
                assert!((0.0..=100.0).contains(&score), "score {score} out of range");
            }
        }
    }
}
