//! Repository language aggregation: one listing call, then one languages call per repository.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::github::{GitHubError, RepositorySource};

/// Repository name → language names, most-used first.
pub type RepoLanguageMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryLanguages {
    /// Repositories returned by the listing, including ones whose languages could not be fetched.
    pub repositories_checked: usize,
    pub languages: RepoLanguageMap,
}

/// Builds the language map for `username`.
///
/// A failed listing aborts before any per-repository call. A failed
/// per-repository call drops only that repository.
pub async fn aggregate_languages(
    source: &dyn RepositorySource,
    username: &str,
) -> Result<RepositoryLanguages, GitHubError> {
    let repositories = source.list_repositories(username).await?;

    let mut languages = RepoLanguageMap::new();
    for repository in &repositories {
        match source.repository_languages(repository).await {
            Ok(names) => {
                languages.insert(repository.name.clone(), names);
            }
            Err(e) => {
                warn!("Skipping repository '{}': {e}", repository.name);
            }
        }
    }

    info!(
        "Aggregated languages for '{username}': {} of {} repositories",
        languages.len(),
        repositories.len()
    );

    Ok(RepositoryLanguages {
        repositories_checked: repositories.len(),
        languages,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::github::Repository;

    /// In-memory repository source. Repositories whose languages are `None` fail.
    #[derive(Default)]
    pub struct FakeRepositorySource {
        pub users: HashMap<String, Vec<(String, Option<Vec<String>>)>>,
        pub language_calls: AtomicUsize,
    }

    impl FakeRepositorySource {
        pub fn with_user(mut self, user: &str, repos: &[(&str, Option<&[&str]>)]) -> Self {
            let repos = repos
                .iter()
                .map(|(name, langs)| {
                    (
                        name.to_string(),
                        langs.map(|l| l.iter().map(|s| s.to_string()).collect()),
                    )
                })
                .collect();
            self.users.insert(user.to_string(), repos);
            self
        }
    }

    #[async_trait]
    impl RepositorySource for FakeRepositorySource {
        async fn list_repositories(&self, username: &str) -> Result<Vec<Repository>, GitHubError> {
            let repos = self
                .users
                .get(username)
                .ok_or_else(|| GitHubError::UserNotFound(username.to_string()))?;
            Ok(repos
                .iter()
                .map(|(name, _)| Repository {
                    name: name.clone(),
                    languages_url: format!("fake://{username}/{name}/languages"),
                })
                .collect())
        }

        async fn repository_languages(
            &self,
            repository: &Repository,
        ) -> Result<Vec<String>, GitHubError> {
            self.language_calls.fetch_add(1, Ordering::SeqCst);
            self.users
                .values()
                .flatten()
                .find(|(name, _)| *name == repository.name)
                .and_then(|(_, langs)| langs.clone())
                .ok_or_else(|| GitHubError::Api {
                    status: 500,
                    url: repository.languages_url.clone(),
                })
        }
    }

    #[tokio::test]
    async fn test_builds_language_map() {
        let source = FakeRepositorySource::default().with_user(
            "octocat",
            &[("repoA", Some(&["Python", "Shell"][..])), ("repoB", Some(&["Go"][..]))],
        );
        let result = aggregate_languages(&source, "octocat").await.unwrap();
        assert_eq!(result.repositories_checked, 2);
        assert_eq!(
            result.languages.get("repoA").unwrap(),
            &vec!["Python".to_string(), "Shell".to_string()]
        );
        assert_eq!(result.languages.get("repoB").unwrap(), &vec!["Go".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_user_makes_no_language_calls() {
        let source = FakeRepositorySource::default();
        let result = aggregate_languages(&source, "ghost").await;
        assert!(matches!(result, Err(GitHubError::UserNotFound(_))));
        assert_eq!(source.language_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_repository_is_skipped() {
        let source = FakeRepositorySource::default().with_user(
            "octocat",
            &[("repoA", Some(&["Rust"][..])), ("broken", None)],
        );
        let result = aggregate_languages(&source, "octocat").await.unwrap();
        assert_eq!(result.repositories_checked, 2);
        assert!(result.languages.contains_key("repoA"));
        assert!(!result.languages.contains_key("broken"));
        assert_eq!(source.language_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_user_without_repositories() {
        let source = FakeRepositorySource::default().with_user("empty", &[]);
        let result = aggregate_languages(&source, "empty").await.unwrap();
        assert_eq!(result, RepositoryLanguages::default());
    }
}
