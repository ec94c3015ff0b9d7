//! GitHub client: the only module that talks to the GitHub REST API.
//!
//! `AppState` carries an `Arc<dyn RepositorySource>`; production uses
//! [`GitHubClient`], tests swap in an in-memory source.

pub mod languages;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub use languages::{aggregate_languages, RepoLanguageMap, RepositoryLanguages};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
/// GitHub logins are at most 39 characters.
const MAX_USERNAME_LEN: usize = 39;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub user '{0}' not found")]
    UserNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}) for {url}")]
    Api { status: u16, url: String },
}

impl From<GitHubError> for AppError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::UserNotFound(_) => AppError::NotFound("GitHub user not found".to_string()),
            other => AppError::Upstream(format!("GitHub: {other}")),
        }
    }
}

/// Repository metadata; only the fields the aggregator needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub languages_url: String,
}

/// Source of repositories and their languages.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Lists the repositories owned by `username`.
    /// A non-success status must be reported as `GitHubError::UserNotFound`.
    async fn list_repositories(&self, username: &str) -> Result<Vec<Repository>, GitHubError>;

    /// Language names of one repository, in the order the API returns them.
    async fn repository_languages(&self, repository: &Repository) -> Result<Vec<String>, GitHubError>;
}

/// GitHub REST client. Timeouts are set on the shared `reqwest::Client`.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(client: Client, api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_repositories(&self, username: &str) -> Result<Vec<Repository>, GitHubError> {
        let url = format!("{}/users/{}/repos", self.api_url, username);
        let response = self.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Repository listing for '{username}' returned {status}");
            return Err(GitHubError::UserNotFound(username.to_string()));
        }

        Ok(response.json::<Vec<Repository>>().await?)
    }

    async fn repository_languages(&self, repository: &Repository) -> Result<Vec<String>, GitHubError> {
        let response = self.get(&repository.languages_url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GitHubError::Api {
                status: status.as_u16(),
                url: repository.languages_url.clone(),
            });
        }

        // Byte counts are discarded; key order is preserved.
        let breakdown: serde_json::Map<String, serde_json::Value> = response.json().await?;
        Ok(breakdown.into_iter().map(|(language, _)| language).collect())
    }
}

/// Rejects anything that is not a plausible GitHub login before it is put in a URL.
pub fn validate_username(username: &str) -> Result<&str, AppError> {
    let username = username.trim();
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(username)
    } else {
        Err(AppError::Validation(format!(
            "'{username}' is not a valid GitHub username"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::github::languages::aggregate_languages;
    use crate::test_support::{closed_port_url, serve_stub};

    #[test]
    fn test_valid_usernames() {
        assert_eq!(validate_username("octocat").unwrap(), "octocat");
        assert_eq!(validate_username(" my-user-42 ").unwrap(), "my-user-42");
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(validate_username("").is_err());
        assert!(validate_username("../orgs/x").is_err());
        assert!(validate_username("user?page=2").is_err());
        assert!(validate_username(&"a".repeat(40)).is_err());
    }

    #[test]
    fn test_user_not_found_maps_to_404_kind() {
        let err: AppError = GitHubError::UserNotFound("ghost".to_string()).into();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "GitHub user not found"));
    }

    #[test]
    fn test_api_error_maps_to_upstream() {
        let err: AppError = GitHubError::Api {
            status: 500,
            url: "https://api.github.com/x".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let client = GitHubClient::new(Client::new(), "https://ghe.example.com/api/v3/", None);
        assert_eq!(client.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_repository_ignores_extra_fields() {
        let json = r#"[{"id": 1, "name": "repoA", "languages_url": "https://api.github.com/repos/u/repoA/languages", "fork": false}]"#;
        let repos: Vec<Repository> = serde_json::from_str(json).unwrap();
        assert_eq!(repos[0].name, "repoA");
    }

    #[derive(Clone)]
    struct StubGitHub {
        base_url: String,
        language_hits: Arc<AtomicUsize>,
    }

    async fn stub_repos(State(stub): State<StubGitHub>, Path(user): Path<String>) -> Response {
        if user != "octocat" {
            return (
                axum::http::StatusCode::NOT_FOUND,
                Json(json!({"message": "Not Found"})),
            )
                .into_response();
        }
        Json(json!([
            {
                "name": "repoA",
                "languages_url": format!("{}/repos/octocat/repoA/languages", stub.base_url),
                "fork": false
            },
            {
                "name": "broken",
                "languages_url": format!("{}/repos/octocat/broken/languages", stub.base_url),
                "fork": false
            }
        ]))
        .into_response()
    }

    async fn stub_languages(
        State(stub): State<StubGitHub>,
        Path((_owner, repo)): Path<(String, String)>,
    ) -> Response {
        stub.language_hits.fetch_add(1, Ordering::SeqCst);
        if repo == "broken" {
            return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        // Deliberately not alphabetical.
        (
            [("content-type", "application/json")],
            r#"{"TypeScript": 9000, "Python": 1200, "Go": 40}"#,
        )
            .into_response()
    }

    async fn github_stub() -> (GitHubClient, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let language_hits = Arc::clone(&hits);
        let base_url = serve_stub(move |base_url| {
            Router::new()
                .route("/users/:user/repos", get(stub_repos))
                .route("/repos/:owner/:repo/languages", get(stub_languages))
                .with_state(StubGitHub {
                    base_url,
                    language_hits,
                })
        })
        .await;
        (GitHubClient::new(Client::new(), base_url, None), hits)
    }

    #[tokio::test]
    async fn test_lists_repositories_over_http() {
        let (client, _) = github_stub().await;
        let repos = client.list_repositories("octocat").await.unwrap();
        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["repoA", "broken"]);
    }

    #[tokio::test]
    async fn test_non_success_listing_is_user_not_found() {
        let (client, hits) = github_stub().await;

        let result = aggregate_languages(&client, "ghost").await;

        assert!(matches!(result, Err(GitHubError::UserNotFound(ref u)) if u == "ghost"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let err: AppError = result.unwrap_err().into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_languages_keep_response_order_and_skip_failures() {
        let (client, hits) = github_stub().await;

        let result = aggregate_languages(&client, "octocat").await.unwrap();

        assert_eq!(result.repositories_checked, 2);
        assert_eq!(
            result.languages.get("repoA").unwrap(),
            &vec!["TypeScript".to_string(), "Python".to_string(), "Go".to_string()]
        );
        assert!(!result.languages.contains_key("broken"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_upstream() {
        let client = GitHubClient::new(Client::new(), closed_port_url().await, None);

        let result = client.list_repositories("octocat").await;

        assert!(matches!(result, Err(GitHubError::Http(_))));
        let err: AppError = result.unwrap_err().into();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
