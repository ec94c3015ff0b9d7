//! LinkedIn profile fetcher. Forwards the caller's token to the LinkedIn v2 API
//! and returns the profile plus a flattened list of positions.

pub mod handlers;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum LinkedInError {
    #[error("Invalid LinkedIn token")]
    InvalidToken,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<LinkedInError> for AppError {
    fn from(e: LinkedInError) -> Self {
        match e {
            LinkedInError::InvalidToken => AppError::Unauthorized("Invalid LinkedIn token".to_string()),
            other => AppError::Upstream(format!("LinkedIn: {other}")),
        }
    }
}

/// One experience entry, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub title: Option<String>,
    pub company: Option<String>,
    pub start: Option<Value>,
    pub end: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkedInProfile {
    pub profile: Value,
    pub experience: Vec<Position>,
}

#[derive(Debug, Default, Deserialize)]
struct PositionsPage {
    #[serde(default)]
    elements: Vec<RawPosition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    title: Option<String>,
    company_name: Option<String>,
    #[serde(default)]
    time_period: Option<TimePeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimePeriod {
    start_date: Option<Value>,
    end_date: Option<Value>,
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        let (start, end) = match raw.time_period {
            Some(period) => (period.start_date, period.end_date),
            None => (None, None),
        };
        Position {
            title: raw.title,
            company: raw.company_name,
            start,
            end,
        }
    }
}

#[derive(Clone)]
pub struct LinkedInClient {
    client: Client,
    api_url: String,
}

impl LinkedInClient {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches `/me` (required) and `/positions` (best effort).
    pub async fn fetch_profile(&self, token: &str) -> Result<LinkedInProfile, LinkedInError> {
        let response = self
            .client
            .get(format!("{}/me", self.api_url))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("LinkedIn /me returned {}", response.status());
            return Err(LinkedInError::InvalidToken);
        }
        let profile: Value = response.json().await?;

        let experience = match self.fetch_positions(token).await {
            Ok(positions) => positions,
            Err(e) => {
                warn!("LinkedIn positions unavailable: {e}");
                Vec::new()
            }
        };

        Ok(LinkedInProfile {
            profile,
            experience,
        })
    }

    async fn fetch_positions(&self, token: &str) -> Result<Vec<Position>, LinkedInError> {
        let response = self
            .client
            .get(format!("{}/positions", self.api_url))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;
        let page: PositionsPage = response.json().await?;
        Ok(page.elements.into_iter().map(Position::from).collect())
    }
}
