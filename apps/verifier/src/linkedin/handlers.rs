use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::linkedin::LinkedInProfile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkedInRequest {
    /// Echoed into logs only; the token identifies the member.
    pub profile_url: String,
    pub linkedin_token: String,
}

/// POST /linkedin-profile
pub async fn handle_linkedin_profile(
    State(state): State<AppState>,
    Json(request): Json<LinkedInRequest>,
) -> Result<Json<LinkedInProfile>, AppError> {
    if request.linkedin_token.trim().is_empty() {
        return Err(AppError::Validation("linkedin_token cannot be empty".to_string()));
    }

    info!("Fetching LinkedIn profile for {}", request.profile_url);
    let profile = state
        .linkedin
        .fetch_profile(request.linkedin_token.trim())
        .await?;
    Ok(Json(profile))
}
