//! Axum route handler for résumé verification.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::github::validate_username;
use crate::skills::pdf::extract_pdf_text;
use crate::skills::ExtractionMethod;
use crate::state::AppState;
use crate::verification::pipeline::verify_text;

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub filename: Option<String>,
    pub resume_skills: Vec<String>,
    pub github_username: String,
    pub matching_skills: Vec<String>,
    pub repositories_checked: usize,
    pub score: f64,
    pub extraction_method: ExtractionMethod,
}

/// Fields of the multipart upload.
struct ResumeUpload {
    filename: Option<String>,
    file: Bytes,
    github_username: String,
}

/// POST /verify_resume
///
/// Multipart fields: `file` (PDF) and `github_username`.
pub async fn handle_verify_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VerificationResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let username = validate_username(&upload.github_username)?.to_string();

    info!(
        "Verifying resume {:?} ({} bytes) against GitHub user '{username}'",
        upload.filename,
        upload.file.len()
    );

    let raw_text = extract_pdf_text(upload.file).await?;
    let report = verify_text(
        Arc::clone(&state.skills),
        Arc::clone(&state.tagger),
        state.repositories.as_ref(),
        raw_text,
        &username,
    )
    .await?;

    info!(
        "Verified '{username}': {}/{} skills matched, score {}",
        report.matching_skills.len(),
        report.resume_skills.len(),
        report.score
    );

    Ok(Json(VerificationResponse {
        filename: upload.filename,
        resume_skills: report.resume_skills.into_iter().collect(),
        github_username: username,
        matching_skills: report.matching_skills.into_iter().collect(),
        repositories_checked: report.repositories_checked,
        score: report.score,
        extraction_method: report.extraction_method,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<ResumeUpload, AppError> {
    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut github_username: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;
                file = Some((filename, bytes));
            }
            Some("github_username") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read github_username: {e}")))?;
                github_username = Some(text);
            }
            _ => {}
        }
    }

    let (filename, file) =
        file.ok_or_else(|| AppError::Validation("Missing multipart field 'file'".to_string()))?;
    if file.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    let github_username = github_username.ok_or_else(|| {
        AppError::Validation("Missing multipart field 'github_username'".to_string())
    })?;

    Ok(ResumeUpload {
        filename,
        file,
        github_username,
    })
}
