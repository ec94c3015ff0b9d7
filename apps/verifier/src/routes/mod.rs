pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::linkedin::handlers as linkedin;
use crate::state::AppState;
use crate::verification::handlers as verification;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Résumé verification
        .route("/verify_resume", post(verification::handle_verify_resume))
        .route("/verify_resume/", post(verification::handle_verify_resume))
        // Interview quiz
        .route("/get-questions", post(interview::handle_get_questions))
        .route("/check-answer", post(interview::handle_check_answer))
        // LinkedIn pass-through
        .route("/linkedin-profile", post(linkedin::handle_linkedin_profile))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
