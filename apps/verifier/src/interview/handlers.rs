//! Axum route handlers for the interview quiz.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interview::question_bank::{Difficulty, Question};
use crate::interview::similarity::similarity_ratio;
use crate::state::AppState;
use crate::verification::matching::round2;

/// Similarity an answer must exceed to pass.
pub const PASS_THRESHOLD: f64 = 0.7;

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub technologies: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_text: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub expected_answer: String,
    pub candidate_answer: String,
    pub similarity_score: f64,
    pub result: Verdict,
}

/// POST /get-questions
pub async fn handle_get_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    if request.technologies.iter().all(|t| t.trim().is_empty()) {
        return Err(AppError::Validation(
            "technologies must name at least one technology".to_string(),
        ));
    }

    let difficulty = Difficulty::parse(&request.difficulty);
    let questions = {
        let mut rng = state
            .quiz_rng
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("quiz rng mutex poisoned")))?;
        state
            .question_bank
            .select(&request.technologies, difficulty, &mut *rng)
    };

    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for given tech stack".to_string(),
        ));
    }

    info!(
        "Selected {} {:?} questions for {:?}",
        questions.len(),
        difficulty,
        request.technologies
    );
    Ok(Json(QuestionResponse { questions }))
}

/// POST /check-answer
pub async fn handle_check_answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let question = state
        .question_bank
        .find_by_text(&request.question_text)
        .ok_or_else(|| AppError::NotFound("Question not found in bank".to_string()))?;

    let similarity = similarity_ratio(
        &request.answer.to_lowercase(),
        &question.expected_answer.to_lowercase(),
    );
    let result = if similarity > PASS_THRESHOLD {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    Ok(Json(AnswerResponse {
        expected_answer: question.expected_answer.clone(),
        candidate_answer: request.answer,
        similarity_score: round2(similarity),
        result,
    }))
}
