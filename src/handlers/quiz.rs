// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{StartAttemptRequest, SubmitAttemptRequest},
        quiz::CreateQuizRequest,
    },
    services::quiz::QuizService,
    utils::jwt::Claims,
};

/// Creates a quiz with nested questions and options.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let quiz = QuizService::new(pool).create_quiz(payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Fetches a quiz for taking; correct answers are hidden.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = QuizService::new(pool).get_quiz(id).await?;
    Ok(Json(quiz))
}

pub async fn get_course_quizzes(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = QuizService::new(pool).get_course_quizzes(course_id).await?;
    Ok(Json(quizzes))
}

/// Starts a new attempt for the authenticated user.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let attempt = QuizService::new(pool)
        .start_attempt(user_id, payload.enrollment_id, quiz_id)
        .await?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Submits answers for an in-progress attempt and returns the graded
/// attempt. Re-submitting a completed attempt yields 409.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = QuizService::new(pool)
        .submit_attempt(attempt_id, &payload.answers)
        .await?;

    Ok(Json(attempt))
}

/// The authenticated user's attempts for a quiz, most recent first.
pub async fn get_user_attempts(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempts = QuizService::new(pool)
        .get_user_attempts(user_id, quiz_id)
        .await?;

    Ok(Json(attempts))
}

/// The user's best attempt for a quiz, or null when there is none.
pub async fn get_best_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempt = QuizService::new(pool)
        .get_best_attempt(user_id, quiz_id)
        .await?;

    Ok(Json(attempt))
}

pub async fn get_attempt_details(
    State(pool): State<PgPool>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = QuizService::new(pool).get_attempt_details(attempt_id).await?;
    Ok(Json(detail))
}
