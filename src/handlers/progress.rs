// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::progress::{TrackTimeRequest, UpdateNotesRequest},
    services::progress::ProgressService,
    utils::jwt::Claims,
};

/// Lists an enrollment's lesson-progress rows.
pub async fn get_user_progress(
    State(pool): State<PgPool>,
    Path(enrollment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let progress = ProgressService::new(pool)
        .get_user_progress(enrollment_id)
        .await?;
    Ok(Json(progress))
}

/// Marks a lesson complete and re-derives the enrollment percentage.
pub async fn mark_lesson_complete(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((enrollment_id, lesson_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let progress = ProgressService::new(pool)
        .mark_lesson_complete(user_id, enrollment_id, lesson_id)
        .await?;

    Ok(Json(progress))
}

/// Adds minutes to a progress record.
pub async fn track_time_spent(
    State(pool): State<PgPool>,
    Path(progress_id): Path<i64>,
    Json(payload): Json<TrackTimeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let progress = ProgressService::new(pool)
        .track_time_spent(progress_id, payload.minutes)
        .await?;

    Ok(Json(progress))
}

/// Sets the user's notes on a lesson.
pub async fn update_lesson_notes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((enrollment_id, lesson_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user_id = claims.user_id()?;
    let progress = ProgressService::new(pool)
        .update_lesson_notes(user_id, enrollment_id, lesson_id, &payload.notes)
        .await?;

    Ok(Json(progress))
}

/// Aggregated stats for the authenticated user.
pub async fn get_progress_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let stats = ProgressService::new(pool).get_progress_stats(user_id).await?;

    Ok(Json(stats))
}
