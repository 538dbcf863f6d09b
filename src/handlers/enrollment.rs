// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::enrollment::{EnrollRequest, UpdateStatusRequest},
    services::enrollment::EnrollmentService,
    utils::jwt::Claims,
};

/// Enrolls the authenticated user in a course. 409 when already enrolled.
pub async fn enroll(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let enrollment = EnrollmentService::new(pool)
        .enroll(user_id, payload.course_id)
        .await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn get_user_enrollments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let enrollments = EnrollmentService::new(pool)
        .get_user_enrollments(user_id)
        .await?;

    Ok(Json(enrollments))
}

pub async fn get_enrollment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let enrollment = EnrollmentService::new(pool).get_enrollment(id).await?;
    Ok(Json(enrollment))
}

/// Changes enrollment status. Completing forces progress to 100 and stamps
/// `completed_at` on the first transition only.
pub async fn update_status(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let enrollment = EnrollmentService::new(pool)
        .update_status(id, &payload.status)
        .await?;

    Ok(Json(enrollment))
}

/// Recomputes the enrollment's completion percentage from lesson progress.
pub async fn recalculate_progress(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let progress = EnrollmentService::new(pool).recalculate_progress(id).await?;
    Ok(Json(json!({ "progress": progress })))
}

/// Roster of everyone enrolled in a course, for instructors.
pub async fn get_course_enrollments(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let enrollments = EnrollmentService::new(pool)
        .get_course_enrollments(course_id)
        .await?;

    Ok(Json(enrollments))
}
