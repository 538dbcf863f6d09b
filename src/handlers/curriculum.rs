// src/handlers/curriculum.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::course::{
        CreateLessonRequest, CreateSectionRequest, ReorderRequest, UpdateLessonRequest,
        UpdateSectionRequest,
    },
    services::curriculum::CurriculumService,
};

/// Lists a course's sections with lessons, ordered at every level.
pub async fn get_course_sections(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let sections = CurriculumService::new(pool)
        .get_course_sections(course_id)
        .await?;
    Ok(Json(sections))
}

pub async fn get_section(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let section = CurriculumService::new(pool).get_section(id).await?;
    Ok(Json(section))
}

pub async fn create_section(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let section = CurriculumService::new(pool).create_section(payload).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn update_section(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let section = CurriculumService::new(pool)
        .update_section(id, payload)
        .await?;
    Ok(Json(section))
}

pub async fn delete_section(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    CurriculumService::new(pool).delete_section(id).await?;
    Ok(Json(json!({ "message": "Section deleted successfully" })))
}

pub async fn reorder_sections(
    State(pool): State<PgPool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    CurriculumService::new(pool)
        .reorder_sections(course_id, &payload.ordered_ids)
        .await?;
    Ok(Json(json!({ "message": "Sections reordered successfully" })))
}

pub async fn get_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = CurriculumService::new(pool).get_lesson(id).await?;
    Ok(Json(lesson))
}

pub async fn create_lesson(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let lesson = CurriculumService::new(pool).create_lesson(payload).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn update_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let lesson = CurriculumService::new(pool)
        .update_lesson(id, payload)
        .await?;
    Ok(Json(lesson))
}

pub async fn delete_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    CurriculumService::new(pool).delete_lesson(id).await?;
    Ok(Json(json!({ "message": "Lesson deleted successfully" })))
}

pub async fn reorder_lessons(
    State(pool): State<PgPool>,
    Path(section_id): Path<i64>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    CurriculumService::new(pool)
        .reorder_lessons(section_id, &payload.ordered_ids)
        .await?;
    Ok(Json(json!({ "message": "Lessons reordered successfully" })))
}
