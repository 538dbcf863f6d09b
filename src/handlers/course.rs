// src/handlers/course.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::course::{CreateCourseRequest, UpdateCourseRequest},
    services::course::CourseService,
    utils::jwt::Claims,
};

pub async fn list_courses(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let courses = CourseService::new(pool).list_courses().await?;
    Ok(Json(courses))
}

pub async fn get_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = CourseService::new(pool).get_course(id).await?;
    Ok(Json(course))
}

pub async fn create_course(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let instructor_id = claims.user_id()?;
    let course = CourseService::new(pool)
        .create_course(instructor_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let course = CourseService::new(pool).update_course(id, payload).await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    CourseService::new(pool).delete_course(id).await?;
    Ok(Json(json!({ "message": "Course deleted successfully" })))
}
