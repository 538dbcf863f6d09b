// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{ChangePasswordRequest, MeResponse, UpdateProfileRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

/// Get current user's profile and learning statistics.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    // Subqueries keep this a single round trip; both hit user_id indexes.
    let me: Option<(i64, String, String, Option<chrono::DateTime<chrono::Utc>>, i64, i64)> =
        sqlx::query_as(
            "SELECT u.id, u.username, u.role, u.created_at, \
             (SELECT COUNT(*) FROM enrollments WHERE user_id = u.id), \
             (SELECT COUNT(*) FROM user_progress WHERE user_id = u.id AND completed) \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(&pool)
        .await?;

    let (id, username, role, created_at, total_enrollments, completed_lessons) =
        me.ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id,
        username,
        role,
        created_at,
        total_enrollments,
        completed_lessons,
    }))
}

/// Update the current user's profile. A taken username is a conflict.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;

    let user: User = sqlx::query_as(
        "UPDATE users SET username = COALESCE($2, username) \
         WHERE id = $1 RETURNING id, username, password, role, created_at",
    )
    .bind(user_id)
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        if crate::error::is_unique_violation(&e) {
            AppError::Conflict("Username already taken".to_string())
        } else {
            AppError::from(e)
        }
    })?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Change the current user's password, re-proving the current one first.
pub async fn change_password(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;

    let user: User = sqlx::query_as(
        "SELECT id, username, password, role, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::AuthError(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
        .bind(user_id)
        .bind(&hashed_password)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}
