// src/models/progress.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'user_progress' table.
/// One row per (user, lesson), created on the first completion,
/// time-tracking or notes event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProgress {
    pub id: i64,
    pub user_id: i64,
    pub enrollment_id: i64,
    pub lesson_id: i64,
    pub completed: bool,

    /// Accumulated minutes.
    pub time_spent: i64,

    pub notes: Option<String>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for adding time to a progress record.
#[derive(Debug, Deserialize, Validate)]
pub struct TrackTimeRequest {
    #[validate(range(min = 1, message = "minutes must be positive"))]
    pub minutes: i64,
}

/// DTO for updating lesson notes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNotesRequest {
    #[validate(length(max = 10000))]
    pub notes: String,
}

/// Aggregated learning stats for one user.
#[derive(Debug, Serialize)]
pub struct ProgressStats {
    pub total_enrollments: i64,
    pub active_enrollments: i64,
    pub completed_enrollments: i64,
    pub completed_lessons: i64,
    pub total_time_spent: i64,
}
