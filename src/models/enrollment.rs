// src/models/enrollment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'enrollments' table.
///
/// `progress` is a cached value maintained by recalculation from
/// user_progress rows; the rows are the source of truth.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,

    /// 'active', 'completed' or 'dropped'.
    pub status: String,

    /// Completion percentage (0-100, two decimals).
    pub progress: f64,

    pub enrolled_at: chrono::DateTime<chrono::Utc>,
    pub last_accessed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for enrolling in a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub course_id: i64,
}

/// DTO for changing enrollment status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub const ENROLLMENT_STATUSES: [&str; 3] = ["active", "completed", "dropped"];
