// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::models::quiz::QuestionWithOptions;

/// Represents the 'quiz_attempts' table.
///
/// Lifecycle: created in-progress (`completed_at` null) and transitioned
/// exactly once to completed by grading; a completed attempt is immutable.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: i64,
    pub enrollment_id: i64,
    pub quiz_id: i64,

    /// 1-based sequence per (user, quiz) pair.
    pub attempt_number: i32,

    /// Sum of points earned.
    pub score: i64,

    /// Sum of points over the questions actually answered,
    /// not all questions in the quiz.
    pub total_points: i64,

    /// score / total_points * 100, rounded to two decimals.
    pub percentage: f64,

    pub passed: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'user_answers' table.
/// Written once per graded question, never mutated afterward.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_option_ids: Json<Vec<i64>>,
    pub is_correct: bool,
    pub points_earned: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize)]
pub struct StartAttemptRequest {
    pub enrollment_id: i64,
}

/// One submitted answer: the question and the set of selected options.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_option_ids: Vec<i64>,
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Full attempt detail: the attempt, its answers, and the question/option
/// definitions they refer to (answer keys included, for review screens).
#[derive(Debug, Serialize)]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub answers: Vec<UserAnswer>,
    pub questions: Vec<QuestionWithOptions>,
}
