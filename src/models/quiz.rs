// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub lesson_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,

    /// Percentage threshold (0-100) an attempt must reach to pass.
    pub passing_score: i32,

    /// Optional time limit in minutes.
    pub time_limit: Option<i32>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'quiz_questions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub question: String,

    /// 'multiple-choice', 'true-false' or 'multi-select'.
    pub question_type: String,

    #[serde(rename = "order")]
    pub sort_order: i32,

    pub points: i64,
    pub explanation: Option<String>,
}

/// Represents the 'quiz_options' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
    #[serde(rename = "order")]
    pub sort_order: i32,
}

/// Option DTO for students: excludes `is_correct`.
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
}

impl From<QuizOption> for PublicOption {
    fn from(o: QuizOption) -> Self {
        PublicOption {
            id: o.id,
            question_id: o.question_id,
            text: o.text,
            sort_order: o.sort_order,
        }
    }
}

/// A question with its options, ordered.
#[derive(Debug, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: QuizQuestion,
    pub options: Vec<QuizOption>,
}

/// A question as shown to students (answer key hidden).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    #[serde(flatten)]
    pub question: QuizQuestion,
    pub options: Vec<PublicOption>,
}

/// Full quiz payload for students.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating an option inside a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    pub is_correct: bool,
    #[serde(rename = "order", default)]
    pub sort_order: i32,
}

/// DTO for creating a question inside a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    pub question_type: String,
    #[serde(rename = "order", default)]
    pub sort_order: i32,
    #[validate(range(min = 1))]
    pub points: i64,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
    #[validate(nested)]
    pub options: Vec<CreateOptionRequest>,
}

/// DTO for creating a quiz together with its questions and options.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    pub course_id: i64,
    pub lesson_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    pub time_limit: Option<i32>,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
}
