// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub instructor_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Denormalized counter, incremented on each enrollment.
    pub enrollment_count: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'course_sections' table.
/// Sections group lessons and are listed ascending by `sort_order`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseSection {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'lessons' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Lesson type: 'video', 'text', 'quiz' or 'assignment'.
    pub lesson_type: String,

    #[serde(rename = "order")]
    pub sort_order: i32,

    /// Estimated duration in minutes.
    pub duration: Option<i32>,

    pub content: Option<String>,
    pub video_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A section with its lessons, as returned by the curriculum listing.
#[derive(Debug, Serialize)]
pub struct SectionWithLessons {
    #[serde(flatten)]
    pub section: CourseSection,
    pub lessons: Vec<Lesson>,
}

/// DTO for creating a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// DTO for updating a course. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// DTO for creating a section.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSectionRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(rename = "order", default)]
    pub sort_order: i32,
}

/// DTO for updating a section.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSectionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

/// DTO for creating a lesson.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    pub section_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub lesson_type: String,
    #[serde(rename = "order", default)]
    pub sort_order: i32,
    pub duration: Option<i32>,
    pub content: Option<String>,
    pub video_url: Option<String>,
}

/// DTO for updating a lesson.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub lesson_type: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
    pub duration: Option<i32>,
    pub content: Option<String>,
    pub video_url: Option<String>,
}

/// DTO for reordering children of a parent.
/// The list carries the full desired order; ids that do not belong to the
/// parent are skipped, children omitted from the list keep their order.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<i64>,
}
