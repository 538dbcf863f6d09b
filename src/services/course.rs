// src/services/course.rs

use sqlx::PgPool;

use crate::{
    error::AppError,
    models::course::{Course, CreateCourseRequest, UpdateCourseRequest},
};

const COURSE_COLUMNS: &str =
    "id, instructor_id, title, description, enrollment_count, created_at, updated_at";

/// Course catalog CRUD.
#[derive(Clone)]
pub struct CourseService {
    pool: PgPool,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    pub async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        let course = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

        Ok(course)
    }

    pub async fn create_course(
        &self,
        instructor_id: i64,
        data: CreateCourseRequest,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as(&format!(
            "INSERT INTO courses (instructor_id, title, description) \
             VALUES ($1, $2, $3) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(instructor_id)
        .bind(&data.title)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn update_course(
        &self,
        id: i64,
        data: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as(&format!(
            "UPDATE courses SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                updated_at = now() \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Course not found".to_string()))?;

        Ok(course)
    }

    /// Deleting a course cascades through sections, lessons, quizzes,
    /// questions, options, enrollments and their dependent rows.
    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        Ok(())
    }
}
