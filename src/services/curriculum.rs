// src/services/curriculum.rs

use sqlx::PgPool;

use crate::{
    error::AppError,
    models::course::{
        CourseSection, CreateLessonRequest, CreateSectionRequest, Lesson, SectionWithLessons,
        UpdateLessonRequest, UpdateSectionRequest,
    },
    services::ordering::reorder_assignments,
};

const SECTION_COLUMNS: &str = "id, course_id, title, description, sort_order, created_at";

const LESSON_COLUMNS: &str = "id, section_id, title, description, lesson_type, sort_order, \
     duration, content, video_url, created_at";

/// Sections and lessons: CRUD, ordered listing and reordering.
#[derive(Clone)]
pub struct CurriculumService {
    pool: PgPool,
}

impl CurriculumService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A course's sections with their lessons, every level ordered
    /// ascending by `sort_order`.
    pub async fn get_course_sections(
        &self,
        course_id: i64,
    ) -> Result<Vec<SectionWithLessons>, AppError> {
        let sections: Vec<CourseSection> = sqlx::query_as(&format!(
            "SELECT {SECTION_COLUMNS} FROM course_sections \
             WHERE course_id = $1 ORDER BY sort_order ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let lessons: Vec<Lesson> = sqlx::query_as(&format!(
            "SELECT l.id, l.section_id, l.title, l.description, l.lesson_type, l.sort_order, \
                    l.duration, l.content, l.video_url, l.created_at \
             FROM lessons l \
             JOIN course_sections s ON s.id = l.section_id \
             WHERE s.course_id = $1 \
             ORDER BY l.sort_order ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sections
            .into_iter()
            .map(|section| {
                let lessons = lessons
                    .iter()
                    .filter(|l| l.section_id == section.id)
                    .cloned()
                    .collect();
                SectionWithLessons { section, lessons }
            })
            .collect())
    }

    pub async fn get_section(&self, id: i64) -> Result<SectionWithLessons, AppError> {
        let section: CourseSection = sqlx::query_as(&format!(
            "SELECT {SECTION_COLUMNS} FROM course_sections WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Section not found".to_string()))?;

        let lessons = sqlx::query_as(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE section_id = $1 ORDER BY sort_order ASC"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SectionWithLessons { section, lessons })
    }

    pub async fn create_section(
        &self,
        data: CreateSectionRequest,
    ) -> Result<CourseSection, AppError> {
        let course: Option<(i64,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(data.course_id)
            .fetch_optional(&self.pool)
            .await?;
        if course.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let section = sqlx::query_as(&format!(
            "INSERT INTO course_sections (course_id, title, description, sort_order) \
             VALUES ($1, $2, $3, $4) RETURNING {SECTION_COLUMNS}"
        ))
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.sort_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(section)
    }

    pub async fn update_section(
        &self,
        id: i64,
        data: UpdateSectionRequest,
    ) -> Result<CourseSection, AppError> {
        let section = sqlx::query_as(&format!(
            "UPDATE course_sections SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                sort_order = COALESCE($4, sort_order) \
             WHERE id = $1 RETURNING {SECTION_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.sort_order)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Section not found".to_string()))?;

        Ok(section)
    }

    /// Deleting a section cascades to its lessons via the foreign key.
    pub async fn delete_section(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM course_sections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Section not found".to_string()));
        }

        Ok(())
    }

    /// Reassigns section order within a course from the given id list.
    /// Ids not belonging to the course are skipped; omitted sections keep
    /// their order.
    pub async fn reorder_sections(
        &self,
        course_id: i64,
        ordered_ids: &[i64],
    ) -> Result<(), AppError> {
        let existing: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM course_sections WHERE course_id = $1")
                .bind(course_id)
                .fetch_all(&self.pool)
                .await?;

        let mut tx = self.pool.begin().await?;
        for (id, sort_order) in reorder_assignments(&existing, ordered_ids) {
            sqlx::query("UPDATE course_sections SET sort_order = $2 WHERE id = $1")
                .bind(id)
                .bind(sort_order)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    pub async fn get_lesson(&self, id: i64) -> Result<Lesson, AppError> {
        let lesson = sqlx::query_as(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Lesson not found".to_string()))?;

        Ok(lesson)
    }

    pub async fn create_lesson(&self, data: CreateLessonRequest) -> Result<Lesson, AppError> {
        let section: Option<(i64,)> = sqlx::query_as("SELECT id FROM course_sections WHERE id = $1")
            .bind(data.section_id)
            .fetch_optional(&self.pool)
            .await?;
        if section.is_none() {
            return Err(AppError::NotFound("Section not found".to_string()));
        }

        let lesson = sqlx::query_as(&format!(
            "INSERT INTO lessons (section_id, title, description, lesson_type, sort_order, duration, content, video_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {LESSON_COLUMNS}"
        ))
        .bind(data.section_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.lesson_type)
        .bind(data.sort_order)
        .bind(data.duration)
        .bind(&data.content)
        .bind(&data.video_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn update_lesson(
        &self,
        id: i64,
        data: UpdateLessonRequest,
    ) -> Result<Lesson, AppError> {
        let lesson = sqlx::query_as(&format!(
            "UPDATE lessons SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                lesson_type = COALESCE($4, lesson_type), \
                sort_order = COALESCE($5, sort_order), \
                duration = COALESCE($6, duration), \
                content = COALESCE($7, content), \
                video_url = COALESCE($8, video_url) \
             WHERE id = $1 RETURNING {LESSON_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.lesson_type)
        .bind(data.sort_order)
        .bind(data.duration)
        .bind(&data.content)
        .bind(&data.video_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Lesson not found".to_string()))?;

        Ok(lesson)
    }

    pub async fn delete_lesson(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lesson not found".to_string()));
        }

        Ok(())
    }

    /// Reassigns lesson order within a section from the given id list.
    pub async fn reorder_lessons(
        &self,
        section_id: i64,
        ordered_ids: &[i64],
    ) -> Result<(), AppError> {
        let existing: Vec<i64> = sqlx::query_scalar("SELECT id FROM lessons WHERE section_id = $1")
            .bind(section_id)
            .fetch_all(&self.pool)
            .await?;

        let mut tx = self.pool.begin().await?;
        for (id, sort_order) in reorder_assignments(&existing, ordered_ids) {
            sqlx::query("UPDATE lessons SET sort_order = $2 WHERE id = $1")
                .bind(id)
                .bind(sort_order)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }
}
