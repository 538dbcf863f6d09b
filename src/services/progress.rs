// src/services/progress.rs

use sqlx::PgPool;

use crate::{
    error::AppError,
    models::progress::{ProgressStats, UserProgress},
    services::enrollment::{EnrollmentService, recalculate_progress_on},
};

const PROGRESS_COLUMNS: &str =
    "id, user_id, enrollment_id, lesson_id, completed, time_spent, notes, completed_at, created_at";

/// Per-lesson progress records: completion, time tracking, notes.
/// Completion events trigger the enrollment progress recalculation.
#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
    enrollments: EnrollmentService,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        let enrollments = EnrollmentService::new(pool.clone());
        Self { pool, enrollments }
    }

    /// All progress rows for one enrollment, oldest first.
    pub async fn get_user_progress(
        &self,
        enrollment_id: i64,
    ) -> Result<Vec<UserProgress>, AppError> {
        self.enrollments.get_enrollment(enrollment_id).await?;

        let progress = sqlx::query_as(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress \
             WHERE enrollment_id = $1 ORDER BY created_at ASC"
        ))
        .bind(enrollment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(progress)
    }

    /// Marks a lesson complete for a user, creating the progress row on
    /// first contact. Idempotent: re-completing changes nothing but still
    /// re-triggers the enrollment recalculation.
    ///
    /// The completion row and the recalculated enrollment percentage commit
    /// in one transaction; neither is visible without the other.
    pub async fn mark_lesson_complete(
        &self,
        user_id: i64,
        enrollment_id: i64,
        lesson_id: i64,
    ) -> Result<UserProgress, AppError> {
        let mut tx = self.pool.begin().await?;

        let enrollment: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM enrollments WHERE id = $1 FOR UPDATE")
                .bind(enrollment_id)
                .fetch_optional(&mut *tx)
                .await?;
        if enrollment.is_none() {
            return Err(AppError::NotFound("Enrollment not found".to_string()));
        }

        let lesson: Option<(i64,)> = sqlx::query_as("SELECT id FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .fetch_optional(&mut *tx)
            .await?;
        if lesson.is_none() {
            return Err(AppError::NotFound("Lesson not found".to_string()));
        }

        let progress = sqlx::query_as::<_, UserProgress>(&format!(
            "INSERT INTO user_progress (user_id, enrollment_id, lesson_id, completed, completed_at) \
             VALUES ($1, $2, $3, TRUE, now()) \
             ON CONFLICT (user_id, lesson_id) \
             DO UPDATE SET completed = TRUE, completed_at = now() \
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(enrollment_id)
        .bind(lesson_id)
        .fetch_one(&mut *tx)
        .await?;

        // Derived enrollment percentage follows the completion rows.
        recalculate_progress_on(&mut *tx, enrollment_id).await?;

        tx.commit().await?;

        Ok(progress)
    }

    /// Adds minutes to a progress record's accumulator.
    pub async fn track_time_spent(
        &self,
        progress_id: i64,
        minutes: i64,
    ) -> Result<UserProgress, AppError> {
        if minutes < 0 {
            return Err(AppError::BadRequest(
                "Time spent must be non-negative".to_string(),
            ));
        }

        let progress = sqlx::query_as::<_, UserProgress>(&format!(
            "UPDATE user_progress SET time_spent = time_spent + $2 \
             WHERE id = $1 RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(progress_id)
        .bind(minutes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Progress record not found".to_string()))?;

        self.enrollments
            .update_last_accessed(progress.enrollment_id)
            .await?;

        Ok(progress)
    }

    /// Sets free-text notes on a lesson's progress row, creating it (not
    /// completed) when the user has no row for the lesson yet.
    pub async fn update_lesson_notes(
        &self,
        user_id: i64,
        enrollment_id: i64,
        lesson_id: i64,
        notes: &str,
    ) -> Result<UserProgress, AppError> {
        self.enrollments.get_enrollment(enrollment_id).await?;

        let lesson: Option<(i64,)> = sqlx::query_as("SELECT id FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .fetch_optional(&self.pool)
            .await?;
        if lesson.is_none() {
            return Err(AppError::NotFound("Lesson not found".to_string()));
        }

        let progress = sqlx::query_as::<_, UserProgress>(&format!(
            "INSERT INTO user_progress (user_id, enrollment_id, lesson_id, completed, notes) \
             VALUES ($1, $2, $3, FALSE, $4) \
             ON CONFLICT (user_id, lesson_id) \
             DO UPDATE SET notes = EXCLUDED.notes \
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(enrollment_id)
        .bind(lesson_id)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        self.enrollments.update_last_accessed(enrollment_id).await?;

        Ok(progress)
    }

    /// Aggregated learning stats across all of a user's enrollments.
    pub async fn get_progress_stats(&self, user_id: i64) -> Result<ProgressStats, AppError> {
        let (total_enrollments, active_enrollments, completed_enrollments): (i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE status = 'active'), \
                        COUNT(*) FILTER (WHERE status = 'completed') \
                 FROM enrollments WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let (completed_lessons, total_time_spent): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE completed), COALESCE(SUM(time_spent), 0)::BIGINT \
             FROM user_progress WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProgressStats {
            total_enrollments,
            active_enrollments,
            completed_enrollments,
            completed_lessons,
            total_time_spent,
        })
    }
}
