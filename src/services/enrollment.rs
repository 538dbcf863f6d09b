// src/services/enrollment.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    error::{AppError, is_unique_violation},
    models::enrollment::{ENROLLMENT_STATUSES, Enrollment},
    services::grading::round2,
};

const ENROLLMENT_COLUMNS: &str =
    "id, user_id, course_id, status, progress, enrolled_at, last_accessed_at, completed_at";

/// Course completion as a percentage of lessons completed.
/// Zero lessons means zero percent, not a division error.
pub fn completion_percentage(completed_lessons: i64, total_lessons: i64) -> f64 {
    if total_lessons == 0 {
        return 0.0;
    }
    round2(completed_lessons as f64 / total_lessons as f64 * 100.0)
}

/// Enrollments and the progress aggregation over lesson-completion rows.
#[derive(Clone)]
pub struct EnrollmentService {
    pool: PgPool,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enrolls a user in a course. At most one enrollment per
    /// (user, course); a duplicate is a Conflict, enforced by the unique
    /// constraint so concurrent double-enrolls are caught too.
    pub async fn enroll(&self, user_id: i64, course_id: i64) -> Result<Enrollment, AppError> {
        let course: Option<(i64,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        if course.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) \
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Already enrolled in this course".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        sqlx::query("UPDATE courses SET enrollment_count = enrollment_count + 1 WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(enrollment)
    }

    pub async fn get_enrollment(&self, id: i64) -> Result<Enrollment, AppError> {
        let enrollment = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

        Ok(enrollment)
    }

    /// A user's enrollments, newest first.
    pub async fn get_user_enrollments(&self, user_id: i64) -> Result<Vec<Enrollment>, AppError> {
        let enrollments = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE user_id = $1 ORDER BY enrolled_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    /// Changes an enrollment's status and touches `last_accessed_at`.
    ///
    /// The first transition to 'completed' stamps `completed_at` and forces
    /// `progress` to 100, overriding the lesson-derived value. Completing
    /// an already-completed enrollment leaves both untouched.
    pub async fn update_status(&self, id: i64, status: &str) -> Result<Enrollment, AppError> {
        if !ENROLLMENT_STATUSES.contains(&status) {
            return Err(AppError::BadRequest(format!(
                "Invalid enrollment status '{}'",
                status
            )));
        }

        let mut tx = self.pool.begin().await?;

        let enrollment: Enrollment = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

        let first_completion = status == "completed" && enrollment.completed_at.is_none();

        let updated: Enrollment = if first_completion {
            sqlx::query_as(&format!(
                "UPDATE enrollments \
                 SET status = $2, last_accessed_at = now(), completed_at = now(), progress = 100 \
                 WHERE id = $1 RETURNING {ENROLLMENT_COLUMNS}"
            ))
            .bind(id)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as(&format!(
                "UPDATE enrollments SET status = $2, last_accessed_at = now() \
                 WHERE id = $1 RETURNING {ENROLLMENT_COLUMNS}"
            ))
            .bind(id)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;

        Ok(updated)
    }

    /// Recomputes an enrollment's progress percentage from its
    /// lesson-completion rows and persists it.
    pub async fn recalculate_progress(&self, enrollment_id: i64) -> Result<f64, AppError> {
        let mut tx = self.pool.begin().await?;
        let percentage = recalculate_progress_on(&mut *tx, enrollment_id).await?;
        tx.commit().await?;

        Ok(percentage)
    }

    /// Enrollments of one course, for the instructor's roster view.
    pub async fn get_course_enrollments(&self, course_id: i64) -> Result<Vec<Enrollment>, AppError> {
        let course: Option<(i64,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;
        if course.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let enrollments = sqlx::query_as(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments \
             WHERE course_id = $1 ORDER BY enrolled_at DESC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    pub async fn update_last_accessed(&self, enrollment_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE enrollments SET last_accessed_at = now() WHERE id = $1")
            .bind(enrollment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Enrollment not found".to_string()));
        }

        Ok(())
    }
}

/// Recomputes the progress percentage on the caller's connection, so a
/// completion row and the derived percentage can commit atomically.
///
/// Locks the enrollment row, counts the course's lessons against the
/// completed user_progress rows, and stamps `progress` plus
/// `last_accessed_at`. The cached `progress` column is never trusted; the
/// completion rows are always the source of truth.
pub(crate) async fn recalculate_progress_on(
    conn: &mut PgConnection,
    enrollment_id: i64,
) -> Result<f64, AppError> {
    let enrollment: Enrollment = sqlx::query_as(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1 FOR UPDATE"
    ))
    .bind(enrollment_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Enrollment not found".to_string()))?;

    let total_lessons: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lessons l \
         JOIN course_sections s ON s.id = l.section_id \
         WHERE s.course_id = $1",
    )
    .bind(enrollment.course_id)
    .fetch_one(&mut *conn)
    .await?;

    let completed_lessons: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_progress \
         WHERE enrollment_id = $1 AND completed = TRUE",
    )
    .bind(enrollment_id)
    .fetch_one(&mut *conn)
    .await?;

    let percentage = completion_percentage(completed_lessons, total_lessons);

    sqlx::query("UPDATE enrollments SET progress = $2, last_accessed_at = now() WHERE id = $1")
        .bind(enrollment_id)
        .bind(percentage)
        .execute(&mut *conn)
        .await?;

    Ok(percentage)
}

#[cfg(test)]
mod tests {
    use super::completion_percentage;

    #[test]
    fn two_of_four_lessons_is_exactly_fifty() {
        assert_eq!(completion_percentage(2, 4), 50.0);
    }

    #[test]
    fn zero_lessons_is_zero_percent() {
        assert_eq!(completion_percentage(0, 0), 0.0);
    }

    #[test]
    fn thirds_round_to_two_decimals() {
        assert_eq!(completion_percentage(1, 3), 33.33);
        assert_eq!(completion_percentage(2, 3), 66.67);
    }

    #[test]
    fn all_lessons_complete_is_one_hundred() {
        assert_eq!(completion_percentage(7, 7), 100.0);
    }
}
