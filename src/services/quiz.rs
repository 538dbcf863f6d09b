// src/services/quiz.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        attempt::{AttemptDetail, QuizAttempt, SubmittedAnswer, UserAnswer},
        quiz::{
            CreateQuizRequest, PublicQuestion, QuestionWithOptions, Quiz, QuizDetail, QuizOption,
            QuizQuestion,
        },
    },
    services::grading::grade_submission,
};

const ATTEMPT_COLUMNS: &str = "id, user_id, enrollment_id, quiz_id, attempt_number, score, \
     total_points, percentage, passed, started_at, completed_at";

const QUIZ_COLUMNS: &str =
    "id, course_id, lesson_id, title, description, passing_score, time_limit, created_at, updated_at";

/// Quiz definitions and the attempt lifecycle: start, submit (grade),
/// history, best attempt, detail queries.
#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a quiz together with its questions and options, in one
    /// transaction. Returns the student view of the created quiz.
    pub async fn create_quiz(&self, data: CreateQuizRequest) -> Result<QuizDetail, AppError> {
        let course: Option<(i64,)> = sqlx::query_as("SELECT id FROM courses WHERE id = $1")
            .bind(data.course_id)
            .fetch_optional(&self.pool)
            .await?;
        if course.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let quiz: Quiz = sqlx::query_as(
            "INSERT INTO quizzes (course_id, lesson_id, title, description, passing_score, time_limit) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, course_id, lesson_id, title, description, passing_score, time_limit, created_at, updated_at",
        )
        .bind(data.course_id)
        .bind(data.lesson_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.passing_score.unwrap_or(70))
        .bind(data.time_limit)
        .fetch_one(&mut *tx)
        .await?;

        for question in &data.questions {
            let (question_id,): (i64,) = sqlx::query_as(
                "INSERT INTO quiz_questions (quiz_id, question, question_type, sort_order, points, explanation) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
            )
            .bind(quiz.id)
            .bind(&question.question)
            .bind(&question.question_type)
            .bind(question.sort_order)
            .bind(question.points)
            .bind(&question.explanation)
            .fetch_one(&mut *tx)
            .await?;

            for option in &question.options {
                sqlx::query(
                    "INSERT INTO quiz_options (question_id, text, is_correct, sort_order) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(question_id)
                .bind(&option.text)
                .bind(option.is_correct)
                .bind(option.sort_order)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_quiz(quiz.id).await
    }

    /// Fetches a quiz with questions and options ordered by their `order`
    /// fields. The answer key (`is_correct`) is stripped from the payload.
    pub async fn get_quiz(&self, id: i64) -> Result<QuizDetail, AppError> {
        let quiz: Quiz = sqlx::query_as(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

        let mut conn = self.pool.acquire().await?;
        let questions = load_questions(&mut *conn, id).await?;

        let questions = questions
            .into_iter()
            .map(|entry| PublicQuestion {
                question: entry.question,
                options: entry.options.into_iter().map(Into::into).collect(),
            })
            .collect();

        Ok(QuizDetail { quiz, questions })
    }

    /// Lists a course's quizzes, oldest first.
    pub async fn get_course_quizzes(&self, course_id: i64) -> Result<Vec<Quiz>, AppError> {
        let quizzes = sqlx::query_as(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE course_id = $1 ORDER BY created_at ASC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    /// Starts a new attempt for (user, quiz).
    ///
    /// The attempt number is computed by counting existing attempts. The
    /// unique index on (user_id, quiz_id, attempt_number) catches two
    /// concurrent starts computing the same number; on that conflict the
    /// count-and-insert is retried once.
    pub async fn start_attempt(
        &self,
        user_id: i64,
        enrollment_id: i64,
        quiz_id: i64,
    ) -> Result<QuizAttempt, AppError> {
        let quiz: Option<(i64,)> = sqlx::query_as("SELECT id FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?;
        if quiz.is_none() {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }

        let mut last_err = None;
        for _ in 0..2 {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2",
            )
            .bind(user_id)
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;

            let inserted = sqlx::query_as::<_, QuizAttempt>(&format!(
                "INSERT INTO quiz_attempts (user_id, enrollment_id, quiz_id, attempt_number) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING {ATTEMPT_COLUMNS}"
            ))
            .bind(user_id)
            .bind(enrollment_id)
            .bind(quiz_id)
            .bind((count + 1) as i32)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(attempt) => return Ok(attempt),
                Err(e) if is_unique_violation(&e) => last_err = Some(e),
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_err
            .map(AppError::from)
            .unwrap_or_else(|| AppError::InternalServerError("attempt insert failed".to_string())))
    }

    /// Grades a submission and completes the attempt.
    ///
    /// Runs in one transaction: the attempt row is locked, answers are
    /// written, and the attempt is marked completed together. A failure
    /// anywhere rolls the whole submission back, leaving the attempt
    /// in-progress. Submitting a completed attempt is a Conflict.
    pub async fn submit_attempt(
        &self,
        attempt_id: i64,
        answers: &[SubmittedAnswer],
    ) -> Result<QuizAttempt, AppError> {
        let mut tx = self.pool.begin().await?;

        let attempt: QuizAttempt = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 FOR UPDATE"
        ))
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Quiz attempt not found".to_string()))?;

        if attempt.completed_at.is_some() {
            return Err(AppError::Conflict(
                "Quiz attempt already submitted".to_string(),
            ));
        }

        let quiz: Quiz = sqlx::query_as(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(attempt.quiz_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

        let questions = load_questions(&mut *tx, quiz.id).await?;

        let outcome = grade_submission(&questions, answers, quiz.passing_score);

        for graded in &outcome.answers {
            sqlx::query(
                "INSERT INTO user_answers (attempt_id, question_id, selected_option_ids, is_correct, points_earned) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(attempt_id)
            .bind(graded.question_id)
            .bind(sqlx::types::Json(&graded.selected_option_ids))
            .bind(graded.is_correct)
            .bind(graded.points_earned)
            .execute(&mut *tx)
            .await?;
        }

        let updated: QuizAttempt = sqlx::query_as(&format!(
            "UPDATE quiz_attempts \
             SET score = $2, total_points = $3, percentage = $4, passed = $5, completed_at = now() \
             WHERE id = $1 \
             RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(attempt_id)
        .bind(outcome.score)
        .bind(outcome.total_points)
        .bind(outcome.percentage)
        .bind(outcome.passed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// A user's attempts for one quiz, most recent first.
    pub async fn get_user_attempts(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> Result<Vec<QuizAttempt>, AppError> {
        let attempts = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts \
             WHERE user_id = $1 AND quiz_id = $2 \
             ORDER BY attempt_number DESC"
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    /// The attempt with the highest percentage; ties go to the earliest
    /// attempt number. None when the user has no attempts for the quiz.
    pub async fn get_best_attempt(
        &self,
        user_id: i64,
        quiz_id: i64,
    ) -> Result<Option<QuizAttempt>, AppError> {
        let attempt = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts \
             WHERE user_id = $1 AND quiz_id = $2 \
             ORDER BY percentage DESC, attempt_number ASC \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    /// Full attempt detail with answers and question/option definitions,
    /// answer keys included (for result review screens).
    pub async fn get_attempt_details(&self, attempt_id: i64) -> Result<AttemptDetail, AppError> {
        let attempt: QuizAttempt = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1"
        ))
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Quiz attempt not found".to_string()))?;

        let answers: Vec<UserAnswer> = sqlx::query_as(
            "SELECT id, attempt_id, question_id, selected_option_ids, is_correct, points_earned, created_at \
             FROM user_answers WHERE attempt_id = $1 ORDER BY id ASC",
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let questions = load_questions(&mut *conn, attempt.quiz_id).await?;

        Ok(AttemptDetail {
            attempt,
            answers,
            questions,
        })
    }
}

/// Loads a quiz's questions with their options, both ordered ascending by
/// `sort_order`.
async fn load_questions(
    conn: &mut PgConnection,
    quiz_id: i64,
) -> Result<Vec<QuestionWithOptions>, AppError> {
    let questions: Vec<QuizQuestion> = sqlx::query_as(
        "SELECT id, quiz_id, question, question_type, sort_order, points, explanation \
         FROM quiz_questions WHERE quiz_id = $1 ORDER BY sort_order ASC",
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let options: Vec<QuizOption> = sqlx::query_as(
        "SELECT o.id, o.question_id, o.text, o.is_correct, o.sort_order \
         FROM quiz_options o \
         JOIN quiz_questions q ON q.id = o.question_id \
         WHERE q.quiz_id = $1 \
         ORDER BY o.sort_order ASC",
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(questions
        .into_iter()
        .map(|question| {
            let options = options
                .iter()
                .filter(|o| o.question_id == question.id)
                .cloned()
                .collect();
            QuestionWithOptions { question, options }
        })
        .collect())
}
