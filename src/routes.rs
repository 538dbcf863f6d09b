// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, course, curriculum, enrollment, profile, progress, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, instructor_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, profile, courses, curriculum, quizzes,
///   enrollments, progress).
/// * Course, section, lesson and quiz management additionally requires the
///   'instructor' or 'admin' role.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:4200".parse().unwrap(),
        "http://127.0.0.1:4200".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let require_auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);
    // Layered inside require_auth: the claims extension must exist first.
    let require_instructor = || middleware::from_fn(instructor_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let profile_routes = Router::new()
        .route("/", get(profile::get_me).put(profile::update_profile))
        .route("/password", put(profile::change_password))
        .layer(require_auth());

    let course_routes = Router::new()
        .route("/", get(course::list_courses))
        .route("/{id}", get(course::get_course))
        .route("/{id}/sections", get(curriculum::get_course_sections))
        .route("/{id}/quizzes", get(quiz::get_course_quizzes))
        // Course management: instructors and admins only
        .merge(
            Router::new()
                .route("/", post(course::create_course))
                .route(
                    "/{id}",
                    put(course::update_course).delete(course::delete_course),
                )
                .route("/{id}/sections/reorder", put(curriculum::reorder_sections))
                .route("/{id}/enrollments", get(enrollment::get_course_enrollments))
                .layer(require_instructor())
                .layer(require_auth()),
        );

    let section_routes = Router::new()
        .route("/{id}", get(curriculum::get_section))
        .layer(require_auth())
        .merge(
            Router::new()
                .route("/", post(curriculum::create_section))
                .route(
                    "/{id}",
                    put(curriculum::update_section).delete(curriculum::delete_section),
                )
                .route("/{id}/lessons/reorder", put(curriculum::reorder_lessons))
                .layer(require_instructor())
                .layer(require_auth()),
        );

    let lesson_routes = Router::new()
        .route("/{id}", get(curriculum::get_lesson))
        .layer(require_auth())
        .merge(
            Router::new()
                .route("/", post(curriculum::create_lesson))
                .route(
                    "/{id}",
                    put(curriculum::update_lesson).delete(curriculum::delete_lesson),
                )
                .layer(require_instructor())
                .layer(require_auth()),
        );

    let quiz_routes = Router::new()
        .route("/{id}", get(quiz::get_quiz))
        .route(
            "/{id}/attempts",
            post(quiz::start_attempt).get(quiz::get_user_attempts),
        )
        .route("/{id}/attempts/best", get(quiz::get_best_attempt))
        .layer(require_auth())
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .layer(require_instructor())
                .layer(require_auth()),
        );

    let attempt_routes = Router::new()
        .route("/{id}", get(quiz::get_attempt_details))
        .route("/{id}/submit", post(quiz::submit_attempt))
        .layer(require_auth());

    let enrollment_routes = Router::new()
        .route(
            "/",
            post(enrollment::enroll).get(enrollment::get_user_enrollments),
        )
        .route("/{id}", get(enrollment::get_enrollment))
        .route("/{id}/status", put(enrollment::update_status))
        .route(
            "/{id}/progress",
            get(progress::get_user_progress).post(enrollment::recalculate_progress),
        )
        .route(
            "/{id}/lessons/{lesson_id}/complete",
            post(progress::mark_lesson_complete),
        )
        .route(
            "/{id}/lessons/{lesson_id}/notes",
            put(progress::update_lesson_notes),
        )
        .layer(require_auth());

    let progress_routes = Router::new()
        .route("/stats", get(progress::get_progress_stats))
        .route("/{id}/time", put(progress::track_time_spent))
        .layer(require_auth());

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/sections", section_routes)
        .nest("/api/lessons", lesson_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/enrollments", enrollment_routes)
        .nest("/api/progress", progress_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
