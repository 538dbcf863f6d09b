// tests/api_tests.rs

use backend::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345"), or None when no
/// DATABASE_URL is configured (the suite is skipped without Postgres).
async fn spawn_app() -> Option<String> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState { pool, config };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some(address)
}

/// Registers a fresh user with the given role and returns their bearer token.
async fn register_and_login(client: &reqwest::Client, address: &str, role: &str) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "username": username, "password": password, "role": role }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn health_check_404() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/enrollments", address))
        .json(&serde_json::json!({ "course_id": 1 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn quiz_attempt_flow() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "instructor").await;
    let auth = |req: reqwest::RequestBuilder| req.header("Authorization", format!("Bearer {}", token));

    // Course
    let course: serde_json::Value = auth(client.post(format!("{}/api/courses", address)))
        .json(&serde_json::json!({ "title": "Rust for Beginners" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let course_id = course["id"].as_i64().unwrap();

    // Quiz: two questions, 10 points each, passing score 70
    let quiz: serde_json::Value = auth(client.post(format!("{}/api/quizzes", address)))
        .json(&serde_json::json!({
            "course_id": course_id,
            "title": "Ownership quiz",
            "passing_score": 70,
            "questions": [
                {
                    "question": "Which keyword moves a value?",
                    "question_type": "multiple-choice",
                    "order": 0,
                    "points": 10,
                    "options": [
                        { "text": "move", "is_correct": true, "order": 0 },
                        { "text": "copy", "is_correct": false, "order": 1 }
                    ]
                },
                {
                    "question": "References can dangle.",
                    "question_type": "true-false",
                    "order": 1,
                    "points": 10,
                    "options": [
                        { "text": "true", "is_correct": false, "order": 0 },
                        { "text": "false", "is_correct": true, "order": 1 }
                    ]
                }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().unwrap();

    // The student payload must not leak the answer key.
    assert!(quiz["questions"][0]["options"][0].get("is_correct").is_none());

    // Collect option ids by text.
    let option_id = |q: usize, text: &str| -> i64 {
        quiz["questions"][q]["options"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["text"] == text)
            .unwrap()["id"]
            .as_i64()
            .unwrap()
    };

    // Enrollment
    let enrollment: serde_json::Value = auth(client.post(format!("{}/api/enrollments", address)))
        .json(&serde_json::json!({ "course_id": course_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let enrollment_id = enrollment["id"].as_i64().unwrap();

    // Duplicate enrollment is a conflict.
    let dup = auth(client.post(format!("{}/api/enrollments", address)))
        .json(&serde_json::json!({ "course_id": course_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status().as_u16(), 409);

    // First attempt
    let attempt: serde_json::Value =
        auth(client.post(format!("{}/api/quizzes/{}/attempts", address, quiz_id)))
            .json(&serde_json::json!({ "enrollment_id": enrollment_id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    let attempt_id = attempt["id"].as_i64().unwrap();
    assert_eq!(attempt["attempt_number"], 1);
    assert!(attempt["completed_at"].is_null());

    // Q1 right, Q2 wrong -> 10/20 = 50.00, fails at 70
    let graded: serde_json::Value =
        auth(client.post(format!("{}/api/attempts/{}/submit", address, attempt_id)))
            .json(&serde_json::json!({
                "answers": [
                    { "question_id": quiz["questions"][0]["id"], "selected_option_ids": [option_id(0, "move")] },
                    { "question_id": quiz["questions"][1]["id"], "selected_option_ids": [option_id(1, "true")] }
                ]
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

    assert_eq!(graded["score"], 10);
    assert_eq!(graded["total_points"], 20);
    assert_eq!(graded["percentage"], 50.0);
    assert_eq!(graded["passed"], false);
    assert!(!graded["completed_at"].is_null());

    // Second submission of the same attempt is rejected.
    let resubmit = auth(client.post(format!("{}/api/attempts/{}/submit", address, attempt_id)))
        .json(&serde_json::json!({ "answers": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resubmit.status().as_u16(), 409);

    // Second attempt, all correct.
    let attempt2: serde_json::Value =
        auth(client.post(format!("{}/api/quizzes/{}/attempts", address, quiz_id)))
            .json(&serde_json::json!({ "enrollment_id": enrollment_id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(attempt2["attempt_number"], 2);

    let graded2: serde_json::Value = auth(client.post(format!(
        "{}/api/attempts/{}/submit",
        address,
        attempt2["id"].as_i64().unwrap()
    )))
    .json(&serde_json::json!({
        "answers": [
            { "question_id": quiz["questions"][0]["id"], "selected_option_ids": [option_id(0, "move")] },
            { "question_id": quiz["questions"][1]["id"], "selected_option_ids": [option_id(1, "false")] }
        ]
    }))
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(graded2["percentage"], 100.0);
    assert_eq!(graded2["passed"], true);

    // Best attempt is the 100% one.
    let best: serde_json::Value = auth(client.get(format!(
        "{}/api/quizzes/{}/attempts/best",
        address, quiz_id
    )))
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(best["percentage"], 100.0);
    assert_eq!(best["attempt_number"], 2);

    // History is most recent first.
    let history: serde_json::Value =
        auth(client.get(format!("{}/api/quizzes/{}/attempts", address, quiz_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(history[0]["attempt_number"], 2);
    assert_eq!(history[1]["attempt_number"], 1);
}

#[tokio::test]
async fn progress_flow() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "instructor").await;
    let auth = |req: reqwest::RequestBuilder| req.header("Authorization", format!("Bearer {}", token));

    let course: serde_json::Value = auth(client.post(format!("{}/api/courses", address)))
        .json(&serde_json::json!({ "title": "Progress course" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let course_id = course["id"].as_i64().unwrap();

    let section: serde_json::Value = auth(client.post(format!("{}/api/sections", address)))
        .json(&serde_json::json!({ "course_id": course_id, "title": "Basics", "order": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let section_id = section["id"].as_i64().unwrap();

    let mut lesson_ids = Vec::new();
    for i in 0..4 {
        let lesson: serde_json::Value = auth(client.post(format!("{}/api/lessons", address)))
            .json(&serde_json::json!({
                "section_id": section_id,
                "title": format!("Lesson {}", i),
                "lesson_type": "text",
                "order": i
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        lesson_ids.push(lesson["id"].as_i64().unwrap());
    }

    let enrollment: serde_json::Value = auth(client.post(format!("{}/api/enrollments", address)))
        .json(&serde_json::json!({ "course_id": course_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let enrollment_id = enrollment["id"].as_i64().unwrap();
    assert_eq!(enrollment["progress"], 0.0);

    // Complete 2 of 4 lessons -> exactly 50
    for lesson_id in &lesson_ids[..2] {
        let response = auth(client.post(format!(
            "{}/api/enrollments/{}/lessons/{}/complete",
            address, enrollment_id, lesson_id
        )))
        .send()
        .await
        .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let updated: serde_json::Value =
        auth(client.get(format!("{}/api/enrollments/{}", address, enrollment_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(updated["progress"], 50.0);
    assert!(!updated["last_accessed_at"].is_null());

    // Re-completing a lesson is idempotent.
    auth(client.post(format!(
        "{}/api/enrollments/{}/lessons/{}/complete",
        address, enrollment_id, lesson_ids[0]
    )))
    .send()
    .await
    .unwrap();

    let recheck: serde_json::Value =
        auth(client.get(format!("{}/api/enrollments/{}", address, enrollment_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    assert_eq!(recheck["progress"], 50.0);

    // Manual completion forces progress to 100 and stamps completed_at.
    let completed: serde_json::Value = auth(client.put(format!(
        "{}/api/enrollments/{}/status",
        address, enrollment_id
    )))
    .json(&serde_json::json!({ "status": "completed" }))
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(completed["progress"], 100.0);
    let completed_at = completed["completed_at"].clone();
    assert!(!completed_at.is_null());

    // Completing again leaves completed_at unchanged.
    let again: serde_json::Value = auth(client.put(format!(
        "{}/api/enrollments/{}/status",
        address, enrollment_id
    )))
    .json(&serde_json::json!({ "status": "completed" }))
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(again["completed_at"], completed_at);

    // Invalid status is rejected.
    let invalid = auth(client.put(format!(
        "{}/api/enrollments/{}/status",
        address, enrollment_id
    )))
    .json(&serde_json::json!({ "status": "paused" }))
    .send()
    .await
    .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);
}

#[tokio::test]
async fn lesson_reorder_flow() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "instructor").await;
    let auth = |req: reqwest::RequestBuilder| req.header("Authorization", format!("Bearer {}", token));

    let course: serde_json::Value = auth(client.post(format!("{}/api/courses", address)))
        .json(&serde_json::json!({ "title": "Reorder course" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let section: serde_json::Value = auth(client.post(format!("{}/api/sections", address)))
        .json(&serde_json::json!({ "course_id": course["id"], "title": "S", "order": 0 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let section_id = section["id"].as_i64().unwrap();

    let mut lesson_ids = Vec::new();
    for i in 0..3 {
        let lesson: serde_json::Value = auth(client.post(format!("{}/api/lessons", address)))
            .json(&serde_json::json!({
                "section_id": section_id,
                "title": format!("L{}", i),
                "lesson_type": "text",
                "order": i
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        lesson_ids.push(lesson["id"].as_i64().unwrap());
    }

    // [l3, l1, l2] with an unknown id mixed in (silently skipped)
    let response = auth(client.put(format!(
        "{}/api/sections/{}/lessons/reorder",
        address, section_id
    )))
    .json(&serde_json::json!({
        "ordered_ids": [lesson_ids[2], lesson_ids[0], lesson_ids[1], 999999]
    }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let listed: serde_json::Value =
        auth(client.get(format!("{}/api/sections/{}", address, section_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

    let listed_ids: Vec<i64> = listed["lessons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert_eq!(
        listed_ids,
        vec![lesson_ids[2], lesson_ids[0], lesson_ids[1]]
    );
}

#[tokio::test]
async fn course_management_requires_instructor_role() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let student = register_and_login(&client, &address, "student").await;
    let as_student =
        |req: reqwest::RequestBuilder| req.header("Authorization", format!("Bearer {}", student));

    // Students can browse but not manage.
    let response = as_student(client.post(format!("{}/api/courses", address)))
        .json(&serde_json::json!({ "title": "Not allowed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = as_student(client.post(format!("{}/api/quizzes", address)))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = as_student(client.post(format!("{}/api/lessons", address)))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // The same routes accept an instructor.
    let instructor = register_and_login(&client, &address, "instructor").await;
    let course: serde_json::Value = client
        .post(format!("{}/api/courses", address))
        .header("Authorization", format!("Bearer {}", instructor))
        .json(&serde_json::json!({ "title": "Allowed" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(course["id"].as_i64().is_some());
}

#[tokio::test]
async fn best_attempt_keeps_earliest_attempt_on_tie() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "instructor").await;
    let auth = |req: reqwest::RequestBuilder| req.header("Authorization", format!("Bearer {}", token));

    let course: serde_json::Value = auth(client.post(format!("{}/api/courses", address)))
        .json(&serde_json::json!({ "title": "Tie-break course" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let quiz: serde_json::Value = auth(client.post(format!("{}/api/quizzes", address)))
        .json(&serde_json::json!({
            "course_id": course["id"],
            "title": "Single question",
            "passing_score": 70,
            "questions": [
                {
                    "question": "Is shadowing allowed?",
                    "question_type": "true-false",
                    "order": 0,
                    "points": 10,
                    "options": [
                        { "text": "yes", "is_correct": true, "order": 0 },
                        { "text": "no", "is_correct": false, "order": 1 }
                    ]
                }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().unwrap();
    let correct_id = quiz["questions"][0]["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["text"] == "yes")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let enrollment: serde_json::Value = auth(client.post(format!("{}/api/enrollments", address)))
        .json(&serde_json::json!({ "course_id": course["id"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Two attempts, both perfect scores.
    for expected_number in 1..=2 {
        let attempt: serde_json::Value =
            auth(client.post(format!("{}/api/quizzes/{}/attempts", address, quiz_id)))
                .json(&serde_json::json!({ "enrollment_id": enrollment["id"] }))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        assert_eq!(attempt["attempt_number"], expected_number);

        let graded: serde_json::Value = auth(client.post(format!(
            "{}/api/attempts/{}/submit",
            address,
            attempt["id"].as_i64().unwrap()
        )))
        .json(&serde_json::json!({
            "answers": [
                { "question_id": quiz["questions"][0]["id"], "selected_option_ids": [correct_id] }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
        assert_eq!(graded["percentage"], 100.0);
    }

    // Equal percentages: the earlier attempt wins.
    let best: serde_json::Value = auth(client.get(format!(
        "{}/api/quizzes/{}/attempts/best",
        address, quiz_id
    )))
    .send()
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(best["percentage"], 100.0);
    assert_eq!(best["attempt_number"], 1);
}

#[tokio::test]
async fn profile_flow() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();
    let auth = |req: reqwest::RequestBuilder| req.header("Authorization", format!("Bearer {}", token));

    // Fresh profile: default role, no learning activity yet.
    let me: serde_json::Value = auth(client.get(format!("{}/api/profile", address)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["username"], username.as_str());
    assert_eq!(me["role"], "student");
    assert_eq!(me["total_enrollments"], 0);
    assert_eq!(me["completed_lessons"], 0);

    // Rename.
    let renamed = format!("{}_renamed", &username[..8]);
    let updated: serde_json::Value = auth(client.put(format!("{}/api/profile", address)))
        .json(&serde_json::json!({ "username": renamed }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["username"], renamed.as_str());

    // Wrong current password is rejected.
    let response = auth(client.put(format!("{}/api/profile/password", address)))
        .json(&serde_json::json!({
            "current_password": "not-the-password",
            "new_password": "password456"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Real change works and the old password stops working.
    let response = auth(client.put(format!("{}/api/profile/password", address)))
        .json(&serde_json::json!({
            "current_password": password,
            "new_password": "password456"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let stale = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": renamed, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status().as_u16(), 401);

    let fresh = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": renamed, "password": "password456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(fresh.status().as_u16(), 200);
}

#[tokio::test]
async fn instructor_views_course_roster() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let instructor = register_and_login(&client, &address, "instructor").await;
    let student = register_and_login(&client, &address, "student").await;

    let course: serde_json::Value = client
        .post(format!("{}/api/courses", address))
        .header("Authorization", format!("Bearer {}", instructor))
        .json(&serde_json::json!({ "title": "Roster course" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let course_id = course["id"].as_i64().unwrap();

    let enrollment: serde_json::Value = client
        .post(format!("{}/api/enrollments", address))
        .header("Authorization", format!("Bearer {}", student))
        .json(&serde_json::json!({ "course_id": course_id }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let roster: serde_json::Value = client
        .get(format!("{}/api/courses/{}/enrollments", address, course_id))
        .header("Authorization", format!("Bearer {}", instructor))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let roster = roster.as_array().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["id"], enrollment["id"]);
    assert_eq!(roster[0]["user_id"], enrollment["user_id"]);

    // The roster is management-only.
    let response = client
        .get(format!("{}/api/courses/{}/enrollments", address, course_id))
        .header("Authorization", format!("Bearer {}", student))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
