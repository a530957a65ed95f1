//! End-to-end tests against a live router on an ephemeral port

use gym_core::readiness::{connect, Readiness};
use gym_core::store::RecordStore;
use gym_core::{AccountId, HmacTokenProvider, IdentityProvider, MemoryStore, WorkoutLogService};
use gym_server::{build_router, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

struct TestServer {
    base: String,
    client: reqwest::Client,
    identity: Arc<HmacTokenProvider>,
}

impl TestServer {
    async fn spawn(connected: bool) -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let readiness = Readiness::new();
        if connected {
            connect(store.as_ref(), &readiness).unwrap();
        }

        let identity = Arc::new(HmacTokenProvider::new("test-secret", chrono::Duration::hours(1)));
        let state = AppState::new(WorkoutLogService::new(store, readiness), identity.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            identity,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn token(&self, account: &str) -> String {
        self.identity.issue(&AccountId::new(account).unwrap()).unwrap()
    }

    async fn send(&self, method: reqwest::Method, path: &str, account: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self
            .client
            .request(method, self.url(path))
            .bearer_auth(self.token(account));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn start(&self, account: &str, exercises: &[&str]) -> String {
        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/workouts/start",
                account,
                Some(json!({"workoutPlan": {"title": "Test Plan", "exercises": exercises}})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["workoutLogId"].as_str().unwrap().to_string()
    }

    async fn mark(&self, account: &str, log_id: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            reqwest::Method::PATCH,
            &format!("/workouts/exercise/{}", log_id),
            account,
            Some(body),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let server = TestServer::spawn(true).await;
    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["connected"], true);
    assert_eq!(body["database"]["status"], "connected");

    let down = TestServer::spawn(false).await;
    let body: Value = down
        .client
        .get(down.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["database"]["connected"], false);
}

#[tokio::test]
async fn test_plans_are_public() {
    let server = TestServer::spawn(true).await;
    let body: Value = server
        .client
        .get(server.url("/plans"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    assert_eq!(body["plans"][0]["id"], "beginner_full_body");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let server = TestServer::spawn(true).await;
    let resp = server
        .client
        .get(server.url("/workouts/history"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Access token required");
}

#[tokio::test]
async fn test_invalid_token_is_403() {
    let server = TestServer::spawn(true).await;
    let resp = server
        .client
        .get(server.url("/workouts/history"))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_start_then_complete_every_exercise() {
    let server = TestServer::spawn(true).await;
    let log_id = server.start("alice", &["Squats", "Lunges", "Plank"]).await;

    for index in 0..2 {
        let (status, body) = server
            .mark("alice", &log_id, json!({"exerciseIndex": index, "completed": true}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["workoutLog"]["isCompleted"], false);
    }

    // `completed` defaults to true
    let (status, body) = server.mark("alice", &log_id, json!({"exerciseIndex": 2})).await;
    assert_eq!(status, StatusCode::OK);
    let log = &body["workoutLog"];
    assert_eq!(log["completedExercises"], 3);
    assert_eq!(log["totalExercises"], 3);
    assert_eq!(log["isCompleted"], true);
    assert!(log["completedAt"].is_string());
    let finished_at = log["completedAt"].clone();

    // Un-marking reverts the natural completion but keeps its timestamp
    let (_, body) = server
        .mark("alice", &log_id, json!({"exerciseIndex": 1, "completed": false}))
        .await;
    assert_eq!(body["workoutLog"]["completedExercises"], 2);
    assert_eq!(body["workoutLog"]["isCompleted"], false);
    assert_eq!(body["workoutLog"]["completedAt"], finished_at);
    assert!(body["workoutLog"]["exercises"][1]["completedAt"].is_null());
}

#[tokio::test]
async fn test_duration_and_force_complete() {
    let server = TestServer::spawn(true).await;
    let log_id = server.start("alice", &["Burpees", "Jumping Jacks"]).await;

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/workouts/duration/{}", log_id),
            "alice",
            Some(json!({"duration": 95})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workoutLog"]["workoutDuration"], 95);

    let (status, body) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/workouts/complete/{}", log_id),
            "alice",
            Some(json!({"duration": 120})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let log = &body["workoutLog"];
    assert_eq!(log["isCompleted"], true);
    assert_eq!(log["completedExercises"], 0);
    assert_eq!(log["workoutDuration"], 120);
}

#[tokio::test]
async fn test_complete_without_body_uses_zero_duration() {
    let server = TestServer::spawn(true).await;
    let log_id = server.start("alice", &["Plank"]).await;

    let resp = server
        .client
        .patch(server.url(&format!("/workouts/complete/{}", log_id)))
        .bearer_auth(server.token("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["workoutLog"]["isCompleted"], true);
    assert_eq!(body["workoutLog"]["workoutDuration"], 0);
}

#[tokio::test]
async fn test_invalid_exercise_index_is_400() {
    let server = TestServer::spawn(true).await;
    let log_id = server.start("alice", &["Squats", "Lunges"]).await;

    for index in [2, -1, 99] {
        let (status, body) = server
            .mark("alice", &log_id, json!({"exerciseIndex": index, "completed": true}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid exercise index");
    }

    let (_, body) = server
        .send(reqwest::Method::GET, &format!("/workouts/{}", log_id), "alice", None)
        .await;
    assert_eq!(body["workoutLog"]["completedExercises"], 0);
}

#[tokio::test]
async fn test_other_accounts_logs_are_not_found() {
    let server = TestServer::spawn(true).await;
    let log_id = server.start("alice", &["Squats"]).await;

    let (status, body) = server
        .mark("mallory", &log_id, json!({"exerciseIndex": 0}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Workout log not found");

    let (status, _) = server
        .send(reqwest::Method::GET, &format!("/workouts/{}", log_id), "mallory", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .mark("alice", "not-a-uuid", json!({"exerciseIndex": 0}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server
        .send(reqwest::Method::GET, "/workouts/history", "mallory", None)
        .await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_invalid_plan_data_is_400() {
    let server = TestServer::spawn(true).await;
    let bodies = [
        json!({}),
        json!({"workoutPlan": {"title": "No exercises"}}),
        json!({"workoutPlan": {"title": "Empty", "exercises": []}}),
        json!({"workoutPlan": {"title": "Not a list", "exercises": "Squats"}}),
        json!({"workoutPlan": {"exercises": ["Squats"]}}),
        json!({"workoutPlan": {"title": "Blank", "exercises": ["Squats", "  "]}}),
        json!({"workoutPlan": {"title": "Unnamed", "exercises": [""]}}),
    ];

    for body in bodies {
        let (status, reply) = server
            .send(reqwest::Method::POST, "/workouts/start", "alice", Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
        assert_eq!(reply["success"], false);
    }
}

#[tokio::test]
async fn test_history_is_newest_first_and_capped() {
    let server = TestServer::spawn(true).await;
    let mut ids = Vec::new();
    for _ in 0..55 {
        ids.push(server.start("alice", &["Squats"]).await);
    }

    let (status, body) = server
        .send(reqwest::Method::GET, "/workouts/history", "alice", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 50);
    let logs = body["workoutLogs"].as_array().unwrap();
    assert_eq!(logs.len(), 50);
    assert_eq!(logs[0]["id"], ids[54].as_str());
    assert_eq!(logs[49]["id"], ids[5].as_str());
}

#[tokio::test]
async fn test_weekly_progress_counts_today() {
    let server = TestServer::spawn(true).await;
    let log_id = server.start("alice", &["Squats"]).await;
    server.start("alice", &["Lunges"]).await;
    server.mark("alice", &log_id, json!({"exerciseIndex": 0})).await;

    let (status, body) = server
        .send(reqwest::Method::GET, "/workouts/progress", "alice", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let progress = &body["progress"];
    assert_eq!(progress["days"].as_array().unwrap().len(), 7);
    assert_eq!(progress["totalWorkouts"], 2);
    assert_eq!(progress["daysCompleted"], 1);
    assert_eq!(progress["days"][6]["completed"], true);
}

#[tokio::test]
async fn test_unavailable_store_is_503() {
    let server = TestServer::spawn(false).await;
    let resp = server
        .client
        .post(server.url("/workouts/start"))
        .bearer_auth(server.token("alice"))
        .json(&json!({"workoutPlan": {"title": "Plan", "exercises": ["Squats"]}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(resp.headers().contains_key("retry-after"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Database not connected");

    // Readiness is checked before the body is validated
    let (status, _) = server
        .send(reqwest::Method::POST, "/workouts/start", "alice", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let server = TestServer::spawn(true).await;
    let resp = server.client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}
