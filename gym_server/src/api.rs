//! Route handlers for the workout log API.
//!
//! Handlers parse and authenticate, then hand the blocking service call to
//! tokio's blocking pool. Store readiness is checked before the body is
//! parsed so an unavailable store reports 503 regardless of input.

use crate::auth::Authenticated;
use crate::response::ApiResult;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gym_core::{
    default_catalog, Error, WeeklyProgress, WorkoutLog, WorkoutLogService,
    WorkoutPlan, WorkoutPlanSnapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub workout_plan: Option<PlanPayload>,
}

#[derive(Debug, Deserialize)]
pub struct PlanPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<String>,
    pub color: Option<String>,
    pub exercises: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRequest {
    pub exercise_index: Option<i64>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DurationRequest {
    pub duration: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    pub duration: Option<u64>,
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    success: bool,
    message: &'static str,
    workout_log_id: Uuid,
    workout_log: WorkoutLog,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResponse {
    success: bool,
    message: &'static str,
    workout_log: WorkoutLog,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    success: bool,
    count: usize,
    workout_logs: Vec<WorkoutLog>,
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    success: bool,
    count: usize,
    plans: &'static [WorkoutPlan],
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    success: bool,
    progress: WeeklyProgress,
}

impl LogResponse {
    fn new(message: &'static str, workout_log: WorkoutLog) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            workout_log,
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ensure_ready(state: &AppState) -> ApiResult<()> {
    if state.service.readiness().is_ready() {
        Ok(())
    } else {
        Err(Error::Unavailable("record store is not connected".into()).into())
    }
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        Error::Validation(format!("Invalid request body: {}", rejection.body_text())).into()
    })
}

/// Ids that are not UUIDs cannot name any log
fn parse_log_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::NotFound.into())
}

/// Run a service call on the blocking pool
async fn call<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&WorkoutLogService) -> gym_core::Result<T> + Send + 'static,
{
    let service: Arc<WorkoutLogService> = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || f(service.as_ref()))
        .await
        .map_err(|e| Error::Internal(format!("service task failed: {}", e)))?;
    Ok(outcome?)
}

// ============================================================================
// Public routes
// ============================================================================

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Gymlog workout log API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness plus store connectivity; always 200
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let readiness = state.service.readiness();
    Json(json!({
        "success": true,
        "status": "ok",
        "timestamp": Utc::now(),
        "database": {
            "connected": readiness.is_ready(),
            "status": readiness.status(),
        },
    }))
}

pub async fn list_plans() -> Json<PlansResponse> {
    let plans = &default_catalog().plans;
    Json(PlansResponse {
        success: true,
        count: plans.len(),
        plans,
    })
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"success": false, "message": "Route not found"})),
    )
}

// ============================================================================
// Workout routes
// ============================================================================

pub async fn start_session(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StartResponse>)> {
    ensure_ready(&state)?;
    let body = parse_body(payload)?;

    let plan = body
        .workout_plan
        .ok_or_else(|| Error::Validation("Invalid workout plan data: workoutPlan is required".into()))?;
    let exercises = plan
        .exercises
        .ok_or_else(|| Error::Validation("Invalid workout plan data: exercises are required".into()))?;
    let snapshot = WorkoutPlanSnapshot {
        title: plan.title.unwrap_or_default(),
        description: plan.description,
        difficulty: plan.difficulty,
        duration_label: plan.duration,
        color: plan.color,
    };

    let log = call(&state, move |svc| svc.start_session(&account, snapshot, exercises))
        .await
        .map_err(|e| e.context("Error starting workout session"))?;

    Ok((
        StatusCode::CREATED,
        Json(StartResponse {
            success: true,
            message: "Workout session started",
            workout_log_id: log.id,
            workout_log: log,
        }),
    ))
}

pub async fn set_exercise_completion(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(log_id): Path<String>,
    payload: Result<Json<ExerciseRequest>, JsonRejection>,
) -> ApiResult<Json<LogResponse>> {
    ensure_ready(&state)?;
    let log_id = parse_log_id(&log_id)?;
    let body = parse_body(payload)?;
    let index = body
        .exercise_index
        .ok_or_else(|| Error::Validation("exerciseIndex is required".into()))?;
    let completed = body.completed.unwrap_or(true);

    let log = call(&state, move |svc| {
        svc.set_exercise_completion(&account, log_id, index, completed)
    })
    .await
    .map_err(|e| e.context("Error updating exercise"))?;

    Ok(LogResponse::new("Exercise updated", log))
}

pub async fn update_duration(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(log_id): Path<String>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> ApiResult<Json<LogResponse>> {
    ensure_ready(&state)?;
    let log_id = parse_log_id(&log_id)?;
    let seconds = parse_body(payload)?
        .duration
        .ok_or_else(|| Error::Validation("duration is required".into()))?;

    let log = call(&state, move |svc| svc.update_duration(&account, log_id, seconds))
        .await
        .map_err(|e| e.context("Error updating duration"))?;

    Ok(LogResponse::new("Duration updated", log))
}

/// The body is optional here; an empty request completes with zero duration
pub async fn complete_session(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(log_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<LogResponse>> {
    ensure_ready(&state)?;
    let log_id = parse_log_id(&log_id)?;
    let request: CompleteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?
    };

    let log = call(&state, move |svc| {
        svc.complete_session(&account, log_id, request.duration)
    })
    .await
    .map_err(|e| e.context("Error completing workout"))?;

    Ok(LogResponse::new("Workout completed", log))
}

pub async fn get_log(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
    Path(log_id): Path<String>,
) -> ApiResult<Json<LogResponse>> {
    ensure_ready(&state)?;
    let log_id = parse_log_id(&log_id)?;

    let log = call(&state, move |svc| svc.get_log(&account, log_id))
        .await
        .map_err(|e| e.context("Error fetching workout log"))?;

    Ok(LogResponse::new("Workout log found", log))
}

pub async fn history(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
) -> ApiResult<Json<HistoryResponse>> {
    ensure_ready(&state)?;
    let logs = call(&state, move |svc| svc.get_history(&account))
        .await
        .map_err(|e| e.context("Error fetching workout history"))?;

    Ok(Json(HistoryResponse {
        success: true,
        count: logs.len(),
        workout_logs: logs,
    }))
}

pub async fn progress(
    State(state): State<AppState>,
    Authenticated(account): Authenticated,
) -> ApiResult<Json<ProgressResponse>> {
    ensure_ready(&state)?;
    let progress = call(&state, move |svc| svc.weekly_progress(&account))
        .await
        .map_err(|e| e.context("Error computing weekly progress"))?;

    Ok(Json(ProgressResponse {
        success: true,
        progress,
    }))
}
