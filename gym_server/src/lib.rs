#![forbid(unsafe_code)]

//! HTTP surface for the Gymlog workout log service.
//!
//! Wraps [`gym_core::WorkoutLogService`] in an axum router with bearer
//! authentication, a uniform `{success, message}` envelope and per-request
//! tracing spans.

pub mod api;
pub mod auth;
mod middleware;
pub mod response;

use axum::routing::{get, patch, post};
use axum::Router;
use gym_core::{IdentityProvider, WorkoutLogService};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use auth::Authenticated;
pub use response::{ApiError, ApiResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WorkoutLogService>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(service: WorkoutLogService, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            service: Arc::new(service),
            identity,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let workouts = Router::new()
        .route("/start", post(api::start_session))
        .route("/exercise/{log_id}", patch(api::set_exercise_completion))
        .route("/duration/{log_id}", patch(api::update_duration))
        .route("/complete/{log_id}", patch(api::complete_session))
        .route("/history", get(api::history))
        .route("/progress", get(api::progress))
        .route("/{log_id}", get(api::get_log));

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/plans", get(api::list_plans))
        .nest("/workouts", workouts)
        .fallback(api::not_found)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
