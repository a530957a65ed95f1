#![forbid(unsafe_code)]

//! Core domain model and business logic for Gymlog.
//!
//! This crate provides:
//! - Domain types (workout plans, logs, exercise records)
//! - The static plan catalog
//! - The client-local session engine and its tick driver
//! - The workout log service and its record stores
//! - Bearer credential issuing/verification
//! - Weekly progress summaries and CSV export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod session;
pub mod timer;
pub mod store;
pub mod jsonl_store;
pub mod readiness;
pub mod identity;
pub mod log_service;
pub mod progress;
pub mod export;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use catalog::{default_catalog, find_plan, Catalog};
pub use config::{Config, StoreBackend};
pub use session::{ExerciseOutcome, SessionPhase, WorkoutSession};
pub use timer::{SessionTimer, SharedSession};
pub use store::{MemoryStore, RecordStore, StoreError};
pub use jsonl_store::JsonlStore;
pub use readiness::Readiness;
pub use identity::{HmacTokenProvider, IdentityProvider};
pub use log_service::{WorkoutLogService, HISTORY_LIMIT};
pub use progress::WeeklyProgress;
pub use export::export_history_csv;
