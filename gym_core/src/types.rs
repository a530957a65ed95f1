//! Core domain types for Gymlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Accounts (opaque identifiers from the identity provider)
//! - Workout plans and the snapshot embedded into each log
//! - Workout logs and their per-exercise records

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Accounts
// ============================================================================

/// Opaque account identifier vouched for by the identity provider
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::Validation("Account id must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Plans
// ============================================================================

/// A workout plan from the static catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    /// Display label such as "30 minutes", not a machine duration
    pub duration: String,
    pub color: String,
    pub exercises: Vec<String>,
}

/// Descriptive plan fields copied into a log when a session starts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanSnapshot {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(
        default,
        rename = "duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl WorkoutPlanSnapshot {
    /// Snapshot with only the required title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            difficulty: None,
            duration_label: None,
            color: None,
        }
    }
}

// ============================================================================
// Workout Logs
// ============================================================================

/// One positional exercise entry of a workout log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExerciseRecord {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: false,
            completed_at: None,
        }
    }
}

/// Persisted record of one workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub id: Uuid,
    pub user_id: AccountId,
    pub workout_plan: WorkoutPlanSnapshot,
    pub exercises: Vec<ExerciseRecord>,
    /// Always equal to the number of records with `completed == true`
    pub completed_exercises: usize,
    /// Fixed at creation
    pub total_exercises: usize,
    /// Client-reported elapsed seconds
    #[serde(default)]
    pub workout_duration: u64,
    #[serde(default)]
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkoutLog {
    /// True when the log belongs to `account`
    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        &self.user_id == account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_rejects_blank() {
        assert!(AccountId::new("  ").is_err());
        assert_eq!(AccountId::new("alice").unwrap().as_str(), "alice");
    }

    #[test]
    fn test_snapshot_uses_wire_field_names() {
        let snapshot = WorkoutPlanSnapshot {
            duration_label: Some("30 minutes".into()),
            ..WorkoutPlanSnapshot::titled("Beginner Full Body")
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["title"], "Beginner Full Body");
        assert_eq!(json["duration"], "30 minutes");
        assert!(json.get("color").is_none());
    }

    #[test]
    fn test_log_serializes_camel_case() {
        let now = Utc::now();
        let log = WorkoutLog {
            id: Uuid::new_v4(),
            user_id: AccountId::new("alice").unwrap(),
            workout_plan: WorkoutPlanSnapshot::titled("Cardio Blast"),
            exercises: vec![ExerciseRecord::pending("Burpees")],
            completed_exercises: 0,
            total_exercises: 1,
            workout_duration: 0,
            is_completed: false,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["userId"], "alice");
        assert_eq!(json["totalExercises"], 1);
        assert_eq!(json["exercises"][0]["completed"], false);
        assert!(json["completedAt"].is_null());
    }
}
