//! Server-authoritative workout log service.
//!
//! The service owns every rule about a log's aggregates:
//! - `completed_exercises` is recounted from the records on every mutation,
//!   never adjusted by a delta
//! - `is_completed` follows the natural invariant
//!   `completed == total && total > 0` after each exercise change
//! - force-completion is a separate transition that sets the terminal state
//!   without touching exercise records
//!
//! Each operation checks store readiness and validates input before any
//! write, and scopes lookups by `(log id, account)` so another account's log
//! looks exactly like a missing one.

use crate::progress::{weekly_progress, WeeklyProgress};
use crate::readiness::Readiness;
use crate::store::RecordStore;
use crate::{AccountId, Error, ExerciseRecord, Result, WorkoutLog, WorkoutPlanSnapshot};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Maximum number of logs returned by a history request
pub const HISTORY_LIMIT: usize = 50;

/// Source of "now" for log timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Aggregate transitions
// ============================================================================

impl WorkoutLog {
    /// Fresh log with every exercise pending
    pub fn start(
        account: AccountId,
        plan: WorkoutPlanSnapshot,
        exercise_names: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if exercise_names.is_empty() {
            return Err(Error::Validation(
                "Invalid workout plan data: at least one exercise is required".into(),
            ));
        }
        if exercise_names.iter().any(|name| name.trim().is_empty()) {
            return Err(Error::Validation(
                "Invalid workout plan data: exercise names are required".into(),
            ));
        }
        if plan.title.trim().is_empty() {
            return Err(Error::Validation(
                "Invalid workout plan data: title is required".into(),
            ));
        }

        let exercises: Vec<_> = exercise_names.into_iter().map(ExerciseRecord::pending).collect();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: account,
            workout_plan: plan,
            total_exercises: exercises.len(),
            exercises,
            completed_exercises: 0,
            workout_duration: 0,
            is_completed: false,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Natural completion rule
    pub fn all_exercises_done(&self) -> bool {
        self.total_exercises > 0 && self.completed_exercises == self.total_exercises
    }

    /// Mark one exercise and re-derive the aggregates
    ///
    /// An out-of-range index is rejected before anything changes.
    pub fn set_exercise_completion(
        &mut self,
        index: i64,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let total = self.exercises.len();
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < total)
            .ok_or(Error::InvalidIndex { index, total })?;

        let record = &mut self.exercises[slot];
        record.completed = completed;
        record.completed_at = completed.then_some(now);

        self.recount();
        // completed_at only moves forward; dropping back keeps the last completion time
        self.is_completed = self.all_exercises_done();
        if self.is_completed {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Recompute, never trust a cached delta
    fn recount(&mut self) {
        self.completed_exercises = self.exercises.iter().filter(|e| e.completed).count();
    }

    /// Overwrite the reported duration, smaller values included
    pub fn set_duration(&mut self, seconds: u64, now: DateTime<Utc>) {
        self.workout_duration = seconds;
        self.updated_at = now;
    }

    /// Mark the log done regardless of per-exercise state
    pub fn force_complete(&mut self, seconds: Option<u64>, now: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(now);
        self.workout_duration = seconds.unwrap_or(0);
        self.updated_at = now;
    }
}

// ============================================================================
// Per-log write serialization
// ============================================================================

/// In-process mutexes keyed by log id
#[derive(Default)]
pub struct LogLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl LogLocks {
    /// Run `f` while holding the lock for `id`
    pub fn with_lock<T>(&self, id: Uuid, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            locks.entry(id).or_default().clone()
        };
        let result = {
            let _guard = entry.lock().unwrap_or_else(|p| p.into_inner());
            f()
        };

        // Drop the map entry once nobody else is waiting on it
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        if Arc::strong_count(&entry) == 2 {
            locks.remove(&id);
        }
        result
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct WorkoutLogService {
    store: Arc<dyn RecordStore>,
    readiness: Readiness,
    clock: Arc<dyn Clock>,
    locks: LogLocks,
}

impl WorkoutLogService {
    pub fn new(store: Arc<dyn RecordStore>, readiness: Readiness) -> Self {
        Self::with_clock(store, readiness, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        readiness: Readiness,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            readiness,
            clock,
            locks: LogLocks::default(),
        }
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.readiness.is_ready() {
            Ok(())
        } else {
            Err(Error::Unavailable(
                "record store is not connected".into(),
            ))
        }
    }

    pub fn start_session(
        &self,
        account: &AccountId,
        plan: WorkoutPlanSnapshot,
        exercise_names: Vec<String>,
    ) -> Result<WorkoutLog> {
        self.ensure_ready()?;
        let log = WorkoutLog::start(account.clone(), plan, exercise_names, self.clock.now())?;
        self.store.insert(&log)?;

        tracing::info!(
            "Started workout log {} ({}, {} exercises) for {}",
            log.id,
            log.workout_plan.title,
            log.total_exercises,
            account
        );
        Ok(log)
    }

    pub fn set_exercise_completion(
        &self,
        account: &AccountId,
        log_id: Uuid,
        index: i64,
        completed: bool,
    ) -> Result<WorkoutLog> {
        self.ensure_ready()?;
        let now = self.clock.now();
        let log = self.update(account, log_id, &mut |log| {
            log.set_exercise_completion(index, completed, now)
        })?;

        tracing::info!(
            "Log {}: exercise {} completed={} ({}/{}, done={})",
            log.id,
            index,
            completed,
            log.completed_exercises,
            log.total_exercises,
            log.is_completed
        );
        Ok(log)
    }

    pub fn update_duration(
        &self,
        account: &AccountId,
        log_id: Uuid,
        seconds: u64,
    ) -> Result<WorkoutLog> {
        self.ensure_ready()?;
        let now = self.clock.now();
        let mut previous = 0;
        let log = self.update(account, log_id, &mut |log| {
            previous = log.workout_duration;
            log.set_duration(seconds, now);
            Ok(())
        })?;

        if seconds < previous {
            tracing::warn!(
                "Log {}: duration regressed from {}s to {}s",
                log.id,
                previous,
                seconds
            );
        }
        Ok(log)
    }

    /// Force-complete, bypassing the per-exercise completion rule
    pub fn complete_session(
        &self,
        account: &AccountId,
        log_id: Uuid,
        seconds: Option<u64>,
    ) -> Result<WorkoutLog> {
        self.ensure_ready()?;
        let now = self.clock.now();
        let log = self.update(account, log_id, &mut |log| {
            log.force_complete(seconds, now);
            Ok(())
        })?;

        tracing::info!(
            "Log {} force-completed with {}/{} exercises in {}s",
            log.id,
            log.completed_exercises,
            log.total_exercises,
            log.workout_duration
        );
        Ok(log)
    }

    pub fn get_log(&self, account: &AccountId, log_id: Uuid) -> Result<WorkoutLog> {
        self.ensure_ready()?;
        self.store.find_one(account, log_id)?.ok_or(Error::NotFound)
    }

    /// Newest-first history capped at [`HISTORY_LIMIT`]
    pub fn get_history(&self, account: &AccountId) -> Result<Vec<WorkoutLog>> {
        self.ensure_ready()?;
        let logs = self.store.find_by_account(account, HISTORY_LIMIT)?;
        tracing::debug!("Loaded {} history entries for {}", logs.len(), account);
        Ok(logs)
    }

    /// Seven-day summary ending today
    pub fn weekly_progress(&self, account: &AccountId) -> Result<WeeklyProgress> {
        let logs = self.get_history(account)?;
        Ok(weekly_progress(&logs, self.clock.now()))
    }

    fn update(
        &self,
        account: &AccountId,
        log_id: Uuid,
        mutate: &mut dyn FnMut(&mut WorkoutLog) -> Result<()>,
    ) -> Result<WorkoutLog> {
        self.locks.with_lock(log_id, || {
            self.store
                .find_one_and_update(account, log_id, mutate)?
                .ok_or(Error::NotFound)
        })
    }
}
