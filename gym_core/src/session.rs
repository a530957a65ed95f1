//! Client-local workout session engine.
//!
//! A [`WorkoutSession`] walks one user through a plan's exercises in order.
//! Nothing here is persisted; the server-side log is the durable record and
//! is kept in step by mirroring each completion into the log service.
//!
//! ```text
//! NotStarted --start()--> Running --last completion--> Complete
//! ```
//!
//! Impossible requests from callers (skip at the last exercise, completing
//! past the end) are no-ops rather than errors.

use std::collections::BTreeSet;

/// Phase of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Running,
    Complete,
}

/// Result of a `complete_exercise` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExerciseOutcome {
    /// Index recorded; the pointer now sits at the given position
    Advanced(usize),
    /// Index recorded and every exercise is now done
    SessionComplete,
    /// Index out of range or session already complete; nothing changed
    Ignored,
}

/// In-memory state machine for one guided workout
#[derive(Clone, Debug)]
pub struct WorkoutSession {
    exercises: Vec<String>,
    current: usize,
    completed: BTreeSet<usize>,
    elapsed_seconds: u64,
    phase: SessionPhase,
}

impl WorkoutSession {
    pub fn new(exercises: Vec<String>) -> Self {
        Self {
            exercises,
            current: 0,
            completed: BTreeSet::new(),
            elapsed_seconds: 0,
            phase: SessionPhase::NotStarted,
        }
    }

    /// Begin timing. Only valid from `NotStarted`.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::NotStarted {
            return false;
        }
        self.phase = SessionPhase::Running;
        tracing::debug!("Session started with {} exercises", self.total());
        true
    }

    /// One timer tick. Counts only while running.
    pub fn tick(&mut self) {
        if self.phase == SessionPhase::Running {
            self.elapsed_seconds += 1;
        }
    }

    pub fn complete_exercise(&mut self, index: usize) -> ExerciseOutcome {
        let total = self.total();
        if index >= total || self.phase == SessionPhase::Complete {
            tracing::debug!("Ignoring completion of exercise {} (total {})", index, total);
            return ExerciseOutcome::Ignored;
        }

        self.completed.insert(index);
        if index + 1 < total {
            self.current = self.current.max(index + 1);
        }

        if self.completed.len() == total {
            self.phase = SessionPhase::Complete;
            tracing::info!("Session complete after {}", self.elapsed_label());
            ExerciseOutcome::SessionComplete
        } else {
            ExerciseOutcome::Advanced(self.current)
        }
    }

    /// Move past the current exercise without completing it
    pub fn skip_exercise(&mut self) -> bool {
        if self.phase == SessionPhase::Complete || self.current + 1 >= self.total() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Completed share rounded to the nearest whole percent; 0 for an empty plan
    pub fn progress_percent(&self) -> u32 {
        let total = self.total() as u64;
        if total == 0 {
            return 0;
        }
        let done = self.completed.len() as u64;
        ((200 * done + total) / (2 * total)) as u32
    }

    /// Elapsed time as `MM:SS`; minutes are not capped at 59
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_exercise(&self) -> Option<&str> {
        self.exercises.get(self.current).map(String::as_str)
    }

    pub fn exercises(&self) -> &[String] {
        &self.exercises
    }

    pub fn is_exercise_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn total(&self) -> usize {
        self.exercises.len()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }
}

/// Format seconds as zero-padded `MM:SS`
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
