//! Weekly progress summary built from workout history.
//!
//! Covers the seven calendar days (UTC) ending today. A day counts as
//! completed when at least one log started that day is completed.

use crate::WorkoutLog;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Number of days in the summary window
pub const WINDOW_DAYS: i64 = 7;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayProgress {
    pub date: NaiveDate,
    /// Short weekday label, e.g. "Mon"
    pub day: String,
    pub workouts: usize,
    pub completed: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgress {
    /// Oldest day first
    pub days: Vec<DayProgress>,
    pub total_workouts: usize,
    pub days_completed: usize,
    /// Whole percent of the window's days that were completed
    pub completion_rate: u32,
}

pub fn weekly_progress(logs: &[WorkoutLog], now: DateTime<Utc>) -> WeeklyProgress {
    let today = now.date_naive();

    let days: Vec<DayProgress> = (0..WINDOW_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let on_day: Vec<_> = logs
                .iter()
                .filter(|log| log.started_at.date_naive() == date)
                .collect();
            DayProgress {
                date,
                day: date.weekday().to_string(),
                workouts: on_day.len(),
                completed: on_day.iter().any(|log| log.is_completed),
            }
        })
        .collect();

    let total_workouts = days.iter().map(|d| d.workouts).sum();
    let days_completed = days.iter().filter(|d| d.completed).count();
    let window = WINDOW_DAYS as usize;
    let completion_rate = ((200 * days_completed + window) / (2 * window)) as u32;

    WeeklyProgress {
        days,
        total_workouts,
        days_completed,
        completion_rate,
    }
}
