//! CSV export of workout history.
//!
//! Rows are appended to the target file; headers are written only when the
//! file is new or empty. The file is fsynced before returning.

use crate::{Result, WorkoutLog};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    plan: String,
    started_at: String,
    completed_at: Option<String>,
    completed_exercises: usize,
    total_exercises: usize,
    duration_seconds: u64,
    is_completed: bool,
}

impl From<&WorkoutLog> for CsvRow {
    fn from(log: &WorkoutLog) -> Self {
        CsvRow {
            id: log.id.to_string(),
            plan: log.workout_plan.title.clone(),
            started_at: log.started_at.to_rfc3339(),
            completed_at: log.completed_at.map(|t| t.to_rfc3339()),
            completed_exercises: log.completed_exercises,
            total_exercises: log.total_exercises,
            duration_seconds: log.workout_duration,
            is_completed: log.is_completed,
        }
    }
}

/// Append `logs` to the CSV file at `path`, returning the row count
pub fn export_history_csv(logs: &[WorkoutLog], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for log in logs {
        writer.serialize(CsvRow::from(log))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} logs to {:?}", logs.len(), path);
    Ok(logs.len())
}
