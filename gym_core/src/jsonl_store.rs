//! JSON Lines record store for workout logs.
//!
//! One log per line, in insertion order. Inserts append; updates rewrite the
//! whole file atomically (temp file in the same directory, fsync, rename).
//! Both take an exclusive `fs2` lock on a sibling `.lock` file so concurrent
//! processes cannot interleave a read-modify-write. Lines that fail to parse
//! are skipped on read and carried over verbatim on rewrite.

use crate::store::{newest_first, LogUpdate, RecordStore, StoreError, StoreResult};
use crate::{AccountId, WorkoutLog};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// File-backed record store
pub struct JsonlStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Open the lock file; the lock is released when the handle drops
    fn lock(&self, exclusive: bool) -> StoreResult<File> {
        self.ensure_parent_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }

    fn read_raw_lines(&self) -> StoreResult<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// True when the file is non-empty and its last record was cut off
    fn has_torn_tail(&self) -> StoreResult<bool> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }

    fn read_logs(&self) -> StoreResult<Vec<WorkoutLog>> {
        let lines = self.read_raw_lines()?;
        let mut logs = Vec::with_capacity(lines.len());
        for (line_num, line) in lines.iter().enumerate() {
            match serde_json::from_str::<WorkoutLog>(line) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    tracing::warn!("Skipping unreadable log at line {}: {}", line_num + 1, e);
                }
            }
        }
        tracing::debug!("Read {} logs from {:?}", logs.len(), self.path);
        Ok(logs)
    }

    fn rewrite(&self, lines: &[String]) -> StoreResult<()> {
        let dir = self.path.parent().ok_or_else(|| {
            StoreError::Unavailable(format!("store path {:?} has no parent", self.path))
        })?;
        let temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for line in lines {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

fn matches(log: &WorkoutLog, account: &AccountId, id: Uuid) -> bool {
    log.id == id && log.is_owned_by(account)
}

impl RecordStore for JsonlStore {
    fn ping(&self) -> StoreResult<()> {
        let probe = || -> StoreResult<()> {
            self.ensure_parent_dir()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            Ok(())
        };
        probe().map_err(|e| StoreError::Unavailable(format!("{:?}: {}", self.path, e)))
    }

    fn insert(&self, log: &WorkoutLog) -> StoreResult<()> {
        let _guard = self.lock(true)?;
        let torn_tail = self.has_torn_tail()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(&file);
        if torn_tail {
            tracing::warn!("Terminating partial record at end of {:?}", self.path);
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(log)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);
        file.sync_data()?;

        tracing::debug!("Appended log {} to {:?}", log.id, self.path);
        Ok(())
    }

    fn find_one(&self, account: &AccountId, id: Uuid) -> StoreResult<Option<WorkoutLog>> {
        let _guard = self.lock(false)?;
        Ok(self
            .read_logs()?
            .into_iter()
            .find(|log| matches(log, account, id)))
    }

    fn find_one_and_update(
        &self,
        account: &AccountId,
        id: Uuid,
        update: LogUpdate<'_>,
    ) -> StoreResult<Option<WorkoutLog>> {
        let _guard = self.lock(true)?;
        let mut lines = self.read_raw_lines()?;

        let target = lines.iter().enumerate().find_map(|(idx, line)| {
            serde_json::from_str::<WorkoutLog>(line)
                .ok()
                .filter(|log| matches(log, account, id))
                .map(|log| (idx, log))
        });
        let Some((idx, mut log)) = target else {
            return Ok(None);
        };

        update(&mut log).map_err(StoreError::Rejected)?;
        lines[idx] = serde_json::to_string(&log)?;
        self.rewrite(&lines)?;

        tracing::debug!("Rewrote log {} in {:?}", id, self.path);
        Ok(Some(log))
    }

    fn find_by_account(&self, account: &AccountId, limit: usize) -> StoreResult<Vec<WorkoutLog>> {
        let _guard = self.lock(false)?;
        let owned = self
            .read_logs()?
            .into_iter()
            .filter(|log| log.is_owned_by(account))
            .collect();
        Ok(newest_first(owned, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ExerciseRecord, WorkoutPlanSnapshot};
    use chrono::Utc;

    fn create_test_log(account: &str) -> WorkoutLog {
        let now = Utc::now();
        WorkoutLog {
            id: Uuid::new_v4(),
            user_id: AccountId::new(account).unwrap(),
            workout_plan: WorkoutPlanSnapshot::titled("Cardio Blast"),
            exercises: vec![
                ExerciseRecord::pending("Burpees"),
                ExerciseRecord::pending("High Knees"),
            ],
            completed_exercises: 0,
            total_exercises: 2,
            workout_duration: 0,
            is_completed: false,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn alice() -> AccountId {
        AccountId::new("alice").unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("logs.jsonl"));

        let log = create_test_log("alice");
        store.insert(&log).unwrap();

        let found = store.find_one(&alice(), log.id).unwrap();
        assert_eq!(found, Some(log));
    }

    #[test]
    fn test_find_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("nonexistent.jsonl"));

        assert!(store.find_by_account(&alice(), 50).unwrap().is_empty());
        assert!(store.find_one(&alice(), Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_update_persists_and_keeps_other_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("logs.jsonl"));

        let first = create_test_log("alice");
        let second = create_test_log("alice");
        store.insert(&first).unwrap();
        store.insert(&second).unwrap();

        let updated = store
            .find_one_and_update(&alice(), first.id, &mut |log| {
                log.workout_duration = 420;
                Ok(())
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.workout_duration, 420);

        let reopened = JsonlStore::new(temp_dir.path().join("logs.jsonl"));
        let logs = reopened.find_by_account(&alice(), 50).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(reopened.find_one(&alice(), first.id).unwrap().unwrap().workout_duration, 420);
        assert_eq!(reopened.find_one(&alice(), second.id).unwrap(), Some(second));
    }

    #[test]
    fn test_update_other_account_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("logs.jsonl"));
        let log = create_test_log("alice");
        store.insert(&log).unwrap();

        let bob = AccountId::new("bob").unwrap();
        let result = store
            .find_one_and_update(&bob, log.id, &mut |l| {
                l.is_completed = true;
                Ok(())
            })
            .unwrap();
        assert!(result.is_none());
        assert!(!store.find_one(&alice(), log.id).unwrap().unwrap().is_completed);
    }

    #[test]
    fn test_rejected_update_leaves_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.jsonl");
        let store = JsonlStore::new(&path);
        store.insert(&create_test_log("alice")).unwrap();
        let log = create_test_log("alice");
        store.insert(&log).unwrap();

        let before = std::fs::read(&path).unwrap();
        let result = store.find_one_and_update(&alice(), log.id, &mut |_| {
            Err(Error::InvalidIndex { index: 2, total: 2 })
        });
        assert!(matches!(
            result,
            Err(StoreError::Rejected(Error::InvalidIndex { .. }))
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_corrupt_lines_skipped_and_preserved() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.jsonl");
        let store = JsonlStore::new(&path);

        let log = create_test_log("alice");
        store.insert(&log).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ invalid json }}").unwrap();
        }

        assert_eq!(store.find_by_account(&alice(), 50).unwrap().len(), 1);

        store
            .find_one_and_update(&alice(), log.id, &mut |l| {
                l.workout_duration = 5;
                Ok(())
            })
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("{ invalid json }"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_insert_after_torn_tail_starts_new_line() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.jsonl");
        std::fs::write(&path, "{\"id\":\"0000").unwrap();
        let store = JsonlStore::new(&path);

        let log = create_test_log("alice");
        store.insert(&log).unwrap();

        assert_eq!(store.find_one(&alice(), log.id).unwrap(), Some(log));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("{\"id\":\"0000\n"));
    }

    #[test]
    fn test_no_stray_temp_files_after_update() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::new(temp_dir.path().join("logs.jsonl"));
        let log = create_test_log("alice");
        store.insert(&log).unwrap();
        store
            .find_one_and_update(&alice(), log.id, &mut |_| Ok(()))
            .unwrap();

        let mut names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["logs.jsonl", "logs.lock"]);
    }
}
