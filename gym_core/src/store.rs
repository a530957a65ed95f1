//! Record store abstraction for workout logs.
//!
//! The log service only talks to [`RecordStore`]. Two implementations ship
//! with the crate: [`MemoryStore`] for tests and ephemeral servers, and
//! [`crate::jsonl_store::JsonlStore`] for durable local storage.

use crate::jsonl_store::JsonlStore;
use crate::{AccountId, Config, Error, StoreBackend, WorkoutLog};
use std::io;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Mutation applied inside `find_one_and_update`; an `Err` aborts the write
pub type LogUpdate<'a> = &'a mut dyn FnMut(&mut WorkoutLog) -> crate::Result<()>;

/// Failure reported by a record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend cannot be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store IO error: {0}")]
    Io(#[from] io::Error),

    #[error("store record error: {0}")]
    Json(#[from] serde_json::Error),

    /// The update closure refused the change; nothing was written
    #[error(transparent)]
    Rejected(Error),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Error::Unavailable(msg),
            StoreError::Rejected(inner) => inner,
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Keyed document store holding workout logs
///
/// Every lookup is scoped by account: a log owned by someone else is
/// reported exactly like a missing one.
pub trait RecordStore: Send + Sync {
    /// Cheap connectivity probe
    fn ping(&self) -> StoreResult<()>;

    fn insert(&self, log: &WorkoutLog) -> StoreResult<()>;

    fn find_one(&self, account: &AccountId, id: Uuid) -> StoreResult<Option<WorkoutLog>>;

    /// Atomically load, mutate and write back one log
    ///
    /// Returns `Ok(None)` when no log matches `(id, account)`.
    fn find_one_and_update(
        &self,
        account: &AccountId,
        id: Uuid,
        update: LogUpdate<'_>,
    ) -> StoreResult<Option<WorkoutLog>>;

    /// Logs owned by `account`, newest first, at most `limit`
    fn find_by_account(&self, account: &AccountId, limit: usize) -> StoreResult<Vec<WorkoutLog>>;
}

/// Build the store selected by `[store] backend`
pub fn open_store(config: &Config) -> Arc<dyn RecordStore> {
    match config.store.backend {
        StoreBackend::Jsonl => {
            let path = config.store_path();
            tracing::info!("Using JSONL record store at {:?}", path);
            Arc::new(JsonlStore::new(path))
        }
        StoreBackend::Memory => {
            tracing::info!("Using in-memory record store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Order `logs` (given in insertion order) newest first and cap at `limit`
///
/// Creation time decides; insertion order breaks ties.
pub(crate) fn newest_first(mut logs: Vec<WorkoutLog>, limit: usize) -> Vec<WorkoutLog> {
    logs.reverse();
    logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    logs.truncate(limit);
    logs
}

/// In-process store keeping logs in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    logs: RwLock<Vec<WorkoutLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.logs.read().map(|logs| logs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

impl RecordStore for MemoryStore {
    fn ping(&self) -> StoreResult<()> {
        self.logs.read().map(|_| ()).map_err(poisoned)
    }

    fn insert(&self, log: &WorkoutLog) -> StoreResult<()> {
        self.logs.write().map_err(poisoned)?.push(log.clone());
        tracing::debug!("Inserted log {} into memory store", log.id);
        Ok(())
    }

    fn find_one(&self, account: &AccountId, id: Uuid) -> StoreResult<Option<WorkoutLog>> {
        let logs = self.logs.read().map_err(poisoned)?;
        Ok(logs
            .iter()
            .find(|log| log.id == id && log.is_owned_by(account))
            .cloned())
    }

    fn find_one_and_update(
        &self,
        account: &AccountId,
        id: Uuid,
        update: LogUpdate<'_>,
    ) -> StoreResult<Option<WorkoutLog>> {
        let mut logs = self.logs.write().map_err(poisoned)?;
        let Some(slot) = logs
            .iter_mut()
            .find(|log| log.id == id && log.is_owned_by(account))
        else {
            return Ok(None);
        };

        // Mutate a copy so a rejected update leaves the stored log untouched
        let mut updated = slot.clone();
        update(&mut updated).map_err(StoreError::Rejected)?;
        *slot = updated.clone();
        Ok(Some(updated))
    }

    fn find_by_account(&self, account: &AccountId, limit: usize) -> StoreResult<Vec<WorkoutLog>> {
        let logs = self.logs.read().map_err(poisoned)?;
        let owned = logs
            .iter()
            .filter(|log| log.is_owned_by(account))
            .cloned()
            .collect();
        Ok(newest_first(owned, limit))
    }
}
