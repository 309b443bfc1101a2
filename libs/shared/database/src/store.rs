use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction failure: {0}")]
    TransactionFailure(String),
}

/// Persisted row with a stable identifier.
pub trait Record {
    fn id(&self) -> Uuid;
}

/// One relational table, keyed by row id. Rows are cloned out on read so a
/// caller never holds a reference into live store state.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<Uuid, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Record + Clone> Table<T> {
    pub fn insert(&mut self, row: T) -> T {
        let stored = row.clone();
        self.rows.insert(row.id(), row);
        stored
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    pub fn find_one(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|row| predicate(row)).cloned()
    }

    pub fn find_all(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| predicate(row)).cloned().collect()
    }

    /// Applies `apply` to the row and returns the updated copy, or `None`
    /// when the id is absent.
    pub fn update(&mut self, id: Uuid, apply: impl FnOnce(&mut T)) -> Option<T> {
        let row = self.rows.get_mut(&id)?;
        apply(row);
        Some(row.clone())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shared store with transaction-as-callback semantics. One mutex guards the
/// whole state, so every transaction observes and mutates it in isolation:
/// the overlap check, the active-booking check and the writes that follow
/// them are consistent as a unit.
#[derive(Debug)]
pub struct Datastore<S> {
    state: Arc<Mutex<S>>,
}

impl<S> Clone for Datastore<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Default> Default for Datastore<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Datastore<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
        }
    }
}

impl<S: Clone> Datastore<S> {
    /// Runs `op` as one atomic transaction: commit on `Ok`, restore the
    /// pre-transaction snapshot on `Err`. A lock failure surfaces as
    /// `StoreError::TransactionFailure` and is never retried here.
    pub fn with_transaction<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut S) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut state = self.state.lock().map_err(|e| {
            error!("failed to start transaction: {}", e);
            E::from(StoreError::TransactionFailure(e.to_string()))
        })?;
        let snapshot = state.clone();
        match op(&mut state) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!("transaction aborted, restoring snapshot");
                *state = snapshot;
                Err(err)
            }
        }
    }

    /// Lock-only read path for operations the transaction contract exempts.
    pub fn read<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&S) -> Result<T, E>,
        E: From<StoreError>,
    {
        let state = self.state.lock().map_err(|e| {
            error!("failed to read store: {}", e);
            E::from(StoreError::TransactionFailure(e.to_string()))
        })?;
        op(&state)
    }
}
