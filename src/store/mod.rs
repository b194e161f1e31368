use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

/// Failures of the backing store itself, distinct from business-logic
/// rejections. Callers should treat these as transient and retry later.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The check passed and the record was rewritten.
    Applied,
    /// The record exists but no longer matches the expected state.
    Rejected,
    /// No record under that id.
    Missing,
}

/// A document collection keyed by id. `conditional_update` is the sole
/// concurrency primitive: the check and the write happen under the same
/// per-record lock, so of any number of racing callers exactly one can
/// observe the expected state and apply its write.
///
/// Constructed once at startup and handed to components through `AppState`;
/// nothing in the crate reaches for a global registry.
pub struct Collection<T> {
    docs: DashMap<Uuid, T>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    pub fn insert(&self, id: Uuid, doc: T) -> Result<(), StoreError> {
        self.docs.insert(id, doc);
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<T>, StoreError> {
        Ok(self.docs.get(id).map(|entry| entry.value().clone()))
    }

    pub fn find<F>(&self, filter: F) -> Result<Vec<T>, StoreError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self
            .docs
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    /// Unconditional overwrite of parts of a record (last write wins).
    /// Returns `false` if the record does not exist.
    pub fn update<F>(&self, id: &Uuid, apply: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut T),
    {
        match self.docs.get_mut(id) {
            Some(mut entry) => {
                apply(entry.value_mut());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Check-and-set against a single record. The closure pair runs while
    /// the record's shard lock is held, which is what makes two compound
    /// mutations against the same record mutually exclusive.
    pub fn conditional_update<C, F>(
        &self,
        id: &Uuid,
        check: C,
        apply: F,
    ) -> Result<UpdateOutcome, StoreError>
    where
        C: FnOnce(&T) -> bool,
        F: FnOnce(&mut T),
    {
        match self.docs.get_mut(id) {
            Some(mut entry) => {
                if !check(entry.value()) {
                    return Ok(UpdateOutcome::Rejected);
                }
                apply(entry.value_mut());
                Ok(UpdateOutcome::Applied)
            }
            None => Ok(UpdateOutcome::Missing),
        }
    }

    pub fn remove(&self, id: &Uuid) -> Result<Option<T>, StoreError> {
        Ok(self.docs.remove(id).map(|(_, doc)| doc))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}
