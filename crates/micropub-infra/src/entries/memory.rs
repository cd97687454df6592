//! In-memory entry repository.
//!
//! Note: Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use micropub_core::domain::{Entry, clean_path};
use micropub_core::error::RepoError;
use micropub_core::ports::{EntryRepository, UpdateFn};

/// Entry repository backed by a `HashMap` behind an async `RwLock`.
///
/// Updates run their transform while holding the write lock, so concurrent
/// writers to the same path never lose each other's changes.
pub struct InMemoryEntryRepository {
    store: RwLock<HashMap<String, Entry>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    fn key(path: &str) -> String {
        clean_path(&path.to_lowercase())
    }
}

impl Default for InMemoryEntryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn create(&self, path: &str, entry: Entry) -> Result<Entry, RepoError> {
        let key = Self::key(path);
        let mut store = self.store.write().await;

        if store.contains_key(&key) {
            return Err(RepoError::AlreadyExists(key));
        }

        tracing::debug!(path = %key, "Storing entry");
        store.insert(key, entry.clone());

        Ok(entry)
    }

    async fn get(&self, path: &str) -> Result<Entry, RepoError> {
        let key = Self::key(path);
        let store = self.store.read().await;

        store.get(&key).cloned().ok_or(RepoError::NotFound(key))
    }

    async fn update(&self, path: &str, transform: UpdateFn) -> Result<Entry, RepoError> {
        let key = Self::key(path);
        let mut store = self.store.write().await;

        let current = store
            .get(&key)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(key.clone()))?;

        let updated = transform(current)?;
        let target = updated.path().map_or_else(|| key.clone(), |p| Self::key(&p));

        if target != key {
            if store.contains_key(&target) {
                return Err(RepoError::AlreadyExists(target));
            }

            tracing::debug!(from = %key, to = %target, "Moving entry");
            store.remove(&key);
        }

        store.insert(target, updated.clone());

        Ok(updated)
    }

    async fn fetch_by_prefix(&self, prefix: &str) -> Result<Vec<Entry>, RepoError> {
        let prefix = prefix.to_lowercase();
        let store = self.store.read().await;

        let mut matches: Vec<(&String, &Entry)> = store
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));

        Ok(matches.into_iter().map(|(_, entry)| entry.clone()).collect())
    }
}
