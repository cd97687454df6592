use async_trait::async_trait;

use crate::domain::Entry;
use crate::error::RepoError;

/// Transform applied to an entry under the repository's per-path lock.
pub type UpdateFn = Box<dyn FnOnce(Entry) -> Result<Entry, RepoError> + Send>;

/// Entry storage keyed by canonical path.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Store a new entry. Fails with `AlreadyExists` if the path is taken.
    async fn create(&self, path: &str, entry: Entry) -> Result<Entry, RepoError>;

    /// Fetch the entry stored at `path`, soft-deleted or not.
    async fn get(&self, path: &str) -> Result<Entry, RepoError>;

    /// Atomically read, transform and write back the entry at `path`.
    ///
    /// When the transformed entry has a different canonical path the record
    /// is moved there in the same step.
    async fn update(&self, path: &str, transform: UpdateFn) -> Result<Entry, RepoError>;

    /// All entries whose path starts with `prefix`, ordered by path.
    async fn fetch_by_prefix(&self, prefix: &str) -> Result<Vec<Entry>, RepoError>;
}
