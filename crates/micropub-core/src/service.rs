//! Entry service - runs a parsed [`Operation`] against the repository and
//! media store.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::codec::Commands;
use crate::domain::{Entry, Timestamp, canonical_path, clean_path, now};
use crate::error::{ProtocolError, RepoError};
use crate::merge::{MergeMode, apply, merge};
use crate::ports::{EntryRepository, MediaFile, MediaStore, UpdateFn};
use crate::request::{CreateRequest, Operation, SourceRequest, UpdateRequest};
use crate::source::SourceResponse;

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A new entry was stored.
    Created(Entry),
    Source(SourceResponse),
    /// Changed in place; the canonical URL is unchanged.
    Modified(Entry),
    /// Changed and now lives under a different URL.
    Moved(Entry),
    Deleted,
}

pub struct EntryService {
    entries: Arc<dyn EntryRepository>,
    media: Arc<dyn MediaStore>,
    base_url: Url,
}

impl EntryService {
    /// `base_url` is the root permalinks are minted under.
    pub fn new(entries: Arc<dyn EntryRepository>, media: Arc<dyn MediaStore>, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            entries,
            media,
            base_url,
        }
    }

    pub async fn execute(&self, operation: Operation) -> Result<Outcome, ProtocolError> {
        debug!(action = operation.action(), "Executing operation");

        match operation {
            Operation::Create(request) => self.create(request).await,
            Operation::Source(request) => self.source(request).await,
            Operation::Update(request) => self.update(request).await,
            Operation::Delete(url) => self.delete(&url).await,
            Operation::Undelete(url) => self.undelete(&url).await,
        }
    }

    /// Live entries under `prefix`, ordered by path.
    pub async fn list(&self, prefix: &str) -> Result<Vec<Entry>, ProtocolError> {
        let prefix = clean_path(&prefix.to_lowercase());
        let entries = self.entries.fetch_by_prefix(&prefix).await?;

        Ok(entries.into_iter().filter(|e| !e.is_deleted()).collect())
    }

    async fn create(&self, request: CreateRequest) -> Result<Outcome, ProtocolError> {
        let CreateRequest {
            kind,
            properties,
            commands,
            uploads,
        } = request;

        let mut entry = Entry::new(kind);
        apply(&mut entry, &properties, MergeMode::Add);

        let now = now();
        entry.created_at.get_or_insert(now);
        entry.updated_at.get_or_insert(now);

        let url = match entry.url.take() {
            Some(url) => url,
            None => self.mint_url(&commands, now)?,
        };
        let path = canonical_path(&url);
        entry.url = Some(url);

        // Files are only stored once the permalink is known to be free.
        match self.entries.get(&path).await {
            Ok(_) => return Err(RepoError::AlreadyExists(path).into()),
            Err(RepoError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let mut uploaded = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let url = self
                .media
                .upload(MediaFile {
                    name: upload.filename,
                    content_type: upload
                        .content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    content: upload.content,
                })
                .await?;
            debug!(field = %upload.field, url = %url, "Attached uploaded file");

            match upload.field.as_str() {
                "photo" => entry.photos.push(url.clone()),
                "video" => entry.videos.push(url.clone()),
                "audio" => entry.audio.push(url.clone()),
                _ => {}
            }
            uploaded.push(url);
        }

        if let Err(err) = self.entries.create(&path, entry).await {
            if !uploaded.is_empty() {
                let urls: Vec<&str> = uploaded.iter().map(Url::as_str).collect();
                warn!(path = %path, orphaned = ?urls, "Entry not stored, uploaded media left unreferenced");
            }
            return Err(err.into());
        }
        let stored = self.entries.get(&path).await?;

        info!(path = %path, "Entry created");
        Ok(Outcome::Created(stored))
    }

    async fn source(&self, request: SourceRequest) -> Result<Outcome, ProtocolError> {
        let path = canonical_path(&request.url);
        let entry = self.entries.get(&path).await?;
        if entry.is_deleted() {
            return Err(RepoError::NotFound(path).into());
        }

        Ok(Outcome::Source(SourceResponse::from_entry(
            &entry,
            &request.properties,
        )))
    }

    async fn update(&self, request: UpdateRequest) -> Result<Outcome, ProtocolError> {
        let path = canonical_path(&request.url);
        let UpdateRequest {
            add,
            replace,
            delete,
            ..
        } = request;

        let key = path.clone();
        let transform: UpdateFn = Box::new(move |mut entry: Entry| {
            if entry.is_deleted() {
                return Err(RepoError::NotFound(key));
            }

            entry.updated_at = Some(now());
            merge(&mut entry, add.as_ref(), replace.as_ref(), delete.as_ref());
            Ok(entry)
        });

        let entry = self.entries.update(&path, transform).await?;
        info!(path = %path, "Entry updated");

        Ok(relocated(&path, entry))
    }

    async fn delete(&self, url: &Url) -> Result<Outcome, ProtocolError> {
        let path = canonical_path(url);

        let key = path.clone();
        let transform: UpdateFn = Box::new(move |mut entry: Entry| {
            if entry.is_deleted() {
                return Err(RepoError::NotFound(key));
            }

            let now = now();
            entry.deleted_at = Some(now);
            entry.updated_at = Some(now);
            Ok(entry)
        });

        self.entries.update(&path, transform).await?;
        info!(path = %path, "Entry deleted");

        Ok(Outcome::Deleted)
    }

    async fn undelete(&self, url: &Url) -> Result<Outcome, ProtocolError> {
        let path = canonical_path(url);

        let transform: UpdateFn = Box::new(|mut entry: Entry| {
            entry.deleted_at = None;
            entry.updated_at = Some(now());
            Ok(entry)
        });

        let entry = self.entries.update(&path, transform).await?;
        info!(path = %path, "Entry undeleted");

        Ok(relocated(&path, entry))
    }

    /// `{base}/{YYYY}/{MM}/{slug}`, slug from `mp-slug` or a random id.
    fn mint_url(&self, commands: &Commands, at: Timestamp) -> Result<Url, ProtocolError> {
        let slug = commands
            .slug()
            .map(slugify)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        self.base_url
            .join(&format!("{:04}/{:02}/{slug}", at.year(), at.month()))
            .map_err(|e| ProtocolError::Validation(format!("cannot build permalink: {e}")))
    }
}

fn relocated(path: &str, entry: Entry) -> Outcome {
    if entry.path().as_deref() == Some(path) {
        Outcome::Modified(entry)
    } else {
        Outcome::Moved(entry)
    }
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());

    for c in raw.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_matches('-').to_string()
}
