//! Media store port - where uploaded files end up.

use async_trait::async_trait;
use url::Url;

use crate::error::MediaError;

/// An uploaded or stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Client file name on upload, storage name on download.
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the file and return its public URL.
    async fn upload(&self, file: MediaFile) -> Result<Url, MediaError>;

    /// Fetch a stored file by its storage name.
    async fn download(&self, name: &str) -> Result<MediaFile, MediaError>;
}
