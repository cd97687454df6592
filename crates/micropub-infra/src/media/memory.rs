//! In-memory media store.
//!
//! Note: Files are lost on process restart.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use tokio::sync::RwLock;
use url::Url;

use micropub_core::error::MediaError;
use micropub_core::ports::{MediaFile, MediaStore};

/// Random bytes in a generated file name.
const NAME_ENTROPY: usize = 32;

/// Media store keeping uploaded files in a `HashMap`.
///
/// Files are published under `{base_url}media/{name}`.
pub struct InMemoryMediaStore {
    base_url: Url,
    store: RwLock<HashMap<String, MediaFile>>,
}

impl InMemoryMediaStore {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            base_url,
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Random URL-safe name keeping the original extension.
    ///
    /// Extensions that are not plain ASCII alphanumerics are dropped so the
    /// name is always a single URL path segment.
    fn generate_name(original: &str) -> String {
        let mut bytes = [0u8; NAME_ENTROPY];
        rand::thread_rng().fill_bytes(&mut bytes);

        let mut name = URL_SAFE_NO_PAD.encode(bytes);
        let ext = Path::new(original)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));
        if let Some(ext) = ext {
            name.push('.');
            name.push_str(&ext.to_ascii_lowercase());
        }

        name
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, file: MediaFile) -> Result<Url, MediaError> {
        if file.content.is_empty() {
            return Err(MediaError::Empty);
        }

        let name = Self::generate_name(&file.name);
        let url = self
            .base_url
            .join(&format!("media/{name}"))
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        tracing::debug!(original = %file.name, name = %name, size = file.content.len(), "Storing media");

        let mut store = self.store.write().await;
        store.insert(
            name.clone(),
            MediaFile {
                name,
                content_type: file.content_type,
                content: file.content,
            },
        );

        Ok(url)
    }

    async fn download(&self, name: &str) -> Result<MediaFile, MediaError> {
        let store = self.store.read().await;

        store
            .get(name)
            .cloned()
            .ok_or_else(|| MediaError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryMediaStore {
        InMemoryMediaStore::new(Url::parse("https://example.com/site").unwrap())
    }

    fn file(name: &str, content: &[u8]) -> MediaFile {
        MediaFile {
            name: name.to_string(),
            content_type: "image/png".to_string(),
            content: content.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let store = store();
        let url = store.upload(file("Pic.PNG", b"png")).await.unwrap();

        assert!(url.as_str().starts_with("https://example.com/site/media/"));
        let name = url.path_segments().unwrap().last().unwrap().to_string();
        assert!(name.ends_with(".png"));
        // 32 bytes encode to 43 unpadded base64 characters.
        assert_eq!(name.len(), 43 + ".png".len());

        let stored = store.download(&name).await.unwrap();
        assert_eq!(stored.content, b"png");
        assert_eq!(stored.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_unsafe_extension_is_dropped() {
        let store = store();

        for original in ["a.j?g", "b.p#g", "c.we bp", "noext"] {
            let url = store.upload(file(original, b"x")).await.unwrap();
            let name = url.path_segments().unwrap().last().unwrap().to_string();

            assert_eq!(name.len(), 43, "{original} -> {url}");
            assert!(url.query().is_none() && url.fragment().is_none());
            assert!(store.download(&name).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let store = store();
        let a = store.upload(file("a.jpg", b"1")).await.unwrap();
        let b = store.upload(file("a.jpg", b"1")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_and_missing_files() {
        let store = store();
        assert!(matches!(
            store.upload(file("a.jpg", b"")).await,
            Err(MediaError::Empty)
        ));
        assert!(matches!(
            store.download("nope.jpg").await,
            Err(MediaError::NotFound(_))
        ));
    }
}
