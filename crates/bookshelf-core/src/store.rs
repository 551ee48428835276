//! Collection storage
//!
//! [`BookRepository`] is the seam between request handling and persistence:
//! load the whole collection, save the whole collection. [`BookStore`] is the
//! implementation backed by a local file and/or a remote blob store.
//!
//! ## Read order
//!
//! 1. Local copy, if present and parseable
//! 2. Remote blob named `books.json`, if a blob store is configured
//! 3. Empty collection
//!
//! ## Write policy
//!
//! The local copy is written first and its failure is only logged. The remote
//! upload failing is an error only when the remote store is the sole copy
//! (local copy disabled, or its write just failed).
//!
//! There is no locking and no version check: two overlapping
//! load-modify-save cycles keep whichever save lands last.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::Book;
use crate::storage::{
    BlobStore, LocalDocument, StorageError, StorageResult, VercelBlobClient, DOCUMENT_NAME,
};

/// Whole-collection persistence
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Read the full collection
    async fn load_all(&self) -> StorageResult<Vec<Book>>;

    /// Replace the full collection
    async fn save_all(&self, books: &[Book]) -> StorageResult<()>;
}

/// Repository backed by a local file and/or a remote blob store
pub struct BookStore {
    local: Option<LocalDocument>,
    remote: Option<Arc<dyn BlobStore>>,
}

impl BookStore {
    pub fn new(local: Option<LocalDocument>, remote: Option<Arc<dyn BlobStore>>) -> Self {
        Self { local, remote }
    }

    /// Build the store described by the configuration
    ///
    /// The remote store is only used when a blob token is configured.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let local = config
            .local_copy
            .then(|| LocalDocument::new(config.document_path()));

        let remote = match config.blob_token.as_deref() {
            Some(token) if !token.is_empty() => {
                let client = VercelBlobClient::new(client, &config.blob_api_url, token);
                Some(Arc::new(client) as Arc<dyn BlobStore>)
            }
            _ => None,
        };

        info!(
            "Storage: local copy {}, remote store {}",
            local
                .as_ref()
                .map(|l| l.path().display().to_string())
                .unwrap_or_else(|| "disabled".to_string()),
            if remote.is_some() { "enabled" } else { "disabled" }
        );

        Self::new(local, remote)
    }

    async fn load_remote(&self, remote: &dyn BlobStore) -> StorageResult<Vec<Book>> {
        let blobs = remote.list(DOCUMENT_NAME).await?;
        let Some(blob) = blobs.into_iter().find(|b| b.pathname == DOCUMENT_NAME) else {
            debug!("No remote {} yet, starting empty", DOCUMENT_NAME);
            return Ok(Vec::new());
        };

        let bytes = remote.get(&blob).await?;
        serde_json::from_slice(&bytes).map_err(|e| StorageError::InvalidFormat {
            location: blob.url.clone(),
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl BookRepository for BookStore {
    async fn load_all(&self) -> StorageResult<Vec<Book>> {
        if let Some(local) = &self.local {
            match local.load().await {
                Ok(Some(books)) => {
                    debug!("Loaded {} books from {:?}", books.len(), local.path());
                    return Ok(books);
                }
                Ok(None) => debug!("No local copy at {:?}", local.path()),
                Err(e) => warn!("Ignoring unreadable local copy: {}", e),
            }
        }

        match &self.remote {
            Some(remote) => {
                let books = self.load_remote(remote.as_ref()).await?;
                debug!("Loaded {} books from blob store", books.len());
                Ok(books)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save_all(&self, books: &[Book]) -> StorageResult<()> {
        let content = serde_json::to_vec_pretty(books)?;

        let mut local_error = None;
        if let Some(local) = &self.local {
            match local.save(&content).await {
                Ok(()) => debug!("Saved {} books to {:?}", books.len(), local.path()),
                Err(e) => {
                    warn!("Local write failed: {}", e);
                    local_error = Some(e);
                }
            }
        }
        let local_saved = self.local.is_some() && local_error.is_none();

        let Some(remote) = &self.remote else {
            return match (local_error, self.local.is_some()) {
                (Some(e), _) => Err(e),
                (None, true) => Ok(()),
                (None, false) => Err(StorageError::NoBackend),
            };
        };

        match remote.put(DOCUMENT_NAME, content).await {
            Ok(blob) => {
                debug!("Uploaded {} books to {}", books.len(), blob.url);
                Ok(())
            }
            Err(e) if local_saved => {
                warn!("Upload failed, remote copy is behind the local copy: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection;
    use crate::storage::MemoryBlobStore;
    use tempfile::TempDir;

    fn book(id: i64, title: &str, status: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            cover: Some(format!("https://covers.example.com/{}.jpg", id)),
            status: status.to_string(),
        }
    }

    fn local(temp_dir: &TempDir) -> LocalDocument {
        LocalDocument::new(temp_dir.path().join(DOCUMENT_NAME))
    }

    fn sample() -> Vec<Book> {
        vec![
            book(1, "Dune", "reading"),
            book(2, "Emma", "wishlist"),
            book(3, "Ulysses", "read"),
        ]
    }

    #[tokio::test]
    async fn test_empty_when_nothing_configured() {
        let store = BookStore::new(None, None);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_backend_fails() {
        let store = BookStore::new(None, None);
        let err = store.save_all(&sample()).await.unwrap_err();
        assert!(matches!(err, StorageError::NoBackend));
    }

    #[tokio::test]
    async fn test_local_roundtrip_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = BookStore::new(Some(local(&temp_dir)), None);
        store.save_all(&sample()).await.unwrap();
        let first = std::fs::read(temp_dir.path().join(DOCUMENT_NAME)).unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, sample());
        store.save_all(&loaded).await.unwrap();

        let second = std::fs::read(temp_dir.path().join(DOCUMENT_NAME)).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sparse_records_load_and_survive_save() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(DOCUMENT_NAME),
            r#"[
                {"id": 1, "title": "Dune", "cover": null, "status": "read"},
                {"id": 2, "cover": null, "status": "wishlist"},
                {"id": 3, "title": "Emma", "cover": null, "status": null}
            ]"#,
        )
        .unwrap();
        let store = BookStore::new(Some(local(&temp_dir)), None);

        let mut books = store.load_all().await.unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(collection::with_status(&books, "read").len(), 1);

        collection::append(&mut books, book(4, "New", "wishlist"));
        store.save_all(&books).await.unwrap();

        let reloaded = store.load_all().await.unwrap();
        let ids: Vec<i64> = reloaded.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(reloaded[1].title, "");
        assert_eq!(reloaded[2].status, "");
    }

    #[tokio::test]
    async fn test_document_is_pretty_printed() {
        let temp_dir = TempDir::new().unwrap();
        let store = BookStore::new(Some(local(&temp_dir)), None);
        store.save_all(&sample()[..1]).await.unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join(DOCUMENT_NAME)).unwrap();
        assert!(content.starts_with("[\n  {\n    \"id\": 1,"));
    }

    #[tokio::test]
    async fn test_local_copy_wins_over_remote() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(MemoryBlobStore::new());
        remote
            .put(DOCUMENT_NAME, serde_json::to_vec(&sample()).unwrap())
            .await
            .unwrap();

        let doc = local(&temp_dir);
        doc.save(&serde_json::to_vec(&sample()[..1]).unwrap())
            .await
            .unwrap();

        let store = BookStore::new(Some(doc), Some(remote));
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_remote_without_local_file() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(MemoryBlobStore::new());
        remote
            .put(DOCUMENT_NAME, serde_json::to_vec(&sample()).unwrap())
            .await
            .unwrap();

        let store = BookStore::new(Some(local(&temp_dir)), Some(remote));
        assert_eq!(store.load_all().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_corrupt_local_copy_falls_through_to_remote() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(DOCUMENT_NAME), "not json").unwrap();
        let remote = Arc::new(MemoryBlobStore::new());
        remote
            .put(DOCUMENT_NAME, serde_json::to_vec(&sample()).unwrap())
            .await
            .unwrap();

        let store = BookStore::new(Some(local(&temp_dir)), Some(remote));
        assert_eq!(store.load_all().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_corrupt_local_copy_without_remote_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(DOCUMENT_NAME), "not json").unwrap();

        let store = BookStore::new(Some(local(&temp_dir)), None);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_remote_blob_is_empty() {
        let store = BookStore::new(None, Some(Arc::new(MemoryBlobStore::new())));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_remote_fails_load() {
        let remote = Arc::new(MemoryBlobStore::new());
        remote.set_unavailable(true);

        let store = BookStore::new(None, Some(remote));
        assert!(store.load_all().await.is_err());
    }

    #[tokio::test]
    async fn test_save_writes_both_copies() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(MemoryBlobStore::new());
        let store = BookStore::new(Some(local(&temp_dir)), Some(remote.clone()));

        store.save_all(&sample()).await.unwrap();

        let on_disk = std::fs::read(temp_dir.path().join(DOCUMENT_NAME)).unwrap();
        assert_eq!(remote.content(DOCUMENT_NAME).unwrap(), on_disk);
    }

    #[tokio::test]
    async fn test_remote_failure_tolerated_with_local_copy() {
        let temp_dir = TempDir::new().unwrap();
        let remote = Arc::new(MemoryBlobStore::new());
        remote.set_unavailable(true);
        let store = BookStore::new(Some(local(&temp_dir)), Some(remote.clone()));

        store.save_all(&sample()).await.unwrap();
        assert!(remote.content(DOCUMENT_NAME).is_none());
        assert_eq!(store.load_all().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_remote_failure_is_error_when_sole_copy() {
        let remote = Arc::new(MemoryBlobStore::new());
        remote.set_unavailable(true);
        let store = BookStore::new(None, Some(remote));

        let err = store.save_all(&sample()).await.unwrap_err();
        assert!(matches!(err, StorageError::RemoteStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_remote_only_roundtrip() {
        let store = BookStore::new(None, Some(Arc::new(MemoryBlobStore::new())));
        store.save_all(&sample()).await.unwrap();
        assert_eq!(store.load_all().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_overlapping_writers_lose_first_update() {
        let temp_dir = TempDir::new().unwrap();
        let store = BookStore::new(Some(local(&temp_dir)), None);
        store.save_all(&sample()).await.unwrap();

        // Both requests load before either saves
        let mut first = store.load_all().await.unwrap();
        let mut second = store.load_all().await.unwrap();

        collection::append(&mut first, book(4, "Walden", "wishlist"));
        store.save_all(&first).await.unwrap();

        collection::update_status(&mut second, "1", "read").unwrap();
        store.save_all(&second).await.unwrap();

        let current = store.load_all().await.unwrap();
        assert_eq!(current.len(), 3);
        assert!(collection::find_by_id(&current, "4").is_none());
        assert_eq!(current[0].status, "read");
    }

    #[test]
    fn test_from_config_without_token_has_no_remote() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            blob_token: None,
            ..Config::default()
        };

        let store = BookStore::from_config(&config, reqwest::Client::new());
        assert!(store.remote.is_none());
        assert!(store.local.is_some());
    }

    #[test]
    fn test_from_config_with_token_has_remote() {
        let config = Config {
            local_copy: false,
            blob_token: Some("token".to_string()),
            ..Config::default()
        };

        let store = BookStore::from_config(&config, reqwest::Client::new());
        assert!(store.remote.is_some());
        assert!(store.local.is_none());
    }
}
