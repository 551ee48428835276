//! Local copy of the collection
//!
//! Reads and writes `books.json` in the data directory. Writes are atomic
//! (write to a temp file, then rename) so a crash never leaves a half-written
//! document behind.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::{StorageError, StorageResult};
use crate::models::Book;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The collection document on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDocument {
    path: PathBuf,
}

impl LocalDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection
    ///
    /// Returns `None` if the file doesn't exist (or is empty).
    /// Returns an error if the file exists but can't be read or parsed.
    pub async fn load(&self) -> StorageResult<Option<Vec<Book>>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::ReadError {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let books = serde_json::from_slice(&bytes).map_err(|e| StorageError::InvalidFormat {
            location: self.path.display().to_string(),
            details: e.to_string(),
        })?;

        Ok(Some(books))
    }

    /// Replace the document with `content`
    pub async fn save(&self, content: &[u8]) -> StorageResult<()> {
        atomic_write(&self.path, content).await
    }
}

/// Write data to a file atomically
///
/// 1. Write to a uniquely named temp file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
async fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
    }

    // Concurrent saves each get their own temp file
    let temp_path = temp_path_for(path);

    let result = write_and_sync(&temp_path, data).await;
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::from_io(e, temp_path));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::AtomicWriteFailed {
            from: temp_path,
            to: path.to_path_buf(),
            source: e,
        });
    }

    Ok(())
}

async fn write_and_sync(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn temp_path_for(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn book(id: i64, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            cover: None,
            status: "wishlist".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let doc = LocalDocument::new(temp_dir.path().join("books.json"));

        assert!(!doc.path().exists());
        assert!(doc.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let doc = LocalDocument::new(temp_dir.path().join("books.json"));

        let books = vec![book(1, "Dune"), book(2, "Emma")];
        let content = serde_json::to_vec_pretty(&books).unwrap();
        doc.save(&content).await.unwrap();

        assert!(doc.path().exists());
        assert_eq!(doc.load().await.unwrap().unwrap(), books);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_invalid_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = LocalDocument::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidFormat { .. }));
    }

    #[tokio::test]
    async fn test_empty_file_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        std::fs::write(&path, "\n").unwrap();

        assert!(LocalDocument::new(&path).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("books.json");

        atomic_write(&nested_path, b"[]").await.unwrap();

        let content = std::fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "[]");
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");

        atomic_write(&path, b"[]").await.unwrap();
        atomic_write(&path, b"[1]").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1]");
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let path = Path::new("/data/books.json");
        assert_ne!(temp_path_for(path), temp_path_for(path));
        assert_eq!(temp_path_for(path).parent(), path.parent());
    }
}
