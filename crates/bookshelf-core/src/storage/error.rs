//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stored document is not a JSON array of books
    #[error("Invalid document format in '{location}': {details}")]
    InvalidFormat { location: String, details: String },

    /// Collection could not be serialized
    #[error("Failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Blob store request failed before a response arrived
    #[error("Blob store {operation} failed: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Blob store answered with a non-success status
    #[error("Blob store {operation} returned HTTP {status}: {body}")]
    RemoteStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Neither a local copy nor a remote store is configured
    #[error("No storage backend configured: enable the local copy or set BLOB_READ_WRITE_TOKEN")]
    NoBackend,
}

impl StorageError {
    /// Create an error from an I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Wrap a transport error from the blob store
    pub fn remote(operation: &'static str, source: reqwest::Error) -> Self {
        StorageError::Remote { operation, source }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions on the data directory.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::RemoteStatus { status: 401 | 403, .. } => {
                Some("Check that BLOB_READ_WRITE_TOKEN is valid for this blob store.")
            }
            StorageError::NoBackend => {
                Some("Set BOOKSHELF_LOCAL_COPY=true or provide BLOB_READ_WRITE_TOKEN.")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
