//! Storage layer
//!
//! The collection is persisted as one pretty-printed JSON document named
//! [`DOCUMENT_NAME`], kept in up to two places:
//!
//! - **Local copy**: a file in the data directory
//! - **Remote blob**: an object of the same name in a blob store
//!
//! [`crate::store::BookStore`] decides which copy is read and which are
//! written.

pub mod blob;
pub mod error;
pub mod local;

pub use blob::{BlobObject, BlobStore, MemoryBlobStore, VercelBlobClient};
pub use error::{StorageError, StorageResult};
pub use local::LocalDocument;

/// Well-known name of the collection document
pub const DOCUMENT_NAME: &str = "books.json";
