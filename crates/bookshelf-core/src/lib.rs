//! Bookshelf Core Library
//!
//! This crate provides the core functionality for Bookshelf, a small
//! personal book tracker: book records, the collection document they are
//! stored in, and ISBN metadata lookup.
//!
//! # Architecture
//!
//! - The whole collection is one JSON document (`books.json`)
//! - Every change is a full load, in-memory edit, full save
//! - The document lives in a local file and/or a remote blob store
//!
//! # Quick Start
//!
//! ```text
//! let store = BookStore::from_config(&config, client.clone());
//! let resolver = MetadataResolver::from_config(&config, client);
//!
//! let metadata = resolver.resolve(Some("9780441013593"), None).await?;
//! let mut books = store.load_all().await?;
//! collection::append(&mut books, Book::new(ids.next_id(), metadata, None));
//! store.save_all(&books).await?;
//! ```
//!
//! # Modules
//!
//! - `models`: Book record and resolved metadata
//! - `collection`: In-memory edits on a loaded collection
//! - `id`: Book id generation
//! - `store`: Whole-collection persistence (main entry point)
//! - `storage`: Local file and blob store backends
//! - `metadata`: ISBN lookup with provider fallback
//! - `config`: Application configuration

pub mod collection;
pub mod config;
pub mod id;
pub mod metadata;
pub mod models;
pub mod storage;
pub mod store;

pub use config::Config;
pub use id::IdGenerator;
pub use metadata::{MetadataProvider, MetadataResolver};
pub use models::{Book, BookMetadata, DEFAULT_STATUS};
pub use storage::{StorageError, StorageResult};
pub use store::{BookRepository, BookStore};
