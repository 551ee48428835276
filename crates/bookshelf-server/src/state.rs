//! Shared handler state

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use bookshelf_core::{BookRepository, BookStore, Config, IdGenerator, MetadataResolver};

/// Everything a handler needs, cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn BookRepository>,
    pub resolver: Arc<MetadataResolver>,
    pub ids: Arc<IdGenerator>,
    pub allowed_origin: HeaderValue,
    pub blob_token_set: bool,
}

impl AppState {
    pub fn new(repository: Arc<dyn BookRepository>, resolver: MetadataResolver) -> Self {
        Self {
            repository,
            resolver: Arc::new(resolver),
            ids: Arc::new(IdGenerator::new()),
            allowed_origin: HeaderValue::from_static("*"),
            blob_token_set: false,
        }
    }

    /// Build the store and resolver from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = MetadataResolver::http_client().context("Failed to build HTTP client")?;
        let store = BookStore::from_config(config, client.clone());
        let resolver = MetadataResolver::from_config(config, client);

        let state = Self::new(Arc::new(store), resolver)
            .with_allowed_origin(&config.allowed_origin)?
            .with_blob_token_set(config.has_blob_token());
        Ok(state)
    }

    pub fn with_allowed_origin(mut self, origin: &str) -> Result<Self> {
        self.allowed_origin = HeaderValue::from_str(origin)
            .with_context(|| format!("Invalid allowed origin: {:?}", origin))?;
        Ok(self)
    }

    pub fn with_blob_token_set(mut self, set: bool) -> Self {
        self.blob_token_set = set;
        self
    }
}
