//! Remote blob store
//!
//! The collection can live in a key/blob store addressed by pathname. The
//! store supports three operations: list blobs by prefix, fetch a blob's
//! content, and put (overwrite) a blob.
//!
//! [`VercelBlobClient`] talks to the Vercel Blob HTTP API. [`MemoryBlobStore`]
//! keeps blobs in process memory and is used when exercising the store
//! without network access.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{StorageError, StorageResult};

/// API version sent with every request
const API_VERSION: &str = "7";

/// A stored object as reported by the blob store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobObject {
    /// Name the object was stored under
    pub pathname: String,
    /// Address the content can be downloaded from
    pub url: String,
}

/// Key/blob storage used for the remote copy of the collection
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List objects whose pathname starts with `prefix`
    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobObject>>;

    /// Download an object's content
    async fn get(&self, blob: &BlobObject) -> StorageResult<Vec<u8>>;

    /// Store `content` under `pathname`, replacing any existing object
    async fn put(&self, pathname: &str, content: Vec<u8>) -> StorageResult<BlobObject>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<BlobObject>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

/// Client for the Vercel Blob HTTP API
pub struct VercelBlobClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl VercelBlobClient {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            token: token.into(),
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
    }
}

/// Turn a non-success response into an error carrying its body
async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> StorageResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::RemoteStatus {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl BlobStore for VercelBlobClient {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobObject>> {
        let mut blobs = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = vec![("prefix", prefix.to_string())];
            if let Some(c) = &cursor {
                query.push(("cursor", c.clone()));
            }

            let response = self
                .authorized(self.client.get(format!("{}/", self.api_url)))
                .query(&query)
                .send()
                .await
                .map_err(|e| StorageError::remote("list", e))?;
            let page: ListResponse = check_status("list", response)
                .await?
                .json()
                .await
                .map_err(|e| StorageError::remote("list", e))?;

            debug!("Blob list page returned {} objects", page.blobs.len());
            blobs.extend(page.blobs);

            match page.cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blobs)
    }

    async fn get(&self, blob: &BlobObject) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get(&blob.url)
            .send()
            .await
            .map_err(|e| StorageError::remote("get", e))?;
        let bytes = check_status("get", response)
            .await?
            .bytes()
            .await
            .map_err(|e| StorageError::remote("get", e))?;
        Ok(bytes.to_vec())
    }

    async fn put(&self, pathname: &str, content: Vec<u8>) -> StorageResult<BlobObject> {
        let response = self
            .authorized(self.client.put(format!("{}/{}", self.api_url, pathname)))
            .header("x-content-type", "application/json")
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .body(content)
            .send()
            .await
            .map_err(|e| StorageError::remote("put", e))?;
        check_status("put", response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::remote("put", e))
    }
}

/// Blob store held in process memory
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with HTTP 503 until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw content stored under `pathname`
    pub fn content(&self, pathname: &str) -> Option<Vec<u8>> {
        self.lock().get(pathname).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self, operation: &'static str) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::RemoteStatus {
                operation,
                status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                body: "blob store unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn object(pathname: &str) -> BlobObject {
        BlobObject {
            pathname: pathname.to_string(),
            url: format!("memory:///{}", pathname),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobObject>> {
        self.check_available("list")?;
        Ok(self
            .lock()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .map(|name| Self::object(name))
            .collect())
    }

    async fn get(&self, blob: &BlobObject) -> StorageResult<Vec<u8>> {
        self.check_available("get")?;
        self.content(&blob.pathname)
            .ok_or_else(|| StorageError::RemoteStatus {
                operation: "get",
                status: StatusCode::NOT_FOUND.as_u16(),
                body: format!("no blob at {}", blob.url),
            })
    }

    async fn put(&self, pathname: &str, content: Vec<u8>) -> StorageResult<BlobObject> {
        self.check_available("put")?;
        self.lock().insert(pathname.to_string(), content);
        Ok(Self::object(pathname))
    }
}
