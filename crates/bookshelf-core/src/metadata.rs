//! Book metadata lookup
//!
//! Resolves an ISBN (or a bare title) into a title and cover URL. Providers
//! are tried in order; a provider that errors or finds nothing just hands
//! over to the next one. When every provider comes up empty, a supplied title
//! is used with a placeholder cover.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::BookMetadata;

/// Cover used when only a title is known
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/150x220?text=No+Cover";

/// User agent sent to metadata providers
const USER_AGENT: &str = concat!("bookshelf/", env!("CARGO_PKG_VERSION"));

/// A source of book metadata keyed by ISBN
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Look up a book; `Ok(None)` means the provider has nothing usable
    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>>;
}

/// Open Library `/isbn/{isbn}.json`
pub struct OpenLibrary {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibrary {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetadataProvider for OpenLibrary {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid Open Library base URL: {}", self.base_url))?
            .pop_if_empty()
            .push("isbn")
            .push(&format!("{}.json", isbn));

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            debug!("Open Library returned {} for {}", response.status(), isbn);
            return Ok(None);
        }

        let body: Value = response.json().await?;
        Ok(parse_open_library(isbn, &body))
    }
}

/// Google Books `/books/v1/volumes?q=isbn:{isbn}`
pub struct GoogleBooks {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleBooks {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetadataProvider for GoogleBooks {
    fn name(&self) -> &'static str {
        "googlebooks"
    }

    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>> {
        let url = format!("{}/books/v1/volumes", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await?;
        if !response.status().is_success() {
            debug!("Google Books returned {} for {}", response.status(), isbn);
            return Ok(None);
        }

        let body: Value = response.json().await?;
        Ok(parse_google_books(&body))
    }
}

/// Normalize an Open Library edition record
///
/// The edition record carries no cover link, so the cover is addressed by
/// ISBN on the covers host.
fn parse_open_library(isbn: &str, body: &Value) -> Option<BookMetadata> {
    let title = non_empty_str(body.get("title"))?;
    let cover = format!("https://covers.openlibrary.org/b/isbn/{}-L.jpg", isbn);
    Some(BookMetadata::new(title, Some(cover)))
}

/// Normalize the first volume of a Google Books search
fn parse_google_books(body: &Value) -> Option<BookMetadata> {
    let info = body.get("items")?.as_array()?.first()?.get("volumeInfo")?;
    let title = non_empty_str(info.get("title"))?;
    let cover = info
        .get("imageLinks")
        .and_then(|links| non_empty_str(links.get("thumbnail")))
        .map(upgrade_to_https);
    Some(BookMetadata::new(title, cover))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Rewrite an `http://` URL to `https://`
pub fn upgrade_to_https(url: String) -> String {
    match url.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => format!("https://{}", &url[7..]),
        _ => url,
    }
}

/// Ordered provider chain with a title fallback
pub struct MetadataResolver {
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl MetadataResolver {
    pub fn new(providers: Vec<Box<dyn MetadataProvider>>) -> Self {
        Self { providers }
    }

    /// Open Library first, then Google Books
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(vec![
            Box::new(OpenLibrary::new(client.clone(), &config.open_library_url)),
            Box::new(GoogleBooks::new(client, &config.google_books_url)),
        ])
    }

    /// HTTP client suitable for the providers
    pub fn http_client() -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
    }

    /// Resolve metadata from an ISBN and/or a title
    ///
    /// Returns `None` only when no provider found the ISBN and no title was
    /// given.
    pub async fn resolve(&self, isbn: Option<&str>, title: Option<&str>) -> Option<BookMetadata> {
        if let Some(isbn) = isbn.map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(found) = self.lookup(isbn).await {
                return Some(found);
            }
        }

        title
            .filter(|t| !t.is_empty())
            .map(|t| BookMetadata::new(t, Some(PLACEHOLDER_COVER.to_string())))
    }

    async fn lookup(&self, isbn: &str) -> Option<BookMetadata> {
        for provider in &self.providers {
            match provider.lookup(isbn).await {
                Ok(Some(found)) => {
                    debug!("{} resolved {} to {:?}", provider.name(), isbn, found.title);
                    return Some(found);
                }
                Ok(None) => debug!("{} has no result for {}", provider.name(), isbn),
                Err(e) => warn!("{} lookup for {} failed: {}", provider.name(), isbn, e),
            }
        }
        None
    }
}
