//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/bookshelf/config.toml)
//! 3. Environment variables
//!
//! Environment variables take precedence over config file values. Most use
//! the `BOOKSHELF_` prefix; the blob store credential, its API address and
//! the CORS origin keep the names the hosting platform sets for them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::DOCUMENT_NAME;

/// Environment variable prefix
const ENV_PREFIX: &str = "BOOKSHELF";

/// Remote blob store credential
pub const BLOB_TOKEN_ENV: &str = "BLOB_READ_WRITE_TOKEN";
/// Remote blob store API address override
pub const BLOB_API_URL_ENV: &str = "VERCEL_BLOB_API_URL";
/// CORS origin override
pub const ALLOWED_ORIGIN_ENV: &str = "ALLOWED_ORIGIN";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the local copy of the collection
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP server listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Keep a local copy of the collection in `data_dir`
    #[serde(default = "default_local_copy")]
    pub local_copy: bool,

    /// Remote blob store token; remote storage is off without it
    #[serde(default)]
    pub blob_token: Option<String>,

    /// Remote blob store API address
    #[serde(default = "default_blob_api_url")]
    pub blob_api_url: String,

    /// Value of the Access-Control-Allow-Origin header
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Open Library base address
    #[serde(default = "default_open_library_url")]
    pub open_library_url: String,

    /// Google Books base address
    #[serde(default = "default_google_books_url")]
    pub google_books_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind: default_bind(),
            local_copy: default_local_copy(),
            blob_token: None,
            blob_api_url: default_blob_api_url(),
            allowed_origin: default_allowed_origin(),
            open_library_url: default_open_library_url(),
            google_books_url: default_google_books_url(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_BIND", ENV_PREFIX)) {
            if !val.is_empty() {
                self.bind = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOCAL_COPY", ENV_PREFIX)) {
            self.local_copy = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_OPEN_LIBRARY_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.open_library_url = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_GOOGLE_BOOKS_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.google_books_url = val;
            }
        }

        // Empty string clears the token
        if let Ok(val) = std::env::var(BLOB_TOKEN_ENV) {
            self.blob_token = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(BLOB_API_URL_ENV) {
            if !val.is_empty() {
                self.blob_api_url = val;
            }
        }

        if let Ok(val) = std::env::var(ALLOWED_ORIGIN_ENV) {
            if !val.is_empty() {
                self.allowed_origin = val;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if self.local_copy && !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with BOOKSHELF_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookshelf")
            .join("config.toml")
    }

    /// Path of the local copy of the collection
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_NAME)
    }

    /// Whether a remote blob store credential is configured
    pub fn has_blob_token(&self) -> bool {
        self.blob_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bookshelf")
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_local_copy() -> bool {
    true
}

fn default_blob_api_url() -> String {
    "https://blob.vercel-storage.com".to_string()
}

fn default_allowed_origin() -> String {
    "*".to_string()
}

fn default_open_library_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com".to_string()
}
