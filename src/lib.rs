//! scp-harvest: structured record extraction for SCP wiki entries
//!
//! This crate fetches catalogued entry pages, segments their main content into
//! labelled blocks, classifies those blocks into canonical fields, and resolves
//! cross-page metadata (series membership and display name) into one record per
//! entry.

pub mod config;
pub mod entry;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod markup;
pub mod output;
pub mod resolve;

use thiserror::Error;

/// Main error type for scp-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Invalid identifier {id}: {reason}")]
    InvalidIdentifier { id: i64, reason: String },

    #[error("Invalid range [{start}, {end}]: {reason}")]
    InvalidRange { start: i64, end: i64, reason: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("No usable markup backend: {0}")]
    NoMarkupBackend(String),
}

/// Errors raised when a page does not follow the expected site layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("content container missing")]
    ContentContainerMissing,
}

/// Failure reported by a document fetcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error for {url}: {message}")]
pub struct TransportError {
    /// The URL that could not be fetched
    pub url: String,

    /// Human readable description of the failure
    pub message: String,

    /// Whether repeating the request could succeed
    pub retryable: bool,

    /// HTTP status, when the server answered
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            retryable,
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Result type alias for scp-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use entry::EntryId;
pub use extract::{CanonicalField, ScpRecord};
pub use fetch::{Fetcher, HttpFetcher};
pub use harvest::{BatchOutcome, CancelFlag, Harvester};
pub use markup::{Document, MarkupParser};
pub use resolve::{NameResolver, SeriesCache};
