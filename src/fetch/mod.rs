//! Document fetching
//!
//! The extraction pipeline only needs "give me the HTML behind this URL".
//! That capability is the [`Fetcher`] trait; [`HttpFetcher`] is the
//! production implementation with retries, and tests substitute their own.

mod http;

pub use http::{build_http_client, HttpFetcher};

use crate::TransportError;
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can turn a URL into an HTML document
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the response body as text
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        (**self).fetch(url).await
    }
}
