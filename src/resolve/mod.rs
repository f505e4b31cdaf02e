//! Display name resolution
//!
//! Entry pages do not reliably carry their own display name; the series
//! index pages do. This module fetches and caches those indexes and looks
//! entries up in them.

mod cache;
mod series;

pub use cache::{CachedSeries, SeriesCache};
pub use series::{series_url, SeriesIndex};

use crate::config::SiteConfig;
use crate::entry::EntryId;
use crate::fetch::Fetcher;
use crate::markup::MarkupParser;
use std::sync::Arc;

/// Resolves entry display names through their series index pages
///
/// Resolution never fails: an unreachable index or an entry missing from it
/// yields `None` and the record is emitted without a name.
#[derive(Clone)]
pub struct NameResolver {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<SeriesCache>,
    parser: MarkupParser,
    series_base_url: String,
}

impl NameResolver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<SeriesCache>,
        parser: MarkupParser,
        series_base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            parser,
            series_base_url: series_base_url.into(),
        }
    }

    /// Builds a resolver for the configured site
    pub fn from_site(
        site: &SiteConfig,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<SeriesCache>,
        parser: MarkupParser,
    ) -> Self {
        Self::new(fetcher, cache, parser, site.series_base_url.clone())
    }

    pub fn cache(&self) -> &Arc<SeriesCache> {
        &self.cache
    }

    /// Display name of `id`, if its series index lists one
    pub async fn resolve(&self, id: EntryId) -> Option<String> {
        let series = id.series();
        let index = self
            .cache
            .get_or_load(series, || self.load_index(series))
            .await?;

        let name = index.name_for(id);
        if name.is_none() {
            tracing::debug!("{} not listed in series {} index", id, series);
        }
        name
    }

    async fn load_index(&self, series: u32) -> Option<SeriesIndex> {
        let url = series_url(&self.series_base_url, series);
        tracing::info!("Fetching series {} index from {}", series, url);

        match self.fetcher.fetch(&url).await {
            // The parsed tree is not Send; it lives only inside from_html.
            Ok(html) => Some(SeriesIndex::from_html(&self.parser, &html)),
            Err(e) => {
                tracing::warn!("Failed to fetch series {} index: {}", series, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for NameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameResolver")
            .field("series_base_url", &self.series_base_url)
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}
