//! Harvester - per-entry extraction and batch orchestration

use crate::config::{validate_range, Config};
use crate::entry::EntryId;
use crate::extract::{assemble, ExtractOptions, ScpRecord};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::harvest::{BatchOutcome, CancelFlag};
use crate::markup::MarkupParser;
use crate::resolve::{NameResolver, SeriesCache};
use crate::{ConfigError, HarvestError, StructureError};
use futures_util::future;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// How many finished entries between progress reports
const PROGRESS_INTERVAL: usize = 10;

/// Runs the extraction pipeline for single entries and identifier ranges
pub struct Harvester {
    fetcher: Arc<dyn Fetcher>,
    resolver: NameResolver,
    parser: MarkupParser,
    options: ExtractOptions,
    entry_base_url: String,
    max_concurrent: usize,
    cancel: CancelFlag,
}

impl Harvester {
    /// Creates a harvester around an existing fetcher and series cache
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `fetcher` - Source of entry and series pages
    /// * `cache` - Series cache for this run
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - No markup backend passed its probe
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<SeriesCache>,
    ) -> Result<Self, HarvestError> {
        let parser = MarkupParser::detect(config.parser.backend)?;
        let resolver = NameResolver::from_site(&config.site, Arc::clone(&fetcher), cache, parser);

        Ok(Self {
            fetcher,
            resolver,
            parser,
            options: ExtractOptions::from_config(&config.extract),
            entry_base_url: config.site.entry_base_url.clone(),
            max_concurrent: config.batch.max_concurrent.max(1),
            cancel: CancelFlag::new(),
        })
    }

    /// Creates a harvester with an HTTP fetcher and a fresh series cache
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Self::new(config, fetcher, Arc::new(SeriesCache::new()))
    }

    /// Handle that stops the run before the next entry starts
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn parser(&self) -> MarkupParser {
        self.parser
    }

    pub fn series_cache(&self) -> &Arc<SeriesCache> {
        self.resolver.cache()
    }

    /// URL of the entry page for `id`
    pub fn entry_url(&self, id: EntryId) -> String {
        format!("{}{}", self.entry_base_url, id.padded())
    }

    /// Extracts one entry
    ///
    /// The entry page is fetched first; its failure aborts the entry. The
    /// display name is resolved afterwards and degrades to absent.
    pub async fn extract_one(&self, id: EntryId) -> Result<ScpRecord, HarvestError> {
        let url = self.entry_url(id);
        let page_url = Url::parse(&url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", url, e)))?;

        tracing::debug!("Fetching {} from {}", id, url);
        let html = self.fetcher.fetch(&url).await?;

        let name = self.resolver.resolve(id).await;

        let record = self.assemble_page(id, &html, &page_url, name)?;
        Ok(record)
    }

    /// Parses and assembles synchronously; the parsed tree never crosses an await
    fn assemble_page(
        &self,
        id: EntryId,
        html: &str,
        page_url: &Url,
        name: Option<String>,
    ) -> Result<ScpRecord, StructureError> {
        let document = self.parser.parse(html);
        assemble(id, &document, page_url, name, &self.options)
    }

    /// Extracts every identifier in `[start, end]`
    ///
    /// Entries run with bounded concurrency. Failed entries are collected in
    /// `failed_ids`; the run itself only fails on an invalid range. The cancel
    /// flag is cleared on return.
    pub async fn run(&self, start: i64, end: i64) -> Result<BatchOutcome, HarvestError> {
        validate_range(start, end).map_err(|e| HarvestError::InvalidRange {
            start,
            end,
            reason: match e {
                ConfigError::Validation(reason) => reason,
                other => other.to_string(),
            },
        })?;

        let total = (end - start + 1) as usize;
        tracing::info!(
            "Harvesting {} entries [{}, {}] with concurrency {}",
            total,
            start,
            end,
            self.max_concurrent
        );

        let start_time = Instant::now();
        let mut outcome = BatchOutcome::default();
        let cancel = self.cancel.clone();

        let mut results = stream::iter(start..=end)
            .take_while(move |_| future::ready(!cancel.is_cancelled()))
            .map(|raw| async move { (raw, self.extract_raw(raw).await) })
            .buffer_unordered(self.max_concurrent);

        while let Some((raw, result)) = results.next().await {
            let id = raw as u32;
            match result {
                Ok(record) => outcome.record_success(id, record),
                Err(e) => {
                    tracing::error!("Failed to extract SCP-{:03}: {}", id, e);
                    outcome.record_failure(id, e.to_string());
                }
            }

            let done = outcome.attempted();
            if done % PROGRESS_INTERVAL == 0 {
                let rate = done as f64 / start_time.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {}/{} entries, {} failed, {:.2} entries/sec",
                    done,
                    total,
                    outcome.failed_ids.len(),
                    rate
                );
            }
        }

        let cancelled = self.cancel.is_cancelled() && outcome.attempted() < total;
        self.cancel.reset();
        outcome.finish(cancelled);

        if cancelled {
            tracing::warn!(
                "Run cancelled after {} of {} entries",
                outcome.attempted(),
                total
            );
        }
        tracing::info!(
            "Harvest completed: {} records, {} failed, {} with warnings in {:?}",
            outcome.records.len(),
            outcome.failed_ids.len(),
            outcome.warnings(),
            start_time.elapsed()
        );

        Ok(outcome)
    }

    async fn extract_raw(&self, raw: i64) -> Result<ScpRecord, HarvestError> {
        let id = EntryId::new(raw)?;
        self.extract_one(id).await
    }
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("entry_base_url", &self.entry_base_url)
            .field("max_concurrent", &self.max_concurrent)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
