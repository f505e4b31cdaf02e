//! Series index caching
//!
//! Every entry of a series shares one index page. The cache makes sure that
//! page is fetched at most once per run, even when many entries of the same
//! series are extracted concurrently: the first caller loads it, the others
//! wait on the same cell and read the result.

use crate::resolve::SeriesIndex;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// A loaded series index
#[derive(Debug, Clone)]
pub struct CachedSeries {
    /// The parsed index
    pub index: Arc<SeriesIndex>,

    /// When the index page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedSeries {
    pub fn new(index: SeriesIndex) -> Self {
        Self {
            index: Arc::new(index),
            fetched_at: Utc::now(),
        }
    }

    /// How long ago the index page was fetched
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Outcome of loading one series: `None` records a failed fetch
type Slot = Arc<OnceCell<Option<CachedSeries>>>;

/// Run-scoped, single-flight cache of series indexes keyed by series number
///
/// A failed load is cached too, so a series whose index page is unreachable
/// is not retried by every entry that belongs to it.
#[derive(Debug, Default)]
pub struct SeriesCache {
    slots: Mutex<HashMap<u32, Slot>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, series: u32) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.entry(series).or_default().clone()
    }

    /// Returns the index for `series`, running `load` if no caller has yet
    ///
    /// Concurrent callers for the same series wait for the one running load
    /// instead of starting their own.
    pub async fn get_or_load<F, Fut>(&self, series: u32, load: F) -> Option<Arc<SeriesIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<SeriesIndex>>,
    {
        let slot = self.slot(series);
        let cached = slot
            .get_or_init(|| async move {
                let index = load().await;
                match &index {
                    Some(index) => {
                        tracing::debug!("Cached series {} index with {} names", series, index.len())
                    }
                    None => tracing::warn!("Series {} index unavailable for this run", series),
                }
                index.map(CachedSeries::new)
            })
            .await;
        cached.as_ref().map(|cached| Arc::clone(&cached.index))
    }

    /// Returns the cached entry for `series` without loading it
    ///
    /// `None` means the series has not finished loading or its load failed.
    pub fn peek(&self, series: u32) -> Option<CachedSeries> {
        let slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.get(&series)?.get()?.clone()
    }

    /// Number of series with a settled outcome, success or failure
    pub fn len(&self) -> usize {
        let slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
