//! Tag extraction

use crate::markup::{element_text, Document};
use scraper::{ElementRef, Selector};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static PAGE_TAG_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.page-tags a").expect("valid selector"));
static HREF_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Case-insensitive set of tags to leave out of records
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    excluded: HashSet<String>,
}

impl TagFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: excluded
                .into_iter()
                .map(|tag| tag.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn is_excluded(&self, tag: &str) -> bool {
        self.excluded.contains(&tag.to_lowercase())
    }
}

/// Reads the page's content tags
///
/// Tags come from the page-tag region, which sits outside the content
/// container. If that region is missing or yields nothing, links inside the
/// content container pointing at a `/tag/` page are used instead.
pub fn extract_tags(
    document: &Document,
    container: Option<ElementRef<'_>>,
    filter: &TagFilter,
) -> BTreeSet<String> {
    let tags = collect(document.select_all(&PAGE_TAG_LINKS), filter);
    if !tags.is_empty() {
        return tags;
    }

    let Some(container) = container else {
        return tags;
    };

    let links = container.select(&HREF_LINKS).filter(|link| {
        link.value()
            .attr("href")
            .is_some_and(|href| href.contains("/tag/"))
    });
    collect(links, filter)
}

fn collect<'a>(links: impl Iterator<Item = ElementRef<'a>>, filter: &TagFilter) -> BTreeSet<String> {
    links
        .map(element_text)
        .filter(|tag| !tag.is_empty() && !filter.is_excluded(tag))
        .collect()
}
