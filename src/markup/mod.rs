//! Markup parser adapter
//!
//! Every component above this module queries parsed pages through
//! [`Document`]. The concrete parsing backend is chosen once, at start-up,
//! by probing each candidate against a canary page; after that the choice
//! is fixed for the whole run.

mod text;

pub use text::{
    collapse_whitespace, element_lines, element_text, element_text_without, is_block_element,
};

use crate::config::BackendPreference;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::sync::LazyLock;

static CANARY_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#page-content p").expect("valid selector"));
static CANARY_TAGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.page-tags a").expect("valid selector"));

/// Page used to check that a backend exposes the structure the extractors rely on
const CANARY_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>probe</title></head><body>
<div id="main-content"><div id="page-content"><p><strong>probe:</strong> ok</p></div>
<div class="page-tags"><span><a href="/system:page-tags/tag/probe">probe</a></span></div></div>
</body></html>"#;

/// Parsing backends the adapter can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Full HTML5 document parse with tree construction from `<html>` down
    Document,
    /// Lenient fragment parse in a `<body>` context; tolerates truncated pages
    Fragment,
}

impl Backend {
    fn parse(self, html: &str) -> Html {
        match self {
            Backend::Document => Html::parse_document(html),
            Backend::Fragment => Html::parse_fragment(html),
        }
    }

    /// Returns true if this backend finds the canary page's content and tag regions
    fn probe(self) -> bool {
        let html = self.parse(CANARY_PAGE);
        let content = html
            .select(&CANARY_CONTENT)
            .next()
            .map(|p| element_text(p) == "probe: ok")
            .unwrap_or(false);
        let tags = html.select(&CANARY_TAGS).next().is_some();
        content && tags
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Document => f.write_str("document"),
            Backend::Fragment => f.write_str("fragment"),
        }
    }
}

/// Parses HTML text into [`Document`]s using a backend fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupParser {
    backend: Backend,
}

impl MarkupParser {
    /// Selects a backend according to `preference`
    ///
    /// `Auto` tries the document backend first and falls back to the
    /// fragment backend. Fails only when no candidate passes the probe.
    ///
    /// # Example
    ///
    /// ```
    /// use scp_harvest::config::BackendPreference;
    /// use scp_harvest::markup::{Backend, MarkupParser};
    ///
    /// let parser = MarkupParser::detect(BackendPreference::Auto).unwrap();
    /// assert_eq!(parser.backend(), Backend::Document);
    /// ```
    pub fn detect(preference: BackendPreference) -> Result<Self, ConfigError> {
        let candidates: &[Backend] = match preference {
            BackendPreference::Auto => &[Backend::Document, Backend::Fragment],
            BackendPreference::Document => &[Backend::Document],
            BackendPreference::Fragment => &[Backend::Fragment],
        };
        Self::select_from(candidates, Backend::probe)
    }

    fn select_from(
        candidates: &[Backend],
        probe: impl Fn(Backend) -> bool,
    ) -> Result<Self, ConfigError> {
        for &backend in candidates {
            if probe(backend) {
                tracing::debug!("Using {} markup backend", backend);
                return Ok(Self { backend });
            }
            tracing::warn!("Markup backend {} failed its probe", backend);
        }

        let tried: Vec<String> = candidates.iter().map(|b| b.to_string()).collect();
        Err(ConfigError::NoMarkupBackend(format!(
            "tried: {}",
            tried.join(", ")
        )))
    }

    /// Uses `backend` without probing
    pub fn with_backend(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Parses `html`; malformed markup is repaired, never rejected
    pub fn parse(&self, html: &str) -> Document {
        Document {
            html: self.backend.parse(html),
        }
    }
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::with_backend(Backend::Document)
    }
}

/// A parsed page with the tree queries the extractors need
pub struct Document {
    html: Html,
}

impl Document {
    /// First element matching `selector`, in document order
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// All elements matching `selector`, in document order
    pub fn select_all<'a>(
        &'a self,
        selector: &'a Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(selector)
    }

    /// The root element of the tree
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Text of the whole page, one line per block-level element
    pub fn lines(&self) -> Vec<String> {
        element_lines(self.root())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").finish_non_exhaustive()
    }
}
