//! Section segmentation
//!
//! Splits the main content container of an entry page into an ordered list
//! of labelled [`RawBlock`]s. A block starts at every heading-level element
//! and collects everything up to the next one. Two shapes count as headings:
//!
//! - `h1`..`h6` elements, labelled by their text;
//! - inline-label paragraphs, `<p><strong>项目等级：</strong>Euclid</p>`,
//!   labelled by the bold text, with the rest of the paragraph opening the
//!   block body.
//!
//! Heading level carries no meaning here: an `h4` after an `h2` opens a
//! sibling block, not a child.

use crate::markup::{collapse_whitespace, element_text, element_text_without, Document};
use crate::StructureError;
use scraper::{ElementRef, Node, Selector};
use std::sync::LazyLock;

static CONTENT_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#page-content").expect("valid selector"));

/// Longest bold run still treated as an inline label
pub const MAX_INLINE_LABEL_CHARS: usize = 48;

/// Wrappers that are descended into when they hold a heading
const WRAPPER_ELEMENTS: &[&str] = &["div", "blockquote", "section", "article"];

/// Site widgets rendered inside the content container that are not entry content
const CHROME_CLASSES: &[&str] = &[
    "page-rate-widget-box",
    "rate-box-with-credit-button",
    "creditRate",
    "footer-wikiwalk-nav",
    "licensebox",
];

/// Characters that open the previous/next navigation line at the page bottom
const NAVIGATION_MARKERS: &[char] = &['«', '‹'];

/// One labelled run of content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    /// Heading text, verbatim apart from whitespace collapsing
    pub label: String,

    /// Content fragments in document order
    pub fragments: Vec<String>,
}

impl RawBlock {
    fn new(label: String) -> Self {
        Self {
            label,
            fragments: Vec::new(),
        }
    }
}

/// Output of [`segment`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments {
    /// Fragments seen before the first heading
    pub preamble: Vec<String>,

    /// Labelled blocks in document order
    pub blocks: Vec<RawBlock>,
}

/// Finds the main content container of an entry page
pub fn content_container(document: &Document) -> Option<ElementRef<'_>> {
    document.select_first(&CONTENT_CONTAINER)
}

/// Segments the content container of `document`
///
/// # Returns
///
/// * `Ok(Segments)` - preamble and labelled blocks, possibly empty
/// * `Err(StructureError::ContentContainerMissing)` - the page has no
///   `div#page-content`
pub fn segment(document: &Document) -> Result<Segments, StructureError> {
    let container = content_container(document).ok_or(StructureError::ContentContainerMissing)?;

    let mut walker = Segmenter::default();
    walker.walk(container);

    tracing::trace!(
        "Segmented container into {} blocks ({} preamble fragments)",
        walker.segments.blocks.len(),
        walker.segments.preamble.len()
    );
    Ok(walker.segments)
}

#[derive(Default)]
struct Segmenter {
    segments: Segments,
}

impl Segmenter {
    fn walk(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => self.push_fragment(collapse_whitespace(text)),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.visit(element);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        if is_chrome(element) {
            return;
        }

        if is_heading(element) {
            self.open_block(element_text(element));
            return;
        }

        if let Some((label, rest)) = inline_label(element) {
            self.open_block(label);
            self.push_fragment(rest);
            return;
        }

        let name = element.value().name();
        if WRAPPER_ELEMENTS.contains(&name) && contains_heading(element) {
            self.walk(element);
            return;
        }

        self.push_fragment(element_text(element));
    }

    fn open_block(&mut self, label: String) {
        self.segments.blocks.push(RawBlock::new(label));
    }

    fn push_fragment(&mut self, fragment: String) {
        if fragment.is_empty() {
            return;
        }
        match self.segments.blocks.last_mut() {
            Some(block) => block.fragments.push(fragment),
            None => self.segments.preamble.push(fragment),
        }
    }
}

fn is_heading(element: ElementRef<'_>) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

/// Splits an inline-label paragraph into its label and remaining text
fn inline_label(element: ElementRef<'_>) -> Option<(String, String)> {
    if element.value().name() != "p" {
        return None;
    }

    let mut children = element.children().filter(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Comment(_) => false,
        _ => true,
    });

    let first = ElementRef::wrap(children.next()?)?;
    if !matches!(first.value().name(), "strong" | "b") {
        return None;
    }

    let label = element_text(first);
    if label.is_empty() || label.chars().count() > MAX_INLINE_LABEL_CHARS {
        return None;
    }

    Some((label, element_text_without(element, first)))
}

fn contains_heading(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| is_heading(el) || inline_label(el).is_some())
}

/// Site widgets and the previous/next navigation line
fn is_chrome(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if CHROME_CLASSES.iter().any(|class| value.classes().any(|c| c == *class)) {
        return true;
    }

    matches!(value.name(), "p" | "div")
        && element_text(element).starts_with(NAVIGATION_MARKERS)
}
