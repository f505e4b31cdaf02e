//! Series index pages
//!
//! Each series page lists its entries as links (`<a href="/scp-049">SCP-049</a>
//! - 瘟疫医生`). [`SeriesIndex`] is the parsed form of one such page: a map
//! from URL slug to display name plus the page's text lines for entries whose
//! link carries no name.

use crate::entry::EntryId;
use crate::markup::{collapse_whitespace, element_text, is_block_element, Document, MarkupParser};
use scraper::{ElementRef, Node, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

static HREF_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Separators between an entry number and its name
const NAME_SEPARATORS: &[char] = &['-', '—', '–', ':', '：', ' '];

/// Characters after which a listed name carries annotations, not the name
const NAME_ANNOTATION_MARKERS: &[char] = &['·', '•'];

/// URL of the index page for `series`
///
/// The first series lives at the base URL itself; later ones append `-N`.
///
/// # Example
///
/// ```
/// use scp_harvest::resolve::series_url;
///
/// let base = "http://scp-wiki-cn.wikidot.com/scp-series";
/// assert_eq!(series_url(base, 1), base);
/// assert_eq!(series_url(base, 3), format!("{}-3", base));
/// ```
pub fn series_url(base_url: &str, series: u32) -> String {
    if series == 1 {
        base_url.to_string()
    } else {
        format!("{}-{}", base_url, series)
    }
}

/// Parsed contents of one series index page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesIndex {
    names: HashMap<String, String>,
    lines: Vec<String>,
}

impl SeriesIndex {
    /// Parses raw HTML with `parser` and indexes it
    pub fn from_html(parser: &MarkupParser, html: &str) -> Self {
        let document = parser.parse(html);
        Self::from_document(&document)
    }

    /// Indexes every entry link on the page
    ///
    /// The first link for a slug that yields a non-empty name wins.
    pub fn from_document(document: &Document) -> Self {
        let mut names = HashMap::new();

        for link in document.select_all(&HREF_LINKS) {
            let Some(slug) = link.value().attr("href").and_then(href_slug) else {
                continue;
            };
            if !slug.starts_with("scp-") || names.contains_key(&slug) {
                continue;
            }
            if let Some(name) = display_name(link) {
                names.insert(slug, name);
            }
        }

        Self {
            names,
            lines: document.lines(),
        }
    }

    /// Number of entries with a known name
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display name listed for `id`
    ///
    /// Links are matched on their exact slug, so `scp-049` never answers for
    /// `scp-0490`. When no link carries a name, text lines of the form
    /// `SCP-049 - name` are tried.
    pub fn name_for(&self, id: EntryId) -> Option<String> {
        let slug = id.slug();
        if let Some(name) = self.names.get(&slug) {
            return Some(name.clone());
        }

        self.lines.iter().find_map(|line| {
            let lower = line.to_lowercase();
            if !mentions_slug(&lower, &slug) {
                return None;
            }
            let (_, rest) = line.split_once(" - ")?;
            clean_name(rest)
        })
    }
}

/// Last path segment of an href, lowercased, without query or fragment
fn href_slug(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_lowercase())
    }
}

/// The name shown next to an entry link
///
/// Either the link text itself reads `SCP-049 - name`, or the link holds
/// only the number and the name is the text that follows it up to the next
/// link, line break or block element. A link nested in inline markup such as
/// `<strong>` is followed from its outermost inline wrapper.
fn display_name(link: ElementRef<'_>) -> Option<String> {
    let link_text = element_text(link);
    if link_text.is_empty() {
        return None;
    }
    if let Some((_, name)) = link_text.split_once(" - ") {
        return clean_name(name);
    }

    let mut anchor = link;
    loop {
        let (trailing, bounded) = trailing_text(anchor);
        if bounded || !collapse_whitespace(&trailing).is_empty() {
            return clean_name(collapse_whitespace(&trailing).trim_start_matches(NAME_SEPARATORS));
        }
        match anchor.parent().and_then(ElementRef::wrap) {
            Some(parent) if !is_block_element(parent.value().name()) => anchor = parent,
            _ => return None,
        }
    }
}

/// Text of the siblings after `node` up to the next entry boundary
///
/// The flag is true when a boundary (another link, a line break or a block
/// element) ended the run rather than the end of the parent.
fn trailing_text(node: ElementRef<'_>) -> (String, bool) {
    let mut text = String::new();
    for sibling in node.next_siblings() {
        match sibling.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) => {
                let Some(sibling) = ElementRef::wrap(sibling) else {
                    continue;
                };
                if is_entry_boundary(el.name()) || sibling.select(&HREF_LINKS).next().is_some() {
                    return (text, true);
                }
                text.push_str(&element_text(sibling));
            }
            _ => {}
        }
    }
    (text, false)
}

fn is_entry_boundary(name: &str) -> bool {
    name == "a" || is_block_element(name)
}

/// Trims separators and trailing annotations; empty names become `None`
fn clean_name(raw: &str) -> Option<String> {
    let name = raw
        .split(NAME_ANNOTATION_MARKERS)
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches(NAME_SEPARATORS)
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Returns true if `line` contains `slug` not followed by another digit
fn mentions_slug(line: &str, slug: &str) -> bool {
    let bytes = line.as_bytes();
    line.match_indices(slug).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_digit();
        before_ok && after_ok
    })
}
