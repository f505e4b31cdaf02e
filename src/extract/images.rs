//! Image extraction and relevance filtering
//!
//! Pages lazy-load images through several attributes. Each attribute is one
//! [`SourceStrategy`]; the strategies are tried in priority order and the
//! first that yields a value wins. Candidates then pass a relevance filter:
//! an image extension plus a mention of the entry identifier in the URL, alt
//! text or title. Entry pages embed plenty of decorative and navigation
//! images, and the identifier check keeps those out.

use crate::entry::EntryId;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("valid selector"));

/// Extensions accepted as images, compared case-insensitively against the URL path
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Pulls a candidate source URL out of an image element
pub type SourceStrategy = fn(&ElementRef<'_>) -> Option<String>;

/// Source strategies in priority order
pub const SOURCE_STRATEGIES: &[(&str, SourceStrategy)] = &[
    ("src", from_src),
    ("data-src", from_data_src),
    ("data-image", from_data_image),
    ("srcset", from_srcset),
];

fn attr_value(element: &ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn from_src(element: &ElementRef<'_>) -> Option<String> {
    attr_value(element, "src")
}

fn from_data_src(element: &ElementRef<'_>) -> Option<String> {
    attr_value(element, "data-src")
}

fn from_data_image(element: &ElementRef<'_>) -> Option<String> {
    attr_value(element, "data-image")
}

fn from_srcset(element: &ElementRef<'_>) -> Option<String> {
    attr_value(element, "srcset").and_then(|srcset| best_srcset_candidate(&srcset))
}

/// Picks the candidate with the largest descriptor from a `srcset` value
///
/// Candidates are `url descriptor` pairs separated by commas. `640w` and
/// `2x` style descriptors are compared by their number; a candidate without
/// a descriptor counts as `1x`. On a tie the earlier candidate wins.
///
/// # Example
///
/// ```
/// use scp_harvest::extract::images::best_srcset_candidate;
///
/// let best = best_srcset_candidate("a.jpg 320w, b.jpg 1024w, c.jpg 640w");
/// assert_eq!(best.as_deref(), Some("b.jpg"));
/// ```
pub fn best_srcset_candidate(srcset: &str) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;

    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let weight = parts.next().map(descriptor_weight).unwrap_or(Some(1.0));
        let Some(weight) = weight else {
            continue;
        };

        match best {
            Some((_, best_weight)) if best_weight >= weight => {}
            _ => best = Some((url, weight)),
        }
    }

    best.map(|(url, _)| url.to_string())
}

fn descriptor_weight(descriptor: &str) -> Option<f64> {
    let number = descriptor
        .strip_suffix(['w', 'W', 'x', 'X'])
        .unwrap_or(descriptor);
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Resolves the single best source for an image element
pub fn resolve_source(element: &ElementRef<'_>) -> Option<String> {
    SOURCE_STRATEGIES.iter().find_map(|(name, strategy)| {
        let source = strategy(element)?;
        tracing::trace!("Image source from {}: {}", name, source);
        Some(source)
    })
}

/// Returns true if `url` ends in one of [`IMAGE_EXTENSIONS`]
pub fn has_image_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Relevance filter: image extension and a mention of the identifier
pub fn is_relevant(url: &Url, alt: &str, title: &str, id: EntryId) -> bool {
    if !has_image_extension(url) {
        return false;
    }

    [url.as_str(), alt, title]
        .iter()
        .any(|text| id.is_mentioned_in(&text.to_lowercase()))
}

/// Collects relevant images under `container`, in document order, without duplicates
///
/// Sources are resolved against `page_url`; anything that does not end up
/// as an `http`/`https` URL is dropped.
pub fn extract_images(container: ElementRef<'_>, page_url: &Url, id: EntryId) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for img in container.select(&IMG) {
        let Some(source) = resolve_source(&img) else {
            continue;
        };

        let Ok(url) = page_url.join(&source) else {
            tracing::debug!("Skipping unresolvable image source {}", source);
            continue;
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }

        let alt = img.value().attr("alt").unwrap_or("");
        let title = img.value().attr("title").unwrap_or("");

        if !is_relevant(&url, alt, title, id) {
            tracing::trace!("Dropping unrelated image {}", url);
            continue;
        }

        let url = url.to_string();
        if seen.insert(url.clone()) {
            images.push(url);
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::segment::content_container;
    use crate::markup::{Document, MarkupParser};

    fn id(raw: i64) -> EntryId {
        EntryId::new(raw).unwrap()
    }

    fn page_url() -> Url {
        Url::parse("http://scp-wiki-cn.wikidot.com/scp-049").unwrap()
    }

    fn page(body: &str) -> Document {
        MarkupParser::default().parse(&format!("<html><body>{}</body></html>", body))
    }

    fn images_of(body: &str, raw: i64) -> Vec<String> {
        let doc = page(body);
        let container = content_container(&doc).unwrap();
        extract_images(container, &page_url(), id(raw))
    }

    fn img_element<'a>(doc: &'a Document) -> ElementRef<'a> {
        doc.select_first(&IMG).unwrap()
    }

    #[test]
    fn test_strategy_priority() {
        let doc = page(r#"<img src="a.jpg" data-src="b.jpg" data-image="c.jpg" srcset="d.jpg 2x">"#);
        assert_eq!(resolve_source(&img_element(&doc)).as_deref(), Some("a.jpg"));

        let doc = page(r#"<img src=" " data-src="b.jpg" data-image="c.jpg">"#);
        assert_eq!(resolve_source(&img_element(&doc)).as_deref(), Some("b.jpg"));

        let doc = page(r#"<img data-image="c.jpg" srcset="d.jpg 2x">"#);
        assert_eq!(resolve_source(&img_element(&doc)).as_deref(), Some("c.jpg"));

        let doc = page(r#"<img srcset="small.jpg 1x, large.jpg 2x">"#);
        assert_eq!(resolve_source(&img_element(&doc)).as_deref(), Some("large.jpg"));

        let doc = page(r#"<img alt="nothing">"#);
        assert_eq!(resolve_source(&img_element(&doc)), None);
    }

    #[test]
    fn test_best_srcset_candidate() {
        assert_eq!(
            best_srcset_candidate("a.jpg 320w, b.jpg 1024w, c.jpg 640w").as_deref(),
            Some("b.jpg")
        );
        assert_eq!(
            best_srcset_candidate("a.jpg, b.jpg 1.5x").as_deref(),
            Some("b.jpg")
        );
        assert_eq!(
            best_srcset_candidate("a.jpg 2x, b.jpg 2x").as_deref(),
            Some("a.jpg")
        );
        assert_eq!(
            best_srcset_candidate("a.jpg bogus, b.jpg 100w").as_deref(),
            Some("b.jpg")
        );
        assert_eq!(best_srcset_candidate(" , "), None);
    }

    #[test]
    fn test_relevance_filter() {
        let url = |s: &str| Url::parse(s).unwrap();

        assert!(is_relevant(&url("http://x.com/files/scp-049.jpg"), "", "", id(49)));
        assert!(is_relevant(&url("http://x.com/files/SCP049.JPG"), "", "", id(49)));
        assert!(is_relevant(&url("http://x.com/files/photo.png"), "SCP-049 in cell", "", id(49)));
        assert!(is_relevant(&url("http://x.com/files/photo.png"), "", "scp-49", id(49)));
        assert!(is_relevant(&url("http://x.com/a.jpg?size=big"), "049", "", id(49)));

        assert!(!is_relevant(&url("http://x.com/files/photo.png"), "portrait", "", id(49)));
        assert!(!is_relevant(&url("http://x.com/files/scp-049.pdf"), "", "", id(49)));
        assert!(!is_relevant(&url("http://x.com/files/scp-1049.jpg"), "", "", id(49)));
    }

    #[test]
    fn test_only_images_inside_container_are_considered() {
        let body = r#"
            <div id="header"><img src="/local--files/scp-049/outside.jpg"></div>
            <div id="page-content">
                <div class="scp-image-block"><img src="/local--files/scp-049/SCP-049.jpg" alt="SCP-049"></div>
            </div>
            <div id="footer"><img src="http://cdn.example.com/scp-049-footer.jpg"></div>"#;

        assert_eq!(
            images_of(body, 49),
            vec!["http://scp-wiki-cn.wikidot.com/local--files/scp-049/SCP-049.jpg"]
        );
    }

    #[test]
    fn test_unrelated_and_duplicate_images_dropped() {
        let body = r#"
            <div id="page-content">
                <img src="http://cdn.example.com/scp-049/a.jpg">
                <img src="http://cdn.example.com/decoration.png" alt="divider">
                <img data-src="http://cdn.example.com/scp-049/a.jpg">
                <img src="//cdn.example.com/b.webp" title="SCP-049 sketch">
                <img src="data:image/png;base64,AAAA" alt="scp-049">
            </div>"#;

        assert_eq!(
            images_of(body, 49),
            vec![
                "http://cdn.example.com/scp-049/a.jpg",
                "http://cdn.example.com/b.webp",
            ]
        );
    }
}
