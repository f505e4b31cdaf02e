//! Text flattening for parsed elements

use scraper::{ElementRef, Node};

/// Elements that start a new line when flattened
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Elements whose text is never content
const SILENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Returns true for elements rendered as their own block
pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flattened, whitespace-collapsed text of an element
///
/// Block-level descendants are separated by a space so that list items and
/// table cells do not run together.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    flatten(element, &mut raw);
    collapse_whitespace(&raw)
}

/// Flattened text of an element with one of its children left out
///
/// Joins the remaining children exactly as [`element_text`] would, so inline
/// markup around the omitted child gains no extra spaces.
pub fn element_text_without(element: ElementRef<'_>, omitted: ElementRef<'_>) -> String {
    let mut raw = String::new();
    flatten_children(element, Some(omitted), &mut raw);
    collapse_whitespace(&raw)
}

/// Text of an element split at block boundaries, one collapsed line each
pub fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut raw = String::new();
    flatten(element, &mut raw);
    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

fn flatten(element: ElementRef<'_>, out: &mut String) {
    flatten_children(element, None, out);
}

fn flatten_children(element: ElementRef<'_>, omitted: Option<ElementRef<'_>>, out: &mut String) {
    for child in element.children() {
        if omitted.is_some_and(|omitted| omitted.id() == child.id()) {
            continue;
        }
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SILENT_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = is_block_element(name);
                if block {
                    out.push('\n');
                }
                flatten(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}
