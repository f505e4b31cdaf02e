//! Value cleanup applied to block bodies before they land in a record

use crate::markup::collapse_whitespace;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Redaction markers used across translations, normalized to one spelling
static REDACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[数据删除\]|\[资料删除\]|\[已编辑\]|\[删除\]|\[REDACTED\]|\[DATA EXPUNGED\]|█+")
        .expect("valid regex")
});

static LEADING_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[：:]\s*").expect("valid regex"));

pub const REDACTED: &str = "[REDACTED]";

/// Sentences this short are never treated as duplicates
const MIN_DEDUP_SENTENCE_CHARS: usize = 6;

/// Cleans one fragment: redaction markers, whitespace, optional leading colon
pub fn clean_fragment(fragment: &str, strip_colon: bool) -> String {
    let redacted = REDACTION_RE.replace_all(fragment, REDACTED);
    let collapsed = collapse_whitespace(&redacted);
    if strip_colon {
        LEADING_COLON_RE.replace(&collapsed, "").into_owned()
    } else {
        collapsed
    }
}

/// Cleans a block body and joins its fragments with newlines
///
/// The leading colon is stripped from the first fragment only: it is the
/// separator left behind by an inline label such as `项目等级：`.
pub fn clean_body(fragments: &[String]) -> String {
    fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| clean_fragment(fragment, i == 0))
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drops sentences (split on `。`) already seen earlier in the same text
///
/// Pages built from templates sometimes repeat whole paragraphs; this keeps
/// the first occurrence. Line breaks are preserved and sentences shorter than
/// six characters are always kept.
pub fn dedup_sentences(text: &str) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut lines = Vec::new();

    for line in text.lines() {
        let ends_with_stop = line.ends_with('。');
        let mut kept: Vec<&str> = Vec::new();

        for sentence in line.split('。') {
            let trimmed = sentence.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.chars().count() < MIN_DEDUP_SENTENCE_CHARS
                || seen.insert(trimmed.to_string())
            {
                kept.push(trimmed);
            }
        }

        if kept.is_empty() {
            continue;
        }

        let mut rebuilt = kept.join("。");
        if ends_with_stop || kept.len() < line.split('。').filter(|s| !s.trim().is_empty()).count()
        {
            rebuilt.push('。');
        }
        lines.push(rebuilt);
    }

    lines.join("\n")
}
