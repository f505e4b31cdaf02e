//! Record assembly
//!
//! Combines segmentation, classification, images, tags and the resolved name
//! into one [`ScpRecord`]. Only a missing content container aborts assembly;
//! every other shortfall shows up as an absent field.

use crate::config::ExtractConfig;
use crate::entry::EntryId;
use crate::extract::classify::{classify, Classified, FieldTable, FieldValue};
use crate::extract::images::extract_images;
use crate::extract::segment::{content_container, segment};
use crate::extract::tags::{extract_tags, TagFilter};
use crate::extract::{clean::clean_body, MoreInfo};
use crate::markup::Document;
use crate::StructureError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

static ITEM_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bscp-(\d+)").expect("valid regex"));

/// Marker attached when none of the primary fields were found
pub const MISSING_FIELDS_WARNING: &str =
    "no standard fields extracted (class, containment, description)";

/// Fields every complete record is expected to carry, in report order
pub const PRIMARY_FIELDS: &[&str] = &["class", "containment", "description"];

/// One extracted entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScpRecord {
    /// Display identifier, e.g. `SCP-049`
    pub id: String,
    pub series: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub images: Vec<String>,
    pub tags: BTreeSet<String>,
    pub more_info: MoreInfo,
    /// Primary fields this record lacks; empty for a complete record
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ScpRecord {
    /// Returns true if the record carries the missing-fields marker
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }
}

/// Extraction settings shared by every entry of a run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub table: FieldTable,
    pub tag_filter: TagFilter,
}

impl ExtractOptions {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            table: FieldTable::standard().clone(),
            tag_filter: TagFilter::new(&config.excluded_tags),
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from_config(&ExtractConfig::default())
    }
}

/// Assembles the record for `id` from its parsed page
///
/// # Arguments
///
/// * `id` - The entry being extracted
/// * `document` - The parsed entry page
/// * `page_url` - URL the page was fetched from, for resolving image sources
/// * `name` - Display name from the series index, if one was found
/// * `options` - Field table and tag filter
///
/// # Returns
///
/// * `Ok(ScpRecord)` - The assembled record, possibly with `warning` set
/// * `Err(StructureError)` - The page has no content container
pub fn assemble(
    id: EntryId,
    document: &Document,
    page_url: &Url,
    name: Option<String>,
    options: &ExtractOptions,
) -> Result<ScpRecord, StructureError> {
    let segments = segment(document)?;
    let mut classified = classify(&segments.blocks, &options.table);

    let preamble = clean_body(&segments.preamble);
    merge_preamble(&mut classified, preamble);

    let display_id = resolve_display_id(id, classified.item.take(), &mut classified.more_info);

    let container = content_container(document);
    let images = container
        .map(|container| extract_images(container, page_url, id))
        .unwrap_or_default();
    let tags = extract_tags(document, container, &options.tag_filter);

    let class = classified.class.map(|value| value.text);
    let containment = classified.containment.map(|value| value.text);
    let description = classified.description.map(|value| value.text);

    let missing_fields: Vec<&'static str> = PRIMARY_FIELDS
        .iter()
        .zip([&class, &containment, &description])
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| *field)
        .collect();

    let warning = if missing_fields.len() == PRIMARY_FIELDS.len() {
        tracing::warn!("{}: {}", id, MISSING_FIELDS_WARNING);
        Some(MISSING_FIELDS_WARNING.to_string())
    } else {
        if !missing_fields.is_empty() {
            tracing::debug!("{}: missing {}", id, missing_fields.join(", "));
        }
        None
    };

    tracing::debug!(
        "{}: {} images, {} tags, {} more_info entries",
        id,
        images.len(),
        tags.len(),
        classified.more_info.len()
    );

    Ok(ScpRecord {
        id: display_id,
        series: id.series(),
        name,
        class,
        containment,
        description,
        images,
        tags,
        more_info: classified.more_info,
        missing_fields,
        warning,
    })
}

/// Prepends the preamble to an existing description; otherwise it is dropped
fn merge_preamble(classified: &mut Classified, preamble: String) {
    if preamble.is_empty() {
        return;
    }
    match classified.description.as_mut() {
        Some(description) if description.text.is_empty() => description.text = preamble,
        Some(description) => description.text = format!("{}\n{}", preamble, description.text),
        None => tracing::trace!("Discarding preamble without a description"),
    }
}

/// Uses the page's own item number when it names an entry, else the derived id
///
/// An item block that does not contain a recognisable number is archived in
/// `more_info` so its text is not lost.
fn resolve_display_id(id: EntryId, item: Option<FieldValue>, more_info: &mut MoreInfo) -> String {
    let Some(item) = item else {
        return id.display_id();
    };

    if let Some(number) = ITEM_NUMBER_RE
        .captures(&item.text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
    {
        return format!("SCP-{:03}", number);
    }

    if let Some(label) = item.labels.first() {
        more_info.append(label, &item.text);
    }
    id.display_id()
}
