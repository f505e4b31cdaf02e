//! Extraction pipeline for entry pages
//!
//! This module turns a parsed entry page into a record:
//! - Segmentation of the content container into labelled blocks
//! - Classification of blocks into canonical fields
//! - Image and tag extraction
//! - Assembly of the final record

mod clean;
mod classify;
pub mod images;
mod record;
mod segment;
mod tags;

pub use classify::{
    classify, normalize_label, CanonicalField, Classified, FieldTable, FieldValue, MatchKind,
    MoreInfo, STANDARD_SYNONYMS,
};
pub use clean::{clean_body, clean_fragment, dedup_sentences};
pub use images::{extract_images, resolve_source, SourceStrategy, SOURCE_STRATEGIES};
pub use record::{assemble, ExtractOptions, ScpRecord, MISSING_FIELDS_WARNING, PRIMARY_FIELDS};
pub use segment::{content_container, segment, RawBlock, Segments};
pub use tags::{extract_tags, TagFilter};
