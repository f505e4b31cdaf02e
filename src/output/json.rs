//! JSON database output
//!
//! The whole run is written as one pretty-printed UTF-8 document with
//! non-ASCII text left unescaped.

use crate::extract::ScpRecord;
use crate::harvest::BatchOutcome;
use crate::HarvestError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const INDENT: &[u8] = b"    ";

/// Identifier range a document covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunRange {
    pub start: i64,
    pub end: i64,
}

/// Top-level shape of the output file
#[derive(Debug, Serialize)]
pub struct OutputDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub config_hash: &'a str,
    pub range: RunRange,
    pub records: &'a BTreeMap<u32, ScpRecord>,
    pub failed_ids: &'a [u32],
    pub cancelled: bool,
}

impl<'a> OutputDocument<'a> {
    pub fn new(outcome: &'a BatchOutcome, range: RunRange, config_hash: &'a str) -> Self {
        Self {
            generated_at: Utc::now(),
            config_hash,
            range,
            records: &outcome.records,
            failed_ids: &outcome.failed_ids,
            cancelled: outcome.cancelled,
        }
    }
}

/// Serializes `document` with four-space indentation
pub fn to_json_writer<W: Write>(writer: W, document: &OutputDocument<'_>) -> Result<(), HarvestError> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut serializer)?;
    Ok(())
}

/// Writes the output document for a finished run
///
/// The document is written to a sibling temporary file first and renamed
/// into place, so an interrupted write never leaves a truncated database.
///
/// # Arguments
///
/// * `outcome` - The finished batch
/// * `range` - The requested identifier range
/// * `config_hash` - Hash of the configuration the run used
/// * `output_path` - Destination file
pub fn write_json_output(
    outcome: &BatchOutcome,
    range: RunRange,
    config_hash: &str,
    output_path: &Path,
) -> Result<(), HarvestError> {
    let document = OutputDocument::new(outcome, range, config_hash);

    let tmp_path = output_path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        to_json_writer(&mut writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, output_path)?;

    tracing::info!(
        "Wrote {} records to {}",
        outcome.records.len(),
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MoreInfo;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn record(id: &str, name: Option<&str>) -> ScpRecord {
        let mut more_info = MoreInfo::default();
        more_info.append("附录", "备注");
        ScpRecord {
            id: id.to_string(),
            series: 1,
            name: name.map(str::to_string),
            class: Some("Euclid".to_string()),
            containment: None,
            description: Some("描述".to_string()),
            images: vec![],
            tags: BTreeSet::from(["humanoid".to_string()]),
            more_info,
            missing_fields: vec!["containment"],
            warning: None,
        }
    }

    fn outcome() -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        outcome.record_success(1, record("SCP-001", Some("提案")));
        outcome.record_success(3, record("SCP-003", None));
        outcome.record_failure(2, "transport error".to_string());
        outcome.finish(false);
        outcome
    }

    #[test]
    fn test_document_shape() {
        let outcome = outcome();
        let document = OutputDocument::new(&outcome, RunRange { start: 1, end: 3 }, "abc123");
        let mut buf = Vec::new();
        to_json_writer(&mut buf, &document).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("提案"), "non-ASCII must not be escaped");
        assert!(text.contains("\n    \"config_hash\""));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["config_hash"], "abc123");
        assert_eq!(value["range"]["start"], 1);
        assert_eq!(value["range"]["end"], 3);
        assert_eq!(value["failed_ids"], serde_json::json!([2]));
        assert_eq!(value["cancelled"], false);
        assert_eq!(value["records"]["1"]["name"], "提案");
        assert!(value["records"]["3"].get("name").is_none());
        assert!(value["records"]["3"].get("containment").is_none());
        assert_eq!(value["records"]["3"]["more_info"]["附录"], "备注");
        assert_eq!(value["records"]["3"]["missing_fields"], serde_json::json!(["containment"]));
        assert!(value["records"].get("2").is_none());
    }

    #[test]
    fn test_write_json_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        write_json_output(&outcome(), RunRange { start: 1, end: 3 }, "hash", &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["records"].as_object().unwrap().len(), 2);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
