//! Field classification
//!
//! Maps segmented blocks onto canonical record fields using a declarative
//! [`FieldTable`]. Labels are matched in three stages (exact, prefix,
//! substring); inside a stage the earliest table entry wins, so the table
//! lists specific synonyms before generic ones. Blocks nobody claims are
//! archived in [`MoreInfo`] under their original label.

use crate::extract::clean::{clean_body, dedup_sentences};
use crate::extract::segment::RawBlock;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Record fields the classifier can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    /// The page's own item number (`项目编号`)
    Item,
    /// Object class (`项目等级`)
    Class,
    /// Special containment procedures (`特殊收容措施`)
    Containment,
    /// Description (`描述`)
    Description,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Class => "class",
            Self::Containment => "containment",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a label matched a table pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
}

/// Synonyms for the standard fields, specific before generic
///
/// Simplified and traditional spellings sit next to each other. Bare
/// `收容` is deliberately absent: as a substring it would claim headings such
/// as `收容失效记录`.
pub const STANDARD_SYNONYMS: &[(&str, CanonicalField)] = &[
    ("项目编号", CanonicalField::Item),
    ("項目編號", CanonicalField::Item),
    ("scp编号", CanonicalField::Item),
    ("scp編號", CanonicalField::Item),
    ("item #", CanonicalField::Item),
    ("item number", CanonicalField::Item),
    ("编号", CanonicalField::Item),
    ("編號", CanonicalField::Item),
    ("项目等级", CanonicalField::Class),
    ("項目等級", CanonicalField::Class),
    ("对象等级", CanonicalField::Class),
    ("對象等級", CanonicalField::Class),
    ("object class", CanonicalField::Class),
    ("classification", CanonicalField::Class),
    ("等级", CanonicalField::Class),
    ("等級", CanonicalField::Class),
    ("特殊收容措施", CanonicalField::Containment),
    ("特殊收容程序", CanonicalField::Containment),
    ("special containment procedures", CanonicalField::Containment),
    ("containment procedures", CanonicalField::Containment),
    ("收容措施", CanonicalField::Containment),
    ("收容程序", CanonicalField::Containment),
    ("containment", CanonicalField::Containment),
    ("项目描述", CanonicalField::Description),
    ("項目描述", CanonicalField::Description),
    ("description", CanonicalField::Description),
    ("描述", CanonicalField::Description),
    ("说明", CanonicalField::Description),
    ("詳述", CanonicalField::Description),
];

static STANDARD_TABLE: LazyLock<FieldTable> =
    LazyLock::new(|| FieldTable::new(STANDARD_SYNONYMS));

/// Trailing characters removed during label normalization
const TRAILING_PUNCTUATION: &[char] = &[
    ':', '：', '.', '。', ',', '，', ';', '；', '!', '！', '?', '？', '-', '—', '–',
];

/// Normalizes a heading for matching: trim, collapse, case-fold, drop trailing punctuation
pub fn normalize_label(label: &str) -> String {
    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_lowercase()
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_PUNCTUATION.contains(&c))
        .to_string()
}

/// Ordered `(pattern, field)` pairs
#[derive(Debug, Clone)]
pub struct FieldTable {
    entries: Vec<(String, CanonicalField)>,
}

impl FieldTable {
    /// Builds a table; patterns are normalized like labels and empty ones dropped
    pub fn new(entries: &[(&str, CanonicalField)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(pattern, field)| (normalize_label(pattern), *field))
                .filter(|(pattern, _)| !pattern.is_empty())
                .collect(),
        }
    }

    /// The built-in synonym table
    pub fn standard() -> &'static FieldTable {
        &STANDARD_TABLE
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the field a raw label belongs to
    ///
    /// # Example
    ///
    /// ```
    /// use scp_harvest::extract::{CanonicalField, FieldTable, MatchKind};
    ///
    /// let table = FieldTable::standard();
    /// assert_eq!(
    ///     table.lookup("特殊收容措施："),
    ///     Some((CanonicalField::Containment, MatchKind::Exact))
    /// );
    /// assert_eq!(table.lookup("实验记录"), None);
    /// ```
    pub fn lookup(&self, label: &str) -> Option<(CanonicalField, MatchKind)> {
        let normalized = normalize_label(label);
        if normalized.is_empty() {
            return None;
        }

        let stages: [(MatchKind, fn(&str, &str) -> bool); 3] = [
            (MatchKind::Exact, |label, pattern| label == pattern),
            (MatchKind::Prefix, |label, pattern| label.starts_with(pattern)),
            (MatchKind::Substring, |label, pattern| label.contains(pattern)),
        ];

        stages.iter().find_map(|(kind, matches)| {
            self.entries
                .iter()
                .find(|(pattern, _)| matches(&normalized, pattern))
                .map(|(_, field)| (*field, *kind))
        })
    }
}

/// Insertion-ordered archive of unclaimed blocks, serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoreInfo {
    entries: Vec<(String, String)>,
}

impl MoreInfo {
    /// Adds `text` under `label`, appending to an existing entry on a repeat
    pub fn append(&mut self, label: &str, text: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == label) {
            Some((_, existing)) => {
                if !text.is_empty() {
                    if !existing.is_empty() {
                        existing.push('\n');
                    }
                    existing.push_str(text);
                }
            }
            None => self.entries.push((label.to_string(), text.to_string())),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MoreInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A canonical field's collected text and the labels that contributed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub text: String,
    pub labels: Vec<String>,
}

/// Result of classifying one page's blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub item: Option<FieldValue>,
    pub class: Option<FieldValue>,
    pub containment: Option<FieldValue>,
    pub description: Option<FieldValue>,
    pub more_info: MoreInfo,
}

impl Classified {
    fn slot_mut(&mut self, field: CanonicalField) -> &mut Option<FieldValue> {
        match field {
            CanonicalField::Item => &mut self.item,
            CanonicalField::Class => &mut self.class,
            CanonicalField::Containment => &mut self.containment,
            CanonicalField::Description => &mut self.description,
        }
    }

    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        let slot = match field {
            CanonicalField::Item => &self.item,
            CanonicalField::Class => &self.class,
            CanonicalField::Containment => &self.containment,
            CanonicalField::Description => &self.description,
        };
        slot.as_ref().map(|value| value.text.as_str())
    }

    /// Number of canonical slots that received a block
    pub fn filled(&self) -> usize {
        [&self.item, &self.class, &self.containment, &self.description]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

/// Routes every block to a canonical slot or to `more_info`
///
/// A repeated canonical heading appends to the slot rather than replacing
/// it. `containment` and `description` have repeated sentences removed once
/// all their blocks are in.
pub fn classify(blocks: &[RawBlock], table: &FieldTable) -> Classified {
    let mut classified = Classified::default();

    for block in blocks {
        let body = clean_body(&block.fragments);

        match table.lookup(&block.label) {
            Some((field, kind)) => {
                tracing::trace!("Label {:?} -> {} ({:?} match)", block.label, field, kind);
                let slot = classified.slot_mut(field);
                match slot {
                    Some(value) => {
                        if !body.is_empty() {
                            if !value.text.is_empty() {
                                value.text.push('\n');
                            }
                            value.text.push_str(&body);
                        }
                        value.labels.push(block.label.clone());
                    }
                    None => {
                        *slot = Some(FieldValue {
                            text: body,
                            labels: vec![block.label.clone()],
                        });
                    }
                }
            }
            None => {
                tracing::trace!("Label {:?} -> more_info", block.label);
                classified.more_info.append(&block.label, &body);
            }
        }
    }

    for slot in [&mut classified.containment, &mut classified.description] {
        if let Some(value) = slot {
            value.text = dedup_sentences(&value.text);
        }
    }

    classified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(label: &str, fragments: &[&str]) -> RawBlock {
        RawBlock {
            label: label.to_string(),
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  项目等级： "), "项目等级");
        assert_eq!(normalize_label("Object  Class:"), "object class");
        assert_eq!(normalize_label("Description."), "description");
        assert_eq!(normalize_label("：："), "");
    }

    #[test]
    fn test_standard_table_patterns_are_normalized_and_unique() {
        let table = FieldTable::standard();
        assert_eq!(table.len(), STANDARD_SYNONYMS.len());
        for (i, (pattern, _)) in table.entries.iter().enumerate() {
            assert_eq!(pattern, &normalize_label(pattern));
            assert!(
                !table.entries[..i].iter().any(|(p, _)| p == pattern),
                "duplicate pattern {}",
                pattern
            );
        }
    }

    #[test]
    fn test_standard_table_lookups() {
        let table = FieldTable::standard();
        let cases = [
            ("项目编号：", CanonicalField::Item, MatchKind::Exact),
            ("項目等級：", CanonicalField::Class, MatchKind::Exact),
            ("Object Class:", CanonicalField::Class, MatchKind::Exact),
            ("特殊收容措施", CanonicalField::Containment, MatchKind::Exact),
            ("Special Containment Procedures:", CanonicalField::Containment, MatchKind::Exact),
            ("描述：", CanonicalField::Description, MatchKind::Exact),
            ("描述（更新）", CanonicalField::Description, MatchKind::Prefix),
            ("更新后的特殊收容措施", CanonicalField::Containment, MatchKind::Substring),
        ];
        for (label, field, kind) in cases {
            assert_eq!(table.lookup(label), Some((field, kind)), "label {}", label);
        }
    }

    #[test]
    fn test_specific_synonyms_beat_generic_ones() {
        // "项目等级" is listed before the bare "等级", and both are Class;
        // "项目编号" must not be read as a class because of a shared suffix.
        let table = FieldTable::standard();
        assert_eq!(
            table.lookup("项目编号").map(|(f, _)| f),
            Some(CanonicalField::Item)
        );
    }

    #[test]
    fn test_unknown_labels_miss() {
        let table = FieldTable::standard();
        assert_eq!(table.lookup("实验记录"), None);
        assert_eq!(table.lookup("实验记录：补充"), None);
        assert_eq!(table.lookup("附录049-1"), None);
        assert_eq!(table.lookup(""), None);
        assert_eq!(table.lookup("："), None);
    }

    #[test]
    fn test_exact_stage_beats_earlier_prefix_entry() {
        let table = FieldTable::new(&[
            ("收容", CanonicalField::Containment),
            ("收容措施", CanonicalField::Description),
        ]);
        assert_eq!(
            table.lookup("收容措施"),
            Some((CanonicalField::Description, MatchKind::Exact))
        );
    }

    #[test]
    fn test_table_order_breaks_ties_within_a_stage() {
        let ambiguous = [
            ("收容", CanonicalField::Containment),
            ("收容措施", CanonicalField::Description),
        ];
        let table = FieldTable::new(&ambiguous);
        assert_eq!(
            table.lookup("收容措施补充"),
            Some((CanonicalField::Containment, MatchKind::Prefix))
        );

        let reversed = [ambiguous[1], ambiguous[0]];
        let table = FieldTable::new(&reversed);
        assert_eq!(
            table.lookup("收容措施补充"),
            Some((CanonicalField::Description, MatchKind::Prefix))
        );
    }

    #[test]
    fn test_classify_routes_blocks() {
        let blocks = vec![
            block("项目编号：", &["SCP-049"]),
            block("项目等级：", &["：Euclid"]),
            block("特殊收容措施：", &["关押于站点-19。"]),
            block("描述：", &["人形实体。"]),
            block("实验记录", &["记录一"]),
            block("实验记录：补充", &["记录二"]),
        ];

        let classified = classify(&blocks, FieldTable::standard());

        assert_eq!(classified.text(CanonicalField::Item), Some("SCP-049"));
        assert_eq!(classified.text(CanonicalField::Class), Some("Euclid"));
        assert_eq!(classified.text(CanonicalField::Containment), Some("关押于站点-19。"));
        assert_eq!(classified.text(CanonicalField::Description), Some("人形实体。"));
        assert_eq!(
            classified.more_info.keys().collect::<Vec<_>>(),
            vec!["实验记录", "实验记录：补充"]
        );
        assert_eq!(classified.more_info.get("实验记录"), Some("记录一"));
        assert_eq!(classified.more_info.get("实验记录：补充"), Some("记录二"));
    }

    #[test]
    fn test_every_block_accounted_for_once() {
        let blocks = vec![
            block("描述", &["一"]),
            block("附录", &["二"]),
            block("描述", &["三"]),
            block("附录", &["四"]),
            block("访谈记录", &["五"]),
        ];
        let classified = classify(&blocks, FieldTable::standard());

        let claimed: usize = [&classified.description]
            .iter()
            .filter_map(|slot| slot.as_ref())
            .map(|value| value.labels.len())
            .sum();
        let archived_labels = blocks
            .iter()
            .filter(|b| FieldTable::standard().lookup(&b.label).is_none())
            .count();

        assert_eq!(claimed, 2);
        assert_eq!(archived_labels, 3);
        assert_eq!(classified.more_info.len(), 2);
        assert_eq!(classified.more_info.get("附录"), Some("二\n四"));
        assert_eq!(classified.more_info.get("访谈记录"), Some("五"));
    }

    #[test]
    fn test_duplicate_canonical_heading_appends_in_order() {
        let blocks = vec![
            block("描述", &["第一部分内容。"]),
            block("实验记录", &["无关"]),
            block("描述：", &["第二部分内容。"]),
        ];
        let classified = classify(&blocks, FieldTable::standard());
        let description = classified.description.unwrap();
        assert_eq!(description.text, "第一部分内容。\n第二部分内容。");
        assert_eq!(description.labels, vec!["描述", "描述："]);
    }

    #[test]
    fn test_repeated_sentences_removed_from_description() {
        let blocks = vec![block(
            "描述",
            &["该实体具有高度智能。", "该实体具有高度智能。", "它会说话。"],
        )];
        let classified = classify(&blocks, FieldTable::standard());
        assert_eq!(
            classified.text(CanonicalField::Description),
            Some("该实体具有高度智能。\n它会说话。")
        );
    }

    #[test]
    fn test_more_info_serializes_in_insertion_order() {
        let mut more_info = MoreInfo::default();
        more_info.append("附录", "b");
        more_info.append("事件记录", "a");
        more_info.append("附录", "c");

        let json = serde_json::to_string(&more_info).unwrap();
        assert_eq!(json, r#"{"附录":"b\nc","事件记录":"a"}"#);
    }
}
