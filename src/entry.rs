//! Entry identifiers and series arithmetic
//!
//! An entry is named by a positive integer. Everything else the pipeline
//! needs to know about the identifier (padded form, URL slug, series) is
//! derived here so that the rules live in one place.

use crate::HarvestError;
use std::fmt;

/// Number of consecutive identifiers grouped into one series
pub const SERIES_SIZE: u32 = 1000;

/// Highest series published on the site
pub const MAX_SERIES: u32 = 9;

/// Highest identifier whose series falls inside `1..=MAX_SERIES`
pub const MAX_ENTRY_ID: u32 = SERIES_SIZE * MAX_SERIES;

/// A validated entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u32);

impl EntryId {
    /// Validates a raw identifier
    ///
    /// Identifiers must be positive and belong to one of the published series.
    ///
    /// # Examples
    ///
    /// ```
    /// use scp_harvest::EntryId;
    ///
    /// let id = EntryId::new(49).unwrap();
    /// assert_eq!(id.padded(), "049");
    /// assert_eq!(id.series(), 1);
    /// assert!(EntryId::new(0).is_err());
    /// ```
    pub fn new(raw: i64) -> Result<Self, HarvestError> {
        if raw <= 0 {
            return Err(HarvestError::InvalidIdentifier {
                id: raw,
                reason: "identifier must be positive".to_string(),
            });
        }

        if raw > i64::from(MAX_ENTRY_ID) {
            return Err(HarvestError::InvalidIdentifier {
                id: raw,
                reason: format!(
                    "series {} is outside 1..={}",
                    series_of(raw as u64),
                    MAX_SERIES
                ),
            });
        }

        Ok(Self(raw as u32))
    }

    /// The raw numeric value
    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-padded textual form, at least three digits (`49` -> `"049"`)
    pub fn padded(self) -> String {
        format!("{:03}", self.0)
    }

    /// Canonical URL slug (`scp-049`)
    pub fn slug(self) -> String {
        format!("scp-{}", self.padded())
    }

    /// Display form used in records (`SCP-049`)
    pub fn display_id(self) -> String {
        format!("SCP-{}", self.padded())
    }

    /// Series this entry belongs to, always in `1..=MAX_SERIES`
    pub fn series(self) -> u32 {
        series_of(u64::from(self.0)) as u32
    }

    /// Returns true if `text` mentions this identifier as a standalone number
    ///
    /// Both the padded (`049`) and the bare (`49`) forms count, but only when
    /// the digits are not part of a longer digit run, so `1490` does not
    /// mention entry 49.
    pub fn is_mentioned_in(self, text: &str) -> bool {
        let padded = self.padded();
        let bare = self.0.to_string();
        contains_number_token(text, &padded) || contains_number_token(text, &bare)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_id())
    }
}

fn series_of(id: u64) -> u64 {
    ((id - 1) / u64::from(SERIES_SIZE)) + 1
}

/// Finds `digits` in `haystack` where it is not flanked by other ASCII digits
pub(crate) fn contains_number_token(haystack: &str, digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let bytes = haystack.as_bytes();
    haystack.match_indices(digits).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_digit();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_digit();
        before_ok && after_ok
    })
}
