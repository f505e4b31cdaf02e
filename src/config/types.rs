use serde::Deserialize;

/// Main configuration structure for scp-harvest
///
/// Every section is optional; a missing section takes its defaults so an
/// empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where entry and series pages live
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Prefix an entry's padded identifier is appended to
    pub entry_base_url: String,

    /// URL of the first series index page; later series append `-N`
    pub series_base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            entry_base_url: "http://scp-wiki-cn.wikidot.com/scp-".to_string(),
            series_base_url: "http://scp-wiki-cn.wikidot.com/scp-series".to_string(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Extra attempts after a retryable failure
    pub max_retries: u32,

    /// Base delay between retries in milliseconds, doubled per attempt
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

/// Identifier range and parallelism of a batch run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BatchConfig {
    pub start_id: i64,
    pub end_id: i64,

    /// Maximum number of entries extracted at the same time
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            start_id: 1,
            end_id: 9000,
            max_concurrent: 8,
        }
    }
}

/// Markup backend preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendPreference {
    /// Probe the full document parser, fall back to the fragment parser
    #[default]
    Auto,
    /// Full HTML5 document parser only
    Document,
    /// Lenient fragment parser only
    Fragment,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParserConfig {
    #[serde(default)]
    pub backend: BackendPreference,
}

/// Extraction tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractConfig {
    /// Generic classification tags dropped from every record (case-insensitive)
    pub excluded_tags: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            excluded_tags: DEFAULT_EXCLUDED_TAGS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
        }
    }
}

/// Tags describing object class or page type rather than content
pub const DEFAULT_EXCLUDED_TAGS: &[&str] = &[
    "scp",
    "safe",
    "euclid",
    "keter",
    "thaumiel",
    "apollyon",
    "archon",
    "neutralized",
    "explained",
    "decommissioned",
];

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the JSON document written at the end of a run
    pub json_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: "scp_database_cn.json".to_string(),
        }
    }
}
