use serde::{Deserialize, Serialize};

use crate::extractors::{BlockConfig, Strategy};
use crate::fetch::FetchOptions;

/// Category marker used when the source supplies none.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// One extracted product guess.
///
/// `price` is the raw matched substring, never parsed; currency and number
/// format vary too much across storefronts to normalize safely. `raw_text`
/// carries the full source fragment in text-mining mode (it backs the
/// per-run uniqueness guarantee) and stays None in JSON mode.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub title: String,
    pub price: String,
    pub description: Option<String>,
    pub category: String,
    pub raw_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub fetch: FetchOptions,
    #[serde(default)]
    pub blocks: BlockConfig,
    /// Keep only the first record per exact title, table-layer style.
    #[serde(default = "default_dedupe_titles")]
    pub dedupe_titles: bool,
}

fn default_dedupe_titles() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub source_url: String,
    pub page_title: Option<String>,
    pub strategy: Strategy,
    pub count: usize,
    pub note: Option<String>,
    pub records: Vec<Record>,
}
