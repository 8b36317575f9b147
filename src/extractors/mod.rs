//! Menu extraction heuristics.
//!
//! Two independent strategies over an already-fetched page:
//! - `json_miner`: walk the hidden JSON payload single-page apps embed in
//!   their markup and collect every object that looks like a product
//! - `currency_blocks`: find price-shaped text in the rendered document and
//!   recover the product card around each match
//!
//! Both are pure transformations with no state beyond a per-run seen-set.

mod currency_blocks;
mod json_miner;

pub use currency_blocks::{extract_element_scan, extract_text_first, BlockConfig};
pub use json_miner::{locate_payload, mine};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::Record;

/// User-visible note when a page carries no embedded data payload.
pub const PAYLOAD_MISSING: &str = "embedded data payload not found in page source";

// ── Strategy dispatch ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Embedded JSON first, currency text mining when it yields nothing.
    #[default]
    Auto,
    EmbeddedJson,
    CurrencyText,
    CurrencyScan,
}

/// Result of one extraction run: the records, the strategy that actually
/// produced them, and an optional user-visible note.
#[derive(Debug)]
pub struct Outcome {
    pub strategy: Strategy,
    pub note: Option<String>,
    pub records: Vec<Record>,
}

pub fn run(requested: Strategy, html: &str, config: &BlockConfig) -> Outcome {
    match requested {
        Strategy::EmbeddedJson => match locate_payload(html) {
            Some(payload) => Outcome {
                strategy: Strategy::EmbeddedJson,
                note: None,
                records: mine(&payload),
            },
            None => Outcome {
                strategy: Strategy::EmbeddedJson,
                note: Some(PAYLOAD_MISSING.to_string()),
                records: Vec::new(),
            },
        },
        Strategy::CurrencyText => Outcome {
            strategy: Strategy::CurrencyText,
            note: None,
            records: extract_text_first(html, config),
        },
        Strategy::CurrencyScan => Outcome {
            strategy: Strategy::CurrencyScan,
            note: None,
            records: extract_element_scan(html, config),
        },
        Strategy::Auto => {
            let mut note = None;
            match locate_payload(html) {
                Some(payload) => {
                    let records = mine(&payload);
                    if !records.is_empty() {
                        return Outcome {
                            strategy: Strategy::EmbeddedJson,
                            note: None,
                            records,
                        };
                    }
                }
                None => note = Some(PAYLOAD_MISSING.to_string()),
            }
            Outcome {
                strategy: Strategy::CurrencyText,
                note,
                records: extract_text_first(html, config),
            }
        }
    }
}

// ── Shared text utilities ────────────────────────────────────────────────────

/// Collapse whitespace runs into single spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Per-run guard keeping every accepted raw fragment unique. Owned by one
/// extraction call; never shared across runs or threads.
#[derive(Debug, Default)]
pub struct SeenSet(HashSet<String>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim a fragment, reject empties and repeats, and hand back the owned
    /// text on first sight.
    pub fn admit(&mut self, fragment: &str) -> Option<String> {
        let trimmed = fragment.trim();
        if trimmed.is_empty() || self.0.contains(trimmed) {
            return None;
        }
        self.0.insert(trimmed.to_string());
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_runs() {
        assert_eq!(normalize_text("  Pizza \n\t Margherita  "), "Pizza Margherita");
        assert_eq!(normalize_text("\n \t "), "");
    }

    #[test]
    fn seen_set_admits_once() {
        let mut seen = SeenSet::new();
        assert_eq!(seen.admit("  Tacos 30 MAD "), Some("Tacos 30 MAD".to_string()));
        assert_eq!(seen.admit("Tacos 30 MAD"), None);
        assert_eq!(seen.admit("   "), None);
        assert_eq!(seen.admit("Tacos 35 MAD"), Some("Tacos 35 MAD".to_string()));
    }

    #[test]
    fn auto_prefers_embedded_payload() {
        let html = r#"
        <html><body>
        <script id="__NEXT_DATA__">{"props":{"menu":[{"name":"Tacos","price":"30"}]}}</script>
        <div>Pizza Margherita | 45 MAD</div>
        </body></html>
        "#;
        let outcome = run(Strategy::Auto, html, &BlockConfig::default());
        assert_eq!(outcome.strategy, Strategy::EmbeddedJson);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].title, "Tacos");
    }

    #[test]
    fn auto_falls_back_to_currency_mining() {
        let html = "<html><body><div>Pizza Margherita | 45 MAD</div></body></html>";
        let outcome = run(Strategy::Auto, html, &BlockConfig::default());
        assert_eq!(outcome.strategy, Strategy::CurrencyText);
        assert_eq!(outcome.note.as_deref(), Some(PAYLOAD_MISSING));
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].price, "45 MAD");
    }

    #[test]
    fn explicit_json_strategy_reports_missing_payload() {
        let outcome = run(
            Strategy::EmbeddedJson,
            "<html><body><div>Pizza | 45 MAD</div></body></html>",
            &BlockConfig::default(),
        );
        assert_eq!(outcome.strategy, Strategy::EmbeddedJson);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.note.as_deref(), Some(PAYLOAD_MISSING));
    }
}
