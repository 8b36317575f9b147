//! Currency-pattern text mining.
//!
//! When a page embeds no data payload, the menu is still on screen: product
//! cards are text blocks that contain a price. Two ways to find them, both
//! kept as public entry points:
//!
//! - text-node-first: price-shaped text nodes seed a bounded walk up the
//!   ancestor chain to recover the enclosing card
//! - element-scan: every allow-listed element whose text carries a price and
//!   fits a card-sized length range is taken as a block
//!
//! Everything here is threshold-driven guesswork; blocks outside the
//! configured bounds are skipped silently, never reported as errors.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef, Html};
use serde::Deserialize;

use super::{normalize_text, SeenSet};
use crate::models::{Record, UNKNOWN_CATEGORY};

// ── Constants ────────────────────────────────────────────────────────────────

/// Visible separator inserted between descendant text fragments so the
/// title/price split can recover block structure.
const PART_SEPARATOR: &str = " | ";

/// Tags whose text never renders.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A number adjacent to a currency token, either order, optional whitespace.
/// Alphabetic tokens are case-insensitive and word-bounded.
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\d+(?:[.,]\d+)?\s*(?:(?:mad|dhs?|eur|usd|gbp)\b|[€$£])|(?:\b(?:mad|dhs?|eur|usd|gbp)|[€$£])\s*\d+(?:[.,]\d+)?)",
    )
    .unwrap()
});

// ── Configuration ────────────────────────────────────────────────────────────

/// Tunable thresholds for block recovery. Defaults reproduce the behavior
/// observed on delivery-menu pages; all of them are guesses, so they are
/// request parameters rather than constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockConfig {
    /// Ancestor hops tried when recovering the card around a price text node.
    pub max_hops: usize,
    /// Blocks at or below this many characters are stray price tags, not cards.
    pub min_block_chars: usize,
    /// Blocks above this many characters are layout containers, not cards.
    pub max_block_chars: usize,
    /// Tags eligible to act as a card boundary.
    pub containers: Vec<String>,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            max_hops: 4,
            min_block_chars: 10,
            max_block_chars: 350,
            containers: ["div", "li", "article", "section", "p", "td", "span", "a", "h2", "h3", "h4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BlockConfig {
    fn is_container(&self, tag: &str) -> bool {
        self.containers.iter().any(|t| t == tag)
    }
}

// ── Title/price split ────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum TitleRule {
    /// Skip parts containing the price anywhere (ancestor-walk blocks, whose
    /// seed fragment may mix title and price in one text node).
    WithoutPrice,
    /// Skip only parts that are exactly the price (element-scan blocks).
    NotPrice,
}

fn guess_title(block: &str, price: &str, rule: TitleRule) -> String {
    let parts: Vec<&str> = block.split(PART_SEPARATOR).collect();
    parts
        .iter()
        .copied()
        .find(|&part| match rule {
            TitleRule::WithoutPrice => !part.contains(price),
            TitleRule::NotPrice => part != price,
        })
        // Degenerate case: the price is the whole block. The raw fragment is
        // the best title guess available.
        .unwrap_or(parts[0])
        .to_string()
}

// ── Sub-strategy: text-node-first ────────────────────────────────────────────

/// Seed on every visible text node matching the price pattern, then walk up
/// at most `max_hops` ancestors to the first allow-listed container with
/// enough text to be a card. Output follows the order of the seeds.
pub fn extract_text_first(html: &str, config: &BlockConfig) -> Vec<Record> {
    let document = Html::parse_document(html);
    let mut seen = SeenSet::new();
    let mut records = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        if !PRICE_RE.is_match(&text.text) {
            continue;
        }
        let parent_invisible = node
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| INVISIBLE_TAGS.contains(&el.value().name()))
            .unwrap_or(false);
        if parent_invisible {
            continue;
        }

        let mut hops = 0;
        for ancestor in node.ancestors() {
            hops += 1;
            if hops > config.max_hops {
                break;
            }
            let Some(el) = ElementRef::wrap(ancestor) else {
                continue;
            };
            if !config.is_container(el.value().name()) {
                continue;
            }
            let block = block_text(el);
            let chars = block.chars().count();
            if chars <= config.min_block_chars {
                continue;
            }
            // First qualifying ancestor decides the card; oversized ones are
            // whole-page containers and the match is dropped with them.
            if chars <= config.max_block_chars {
                if let Some(record) = admit_block(&block, &mut seen, TitleRule::WithoutPrice) {
                    records.push(record);
                }
            }
            break;
        }
    }

    records
}

// ── Sub-strategy: element-scan ───────────────────────────────────────────────

/// Take every allow-listed element, in document order, whose text matches
/// the price pattern and fits the card-sized length range.
pub fn extract_element_scan(html: &str, config: &BlockConfig) -> Vec<Record> {
    let document = Html::parse_document(html);
    let mut seen = SeenSet::new();
    let mut records = Vec::new();

    for node in document.root_element().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if !config.is_container(el.value().name()) {
            continue;
        }
        let block = block_text(el);
        let chars = block.chars().count();
        if chars <= config.min_block_chars || chars > config.max_block_chars {
            continue;
        }
        if !PRICE_RE.is_match(&block) {
            continue;
        }
        if let Some(record) = admit_block(&block, &mut seen, TitleRule::NotPrice) {
            records.push(record);
        }
    }

    records
}

// ── Block assembly ───────────────────────────────────────────────────────────

fn admit_block(block: &str, seen: &mut SeenSet, rule: TitleRule) -> Option<Record> {
    let raw = seen.admit(block)?;
    let price = PRICE_RE.find(&raw)?.as_str().to_string();
    let title = guess_title(&raw, &price, rule);

    Some(Record {
        title,
        price,
        description: None,
        category: UNKNOWN_CATEGORY.to_string(),
        raw_text: Some(raw),
    })
}

/// Full rendered text of an element: descendant fragments, whitespace
/// normalized, joined with the visible separator. Invisible subtrees are
/// left out.
fn block_text(el: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_fragments(el, &mut parts);
    parts.join(PART_SEPARATOR)
}

fn collect_fragments(el: ElementRef<'_>, parts: &mut Vec<String>) {
    if INVISIBLE_TAGS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let fragment = normalize_text(&text.text);
                if !fragment.is_empty() {
                    parts.push(fragment);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_fragments(child_el, parts);
                }
            }
            _ => {}
        }
    }
}
