//! Hidden-payload product mining.
//!
//! Single-page storefronts ship the menu they render as a JSON blob inside
//! `<script id="__NEXT_DATA__">`. The blob's shape is unstable (the nesting
//! changes between deployments), so instead of addressing a path into it we
//! walk the whole tree and keep every object that looks like a product.

use scraper::{Html, Selector};
use serde_json::{Map, Value};

use crate::models::{Record, UNKNOWN_CATEGORY};

const PAYLOAD_SELECTOR: &str = r#"script#__NEXT_DATA__"#;

/// Find the embedded data payload and parse it. None when the marker tag is
/// absent or its content is not valid JSON; callers treat that as "no
/// data", not as an error.
pub fn locate_payload(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(PAYLOAD_SELECTOR).ok()?;

    for element in document.select(&selector) {
        let content = element.inner_html();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Ok(payload) = serde_json::from_str::<Value>(trimmed) {
            return Some(payload);
        }
    }
    None
}

/// Collect a Record for every object in the tree carrying both a `name` and
/// a `price` key. Pre-order, non-exclusive: children of an accepted object
/// are still visited and may emit their own records. No dedup at this
/// layer; that is a text-mining concern.
pub fn mine(document: &Value) -> Vec<Record> {
    let mut records = Vec::new();

    // Explicit work-list instead of recursion: real payloads nest deeply
    // enough to threaten the call stack. Children are pushed in reverse so
    // pop order matches document order.
    let mut pending = vec![document];
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(map) => {
                if let Some(record) = candidate(map) {
                    records.push(record);
                }
                for child in map.values().rev() {
                    pending.push(child);
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev() {
                    pending.push(item);
                }
            }
            _ => {}
        }
    }

    records
}

fn candidate(map: &Map<String, Value>) -> Option<Record> {
    let name = map.get("name")?;
    let price = map.get("price")?;

    Some(Record {
        title: scalar_text(name),
        price: scalar_text(price),
        description: map
            .get("description")
            .filter(|v| !v.is_null())
            .map(scalar_text),
        category: map
            .get("categoryName")
            .filter(|v| !v.is_null())
            .map(scalar_text)
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
        raw_text: None,
    })
}

/// String values pass through untouched; other scalars keep their JSON
/// rendering (`30` stays `"30"`).
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_product_objects_yields_nothing() {
        let doc = json!({"props": {"pageProps": {"store": {"city": "Casablanca"}}}});
        assert!(mine(&doc).is_empty());
    }

    #[test]
    fn name_and_price_values_are_kept_verbatim() {
        let doc = json!({
            "name": "Tacos Mixte",
            "price": "35.50",
            "description": "Poulet et viande hachée",
            "categoryName": "Tacos"
        });
        let records = mine(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Tacos Mixte");
        assert_eq!(records[0].price, "35.50");
        assert_eq!(records[0].description.as_deref(), Some("Poulet et viande hachée"));
        assert_eq!(records[0].category, "Tacos");
        assert!(records[0].raw_text.is_none());
    }

    #[test]
    fn numeric_price_keeps_its_json_rendering() {
        let doc = json!({"name": "Tacos", "price": 30});
        let records = mine(&doc);
        assert_eq!(records[0].price, "30");
    }

    #[test]
    fn missing_companions_fall_back() {
        let doc = json!({"name": "Burger", "price": "25"});
        let records = mine(&doc);
        assert!(records[0].description.is_none());
        assert_eq!(records[0].category, UNKNOWN_CATEGORY);
    }

    #[test]
    fn structurally_distinct_duplicates_both_survive() {
        let doc = json!({
            "a": {"name": "Tacos", "price": "30"},
            "b": {"c": {"name": "Tacos", "price": "30"}}
        });
        assert_eq!(mine(&doc).len(), 2);
    }

    #[test]
    fn acceptance_does_not_stop_descent() {
        // A container that incidentally carries name/price still has its
        // nested products visited.
        let doc = json!({
            "name": "Store",
            "price": "0",
            "items": [
                {"name": "Pizza", "price": "45"},
                {"name": "Burger", "price": "25"}
            ]
        });
        let records = mine(&doc);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "Store");
        assert_eq!(records[1].title, "Pizza");
        assert_eq!(records[2].title, "Burger");
    }

    #[test]
    fn discovery_order_is_pre_order() {
        let doc = json!({
            "first": {"name": "A", "price": "1"},
            "second": [{"name": "B", "price": "2"}, {"name": "C", "price": "3"}]
        });
        let titles: Vec<String> = mine(&doc).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn key_match_is_case_sensitive() {
        let doc = json!({"Name": "Tacos", "Price": "30"});
        assert!(mine(&doc).is_empty());
    }

    #[test]
    fn locates_embedded_payload() {
        let html = r#"
        <html><body>
        <script id="__NEXT_DATA__">{"props": {"name": "Tacos", "price": "30"}}</script>
        </body></html>
        "#;
        let payload = locate_payload(html).expect("payload");
        assert_eq!(mine(&payload).len(), 1);
    }

    #[test]
    fn missing_marker_is_none() {
        assert!(locate_payload("<html><body><p>menu</p></body></html>").is_none());
    }

    #[test]
    fn malformed_payload_is_none() {
        let html = r#"<script id="__NEXT_DATA__">{not json</script>"#;
        assert!(locate_payload(html).is_none());
    }
}
