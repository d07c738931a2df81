//! Unified theme extraction
//!
//! A fixed set of life themes, each with a keyword bag. An engine
//! contributes to a theme when its output mentions any of the keywords; the
//! matching excerpt is captured as the engine's contribution.

use std::collections::BTreeMap;

use arcana_core::StoredReading;
use serde_json::{json, Value};

/// The fixed theme set with keyword bags.
pub const THEME_KEYWORDS: [(&str, [&str; 4]); 6] = [
    ("purpose", ["life_path", "incarnation_cross", "purpose", "mission"]),
    ("relationships", ["compatibility", "partnership", "connection", "love"]),
    ("career", ["career", "profession", "calling", "service"]),
    ("growth", ["evolution", "development", "learning", "expansion"]),
    ("challenges", ["shadow", "obstacles", "lessons", "karma"]),
    ("gifts", ["talents", "abilities", "strengths", "gift"]),
];

/// A short excerpt around the first keyword hit.
fn excerpt(text: &str, keyword: &str) -> String {
    match text.find(keyword) {
        Some(pos) => {
            let start = pos.saturating_sub(40);
            let end = (pos + keyword.len() + 40).min(text.len());
            let mut s = start;
            while s < text.len() && !text.is_char_boundary(s) {
                s += 1;
            }
            let mut e = end;
            while e < text.len() && !text.is_char_boundary(e) {
                e += 1;
            }
            format!("…{}…", &text[s..e])
        }
        None => String::new(),
    }
}

/// Extract the unified themes across all outputs.
pub fn unified_themes(results: &BTreeMap<String, StoredReading>) -> Vec<Value> {
    let lowered: BTreeMap<&String, String> = results
        .iter()
        .map(|(engine, reading)| {
            let mut text = reading.output.raw_data.to_string().to_lowercase();
            if let Some(formatted) = reading.output.formatted_output.as_text() {
                text.push(' ');
                text.push_str(&formatted.to_lowercase());
            }
            (engine, text)
        })
        .collect();

    THEME_KEYWORDS
        .iter()
        .filter_map(|(theme, keywords)| {
            let sources: Vec<Value> = lowered
                .iter()
                .filter_map(|(engine, text)| {
                    keywords
                        .iter()
                        .find(|k| text.contains(**k))
                        .map(|k| {
                            json!({
                                "engine": engine,
                                "keyword": k,
                                "content": excerpt(text, k),
                            })
                        })
                })
                .collect();
            (!sources.is_empty()).then(|| {
                json!({
                    "theme": theme,
                    "sources": sources,
                    "unified_message": format!(
                        "Unified {} guidance from {} systems",
                        theme,
                        sources.len()
                    ),
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reading;

    #[test]
    fn themes_tag_contributing_engines() {
        let mut results = BTreeMap::new();
        results.insert(
            "numerology".to_string(),
            reading("numerology", json!({"life_path": 3, "karma": []})),
        );
        results.insert(
            "gene_keys".to_string(),
            reading("gene_keys", json!({"activation_sequence": {"lifes_work": {"gift": "Freshness"}}})),
        );

        let themes = unified_themes(&results);
        let names: Vec<&str> = themes.iter().filter_map(|t| t["theme"].as_str()).collect();
        assert!(names.contains(&"purpose"));
        assert!(names.contains(&"gifts"));
        assert!(names.contains(&"challenges"));

        let purpose = themes.iter().find(|t| t["theme"] == "purpose").unwrap();
        assert_eq!(purpose["sources"][0]["engine"], "numerology");
    }

    #[test]
    fn empty_results_produce_no_themes() {
        let results = BTreeMap::new();
        assert!(unified_themes(&results).is_empty());
    }

    #[test]
    fn excerpt_windows_around_keyword() {
        let text = "a very long prelude before the word purpose and a long postlude after it";
        let snippet = excerpt(text, "purpose");
        assert!(snippet.contains("purpose"));
        assert!(snippet.len() < text.len() + 4);
    }
}
