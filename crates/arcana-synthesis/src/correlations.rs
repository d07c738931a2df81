//! Cross-engine correlation finders
//!
//! Numerical patterns walk every output's `raw_data` recursively and report
//! numbers that surface from two or more engines. Archetypal resonance
//! matches a static keyword map against the stringified raw data. Temporal
//! and energy correlations pull from the dedicated engines when present.

use std::collections::BTreeMap;

use arcana_core::StoredReading;
use serde_json::{json, Value};

/// Recursively collect numeric leaves with their source engines.
fn collect_numbers(value: &Value, source: &str, numbers: &mut BTreeMap<String, Vec<String>>) {
    match value {
        Value::Object(map) => {
            for v in map.values() {
                collect_numbers(v, source, numbers);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_numbers(item, source, numbers);
            }
        }
        Value::Number(n) => {
            // Canonical text form keys the aggregation so 3 and 3.0 meet.
            let key = n
                .as_f64()
                .map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        format!("{}", f)
                    }
                })
                .unwrap_or_else(|| n.to_string());
            let sources = numbers.entry(key).or_default();
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }
        _ => {}
    }
}

/// Significance of a repeated number.
pub fn number_significance(number: &str) -> String {
    match number {
        "1" | "11" | "111" => "New beginnings, leadership, manifestation".to_string(),
        "2" | "22" | "222" => "Partnership, cooperation, balance".to_string(),
        "3" | "33" | "333" => "Creativity, communication, expression".to_string(),
        other => format!("Numerical resonance: {}", other),
    }
}

/// Numbers appearing in two or more engines, most frequent first.
pub fn numerical_patterns(results: &BTreeMap<String, StoredReading>) -> Vec<Value> {
    let mut numbers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (engine, reading) in results {
        collect_numbers(&reading.output.raw_data, engine, &mut numbers);
    }

    let mut patterns: Vec<Value> = numbers
        .into_iter()
        .filter(|(_, sources)| sources.len() >= 2)
        .map(|(number, sources)| {
            json!({
                "number": number,
                "frequency": sources.len(),
                "sources": sources,
                "significance": number_significance(&number),
            })
        })
        .collect();
    patterns.sort_by(|a, b| {
        b["frequency"]
            .as_u64()
            .cmp(&a["frequency"].as_u64())
            .then_with(|| a["number"].as_str().cmp(&b["number"].as_str()))
    });
    patterns
}

/// Static archetype-to-keyword map shared across the divination systems.
pub const ARCHETYPE_KEYWORDS: [(&str, [&str; 4]); 6] = [
    ("leadership", ["manifestor", "emperor", "line_1", "mars"]),
    ("wisdom", ["projector", "hermit", "line_6", "jupiter"]),
    ("creativity", ["generator", "empress", "line_3", "venus"]),
    ("reflection", ["reflector", "moon", "line_4", "neptune"]),
    ("transformation", ["death", "pluto", "line_5", "scorpio"]),
    ("communication", ["magician", "mercury", "line_2", "gemini"]),
];

/// Archetypes whose keyword bags intersect the stringified raw data of two
/// or more engines, strongest first.
pub fn archetypal_resonance(results: &BTreeMap<String, StoredReading>) -> Vec<Value> {
    let lowered: BTreeMap<&String, String> = results
        .iter()
        .map(|(engine, reading)| (engine, reading.output.raw_data.to_string().to_lowercase()))
        .collect();

    let mut archetypes: Vec<Value> = ARCHETYPE_KEYWORDS
        .iter()
        .filter_map(|(archetype, keywords)| {
            let engines: Vec<&str> = lowered
                .iter()
                .filter(|(_, text)| keywords.iter().any(|k| text.contains(k)))
                .map(|(engine, _)| engine.as_str())
                .collect();
            (engines.len() >= 2).then(|| {
                json!({
                    "archetype": archetype,
                    "engines": engines,
                    "strength": engines.len(),
                    "interpretation": format!(
                        "Strong {} archetype present across {} systems",
                        archetype,
                        engines.len()
                    ),
                })
            })
        })
        .collect();
    archetypes.sort_by(|a, b| b["strength"].as_u64().cmp(&a["strength"].as_u64()));
    archetypes
}

/// Temporal correlations: current cycles from the time-based engines.
pub fn temporal_correlations(results: &BTreeMap<String, StoredReading>) -> Value {
    let mut current_cycles = Vec::new();

    if let Some(biorhythm) = results.get("biorhythm") {
        if let Some(cycles) = biorhythm.output.raw_data.get("cycles").and_then(|c| c.as_object()) {
            for (name, cycle) in cycles {
                current_cycles.push(json!({
                    "system": "biorhythm",
                    "cycle": name,
                    "phase": cycle["phase"],
                    "percentage": cycle["percentage"],
                }));
            }
        }
    }

    if let Some(vimshottari) = results.get("vimshottari") {
        let current = &vimshottari.output.raw_data["current_periods"];
        for level in ["mahadasha", "antardasha", "pratyantardasha"] {
            if let Some(planet) = current[level]["planet"].as_str() {
                current_cycles.push(json!({
                    "system": "vimshottari",
                    "cycle": level,
                    "planet": planet,
                    "ends": current[level]["end_date"],
                }));
            }
        }
    }

    json!({ "current_cycles": current_cycles })
}

/// Energy correlations: Human Design centres and numerology vibrations.
pub fn energy_correlations(results: &BTreeMap<String, StoredReading>) -> Value {
    let mut energy_centers = Vec::new();
    let mut dominant_vibrations = Vec::new();

    if let Some(hd) = results.get("human_design") {
        if let Some(centers) = hd.output.raw_data["defined_centers"].as_array() {
            energy_centers = centers.clone();
        }
    }

    if let Some(numerology) = results.get("numerology") {
        for key in ["life_path", "expression", "soul_urge"] {
            if let Some(n) = numerology.output.raw_data[key].as_u64() {
                dominant_vibrations.push(json!({ "number": n, "source": key }));
            }
        }
    }

    json!({
        "energy_centers": energy_centers,
        "dominant_vibrations": dominant_vibrations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reading;

    #[test]
    fn repeated_numbers_reported_with_frequency() {
        let mut results = BTreeMap::new();
        results.insert("numerology".to_string(), reading("numerology", json!({"life_path": 3})));
        results.insert("tarot".to_string(), reading("tarot", json!({"card_count": 3})));
        results.insert("iching".to_string(), reading("iching", json!({"hexagram": 7})));

        let patterns = numerical_patterns(&results);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0]["number"], "3");
        assert_eq!(patterns[0]["frequency"], 2);
        assert_eq!(
            patterns[0]["significance"],
            "Creativity, communication, expression"
        );
    }

    #[test]
    fn integer_and_float_forms_meet() {
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), reading("a", json!({"x": 11})));
        results.insert("b".to_string(), reading("b", json!({"y": 11.0})));
        let patterns = numerical_patterns(&results);
        assert_eq!(patterns[0]["number"], "11");
        assert_eq!(patterns[0]["frequency"], 2);
    }

    #[test]
    fn unknown_numbers_get_generic_significance() {
        assert_eq!(number_significance("47"), "Numerical resonance: 47");
        assert_eq!(number_significance("111"), "New beginnings, leadership, manifestation");
    }

    #[test]
    fn archetype_needs_two_engines() {
        let mut results = BTreeMap::new();
        results.insert(
            "human_design".to_string(),
            reading("human_design", json!({"type": "Manifestor"})),
        );
        assert!(archetypal_resonance(&results).is_empty());

        results.insert(
            "tarot".to_string(),
            reading("tarot", json!({"cards": [{"name": "The Emperor"}]})),
        );
        let archetypes = archetypal_resonance(&results);
        assert_eq!(archetypes.len(), 1);
        assert_eq!(archetypes[0]["archetype"], "leadership");
        assert_eq!(archetypes[0]["strength"], 2);
    }

    #[test]
    fn temporal_pulls_biorhythm_and_vimshottari() {
        let mut results = BTreeMap::new();
        results.insert(
            "biorhythm".to_string(),
            reading(
                "biorhythm",
                json!({"cycles": {"physical": {"phase": "rising", "percentage": 42.0}}}),
            ),
        );
        results.insert(
            "vimshottari".to_string(),
            reading(
                "vimshottari",
                json!({"current_periods": {"mahadasha": {"planet": "Venus", "end_date": "2030-01-01"}}}),
            ),
        );
        let temporal = temporal_correlations(&results);
        let cycles = temporal["current_cycles"].as_array().unwrap();
        assert_eq!(cycles.len(), 2);
    }
}
