//! Arcana Synthesis -- cross-engine correlation and field analysis
//!
//! Consumes the outputs of one multi-engine request and produces a
//! synthesis document: numerical patterns, archetypal resonance, temporal
//! and energy correlations, unified themes, the field signature, and
//! deterministic reality patches. The synthesiser is a pure function over
//! outputs; it never calls engines.

pub mod correlations;
pub mod field;
pub mod themes;

use std::collections::BTreeMap;

use arcana_core::StoredReading;
use chrono::Utc;
use serde_json::{json, Value};

pub use correlations::{
    archetypal_resonance, energy_correlations, numerical_patterns, temporal_correlations,
};
pub use field::{analyze_field, reality_patches, FieldSignature, PATCH_THRESHOLD};
pub use themes::unified_themes;

/// Synthesize all outputs of one request into a unified document.
pub fn synthesize(results: &BTreeMap<String, StoredReading>) -> Value {
    let signature = analyze_field(results);
    let patches = reality_patches(&signature);

    json!({
        "timestamp": Utc::now().to_rfc3339(),
        "engines_analyzed": results.keys().collect::<Vec<_>>(),
        "correlations": {
            "numerical_patterns": numerical_patterns(results),
            "archetypal_resonance": archetypal_resonance(results),
            "temporal_alignments": temporal_correlations(results),
            "energy_signatures": energy_correlations(results),
        },
        "unified_themes": unified_themes(results),
        "field_signature": field::signature_json(&signature),
        "reality_patches": patches,
    })
}

// ---------------------------------------------------------------------------
// Shared test fixtures
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_support {
    use arcana_core::{EngineOutput, FormattedOutput, PrivacyLevel, StoredReading};
    use chrono::Utc;
    use serde_json::Value;

    pub fn reading(engine: &str, raw_data: Value) -> StoredReading {
        reading_with_confidence(engine, raw_data, 1.0)
    }

    pub fn reading_with_confidence(engine: &str, raw_data: Value, confidence: f64) -> StoredReading {
        let now = Utc::now();
        StoredReading {
            output: EngineOutput {
                engine_name: engine.to_string(),
                calculation_time_seconds: 0.01,
                confidence_score: confidence,
                timestamp: now,
                raw_data,
                formatted_output: FormattedOutput::Text(String::new()),
                recommendations: Vec::new(),
                field_signature: None,
                reality_patches: Vec::new(),
                archetypal_themes: Vec::new(),
            },
            reading_id: format!("test-{}", engine),
            user_id: None,
            created_at: now,
            updated_at: now,
            expires_at: None,
            storage_metadata: serde_json::Map::new(),
            kv_cache_keys: Vec::new(),
            d1_table_refs: Vec::new(),
            privacy_level: PrivacyLevel::Standard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::reading;

    #[test]
    fn synthesis_document_shape() {
        let mut results = BTreeMap::new();
        results.insert(
            "numerology".to_string(),
            reading("numerology", json!({"life_path": 3, "expression": 44})),
        );
        results.insert(
            "tarot".to_string(),
            reading("tarot", json!({"card_count": 3, "cards": [{"name": "The Emperor"}]})),
        );

        let synthesis = synthesize(&results);
        assert_eq!(synthesis["engines_analyzed"].as_array().unwrap().len(), 2);
        assert!(synthesis["correlations"]["numerical_patterns"].is_array());
        assert!(synthesis["correlations"]["archetypal_resonance"].is_array());
        assert!(synthesis["unified_themes"].is_array());
        assert!(synthesis["field_signature"]["field_coherence"].is_f64());
        assert!(!synthesis["reality_patches"].as_array().unwrap().is_empty());
    }

    #[test]
    fn synthesis_of_empty_results_is_well_formed() {
        let results = BTreeMap::new();
        let synthesis = synthesize(&results);
        assert_eq!(synthesis["engines_analyzed"].as_array().unwrap().len(), 0);
        // Even an empty field receives an evolution patch.
        assert!(!synthesis["reality_patches"].as_array().unwrap().is_empty());
    }
}
