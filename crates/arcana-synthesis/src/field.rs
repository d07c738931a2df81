//! Field signature analysis
//!
//! Coherence is the mean of per-engine coherence scores; each engine's
//! coherence is its reported `confidence_score`. Stability derives from how
//! tightly those scores cluster. Reality patches trigger on low coherence
//! or low stability, and at least one evolution-acceleration patch is
//! always emitted.

use std::collections::BTreeMap;

use arcana_core::StoredReading;
use serde_json::{json, Value};

use crate::correlations::numerical_patterns;

/// Threshold below which enhancement patches are generated.
pub const PATCH_THRESHOLD: f64 = 0.6;

/// The computed field signature.
#[derive(Debug, Clone)]
pub struct FieldSignature {
    pub field_coherence: f64,
    pub field_stability: f64,
    pub dominant_frequency: Option<String>,
    pub evolution_direction: String,
    pub evolution_velocity: f64,
}

/// Per-engine coherence scores (engine name, score).
fn coherence_scores(results: &BTreeMap<String, StoredReading>) -> Vec<(String, f64)> {
    results
        .iter()
        .map(|(engine, reading)| (engine.clone(), reading.output.confidence_score))
        .collect()
}

/// Analyse the aggregate field for a set of engine outputs.
pub fn analyze_field(results: &BTreeMap<String, StoredReading>) -> FieldSignature {
    let scores = coherence_scores(results);
    let n = scores.len().max(1) as f64;

    let coherence = scores.iter().map(|(_, s)| s).sum::<f64>() / n;
    let variance = scores
        .iter()
        .map(|(_, s)| (s - coherence).powi(2))
        .sum::<f64>()
        / n;
    // Tight clustering reads as a stable field.
    let stability = (1.0 - variance.sqrt() * 2.0).clamp(0.0, 1.0);

    let dominant_frequency = numerical_patterns(results)
        .first()
        .and_then(|p| p["number"].as_str().map(String::from));

    let velocity = (coherence * stability).clamp(0.0, 1.0);
    let direction = if coherence >= PATCH_THRESHOLD && stability >= PATCH_THRESHOLD {
        "expansion"
    } else if coherence >= PATCH_THRESHOLD {
        "consolidation"
    } else {
        "integration"
    };

    FieldSignature {
        field_coherence: coherence,
        field_stability: stability,
        dominant_frequency,
        evolution_direction: direction.to_string(),
        evolution_velocity: velocity,
    }
}

/// Deterministic reality patches from the field signature.
pub fn reality_patches(signature: &FieldSignature) -> Vec<Value> {
    let mut patches = Vec::new();

    if signature.field_coherence < PATCH_THRESHOLD {
        patches.push(json!({
            "type": "coherence_enhancement",
            "area": "field_alignment",
            "action": "Practice integration meditation",
            "timeline": "daily",
        }));
    }
    if signature.field_stability < PATCH_THRESHOLD {
        patches.push(json!({
            "type": "stability_enhancement",
            "area": "grounding",
            "action": "Establish daily grounding practices",
            "timeline": "ongoing",
        }));
    }
    // An evolution patch is always present.
    patches.push(json!({
        "type": "evolution_acceleration",
        "area": "consciousness_expansion",
        "action": format!(
            "Lean into the {} current with one deliberate practice",
            signature.evolution_direction
        ),
        "timeline": "gradual",
    }));

    patches
}

/// The field signature as a JSON document.
pub fn signature_json(signature: &FieldSignature) -> Value {
    json!({
        "field_coherence": signature.field_coherence,
        "field_stability": signature.field_stability,
        "dominant_frequency": signature.dominant_frequency,
        "evolution_vector": {
            "direction": signature.evolution_direction,
            "velocity": signature.evolution_velocity,
        },
    })
}
