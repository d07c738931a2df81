//! Biofield Divination Engine
//!
//! Energy-field analysis over the seventeen biofield metrics (light quantum
//! density, intensity statistics, symmetry, fractal and spatial measures,
//! colour distribution, flow and coherence) plus composite scores. Processes
//! biometric imagery and refuses to run without explicit
//! `data_processing_consent`.
//!
//! Image decoding is an external collaborator; this engine runs in
//! simulation mode, deriving every metric deterministically from a hash of
//! the submitted frame. The contract (metric names, [0, 1] ranges,
//! composites, no raw bytes in `raw_data`) holds in both modes.

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// The seventeen biofield metrics, in canonical order.
pub const BIOFIELD_METRICS: [&str; 17] = [
    "light_quantum_density",
    "average_intensity",
    "intensity_variance",
    "symmetry_score",
    "fractal_dimension",
    "pattern_complexity",
    "color_distribution",
    "color_entropy",
    "color_coherence",
    "spatial_frequency",
    "edge_density",
    "texture_uniformity",
    "energy_flow_direction",
    "field_radius",
    "field_symmetry",
    "harmonic_resonance",
    "coherence_index",
];

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    fn unit(&mut self) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[derive(Debug, Deserialize)]
struct BiofieldInput {
    image_data: String,
    #[serde(default = "default_mode")]
    analysis_mode: String,
    #[serde(default)]
    metrics_requested: Vec<String>,
}

fn default_mode() -> String {
    "single_frame".into()
}

pub struct BiofieldEngine;

impl BiofieldEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BiofieldEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for BiofieldEngine {
    fn name(&self) -> &'static str {
        "biofield"
    }

    fn description(&self) -> &'static str {
        "Biofield viewer — seventeen-metric energy field analysis with composite coherence scoring"
    }

    fn requires_consent(&self) -> bool {
        true
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("image_data", FieldKind::String, "Base64 biofield frame"),
            FieldSpec::optional("analysis_mode", FieldKind::String, "Frame handling")
                .one_of(&["single_frame", "sequence"]),
            FieldSpec::optional("metrics_requested", FieldKind::Array, "Subset of metrics to report"),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("metrics", FieldKind::Object, "The seventeen biofield metrics"),
            FieldSpec::required("composite_scores", FieldKind::Object, "Energy/symmetry/coherence"),
            FieldSpec::required("image_hash", FieldKind::String, "Hash of the analysed frame"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed: BiofieldInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        if parsed.image_data.is_empty() {
            return Err(EngineError::invalid_input("image_data", "must not be empty"));
        }
        for metric in &parsed.metrics_requested {
            if !BIOFIELD_METRICS.contains(&metric.as_str()) {
                return Err(EngineError::invalid_input(
                    "metrics_requested",
                    format!("unknown metric '{}'", metric),
                ));
            }
        }

        // Frame bytes feed the hash and are then dropped; only derived
        // features appear in the output.
        let image_hash = format!("{:016x}", fnv1a(parsed.image_data.as_bytes()));
        let mut rng = SplitMix64(fnv1a(parsed.image_data.as_bytes()));

        let mut metrics = serde_json::Map::new();
        for name in BIOFIELD_METRICS {
            if !parsed.metrics_requested.is_empty()
                && !parsed.metrics_requested.iter().any(|m| m == name)
            {
                // Still advance the stream so a subset request stays
                // consistent with the full report.
                rng.unit();
                continue;
            }
            let value = (rng.unit() * 1000.0).round() / 1000.0;
            metrics.insert(name.to_string(), json!(value));
        }

        let mean = |keys: &[&str]| -> f64 {
            let values: Vec<f64> = keys
                .iter()
                .filter_map(|k| metrics.get(*k).and_then(|v| v.as_f64()))
                .collect();
            if values.is_empty() {
                0.5
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };

        let energy_score = mean(&["light_quantum_density", "average_intensity", "field_radius"]);
        let symmetry_score = mean(&["symmetry_score", "field_symmetry", "texture_uniformity"]);
        let coherence_score = mean(&["color_coherence", "harmonic_resonance", "coherence_index"]);

        Ok(json!({
            "analysis_mode": parsed.analysis_mode,
            "simulation": true,
            "image_hash": image_hash,
            "metrics": metrics,
            "composite_scores": {
                "energy_score": energy_score,
                "symmetry_score": symmetry_score,
                "coherence_score": coherence_score,
            },
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let composites = &raw["composite_scores"];
        let coherence = composites["coherence_score"].as_f64().unwrap_or(0.0);
        let mut text = String::from("✨ BIOFIELD ANALYSIS TRANSMISSION ✨\n\n");
        text.push_str(&format!(
            "⚡ Energy: {:.2}\n🪞 Symmetry: {:.2}\n🌀 Coherence: {:.2}\n\n",
            composites["energy_score"].as_f64().unwrap_or(0.0),
            composites["symmetry_score"].as_f64().unwrap_or(0.0),
            coherence,
        ));
        text.push_str(if coherence > 0.66 {
            "The field reads coherent and well-organised.\n"
        } else if coherence > 0.33 {
            "The field shows mixed coherence; gentle regulation practices will help.\n"
        } else {
            "The field reads scattered; grounding and rest are the first medicine.\n"
        });
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let coherence = raw["composite_scores"]["coherence_score"]
            .as_f64()
            .unwrap_or(0.5);
        let mut recs = vec!["Re-scan under similar lighting to track field trends".to_string()];
        if coherence < 0.5 {
            recs.push("Low coherence: prioritise breathwork and reduced stimulation today".into());
        }
        recs
    }

    fn reality_patches(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut patches = Vec::new();
        if raw["composite_scores"]["energy_score"].as_f64().unwrap_or(0.5) < 0.4 {
            patches.push("Install: energy restoration window before demanding work".into());
        }
        patches.push("Activate: daily field-awareness check-in".into());
        patches
    }

    fn archetypal_themes(&self, _raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec!["The Field Keeper".to_string()]
    }

    /// Simulation metrics are indicative, not measured.
    fn confidence(&self, _raw: &Value, _input: &ValidatedInput) -> f64 {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::RequestEnvelope;
    use serde_json::Map;

    fn input(payload: Value) -> ValidatedInput {
        let map: Map<String, Value> = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        ValidatedInput::new(RequestEnvelope::default(), map)
    }

    #[test]
    fn engine_requires_consent() {
        assert!(BiofieldEngine::new().requires_consent());
    }

    #[test]
    fn reports_all_seventeen_metrics() {
        let engine = BiofieldEngine::new();
        let raw = engine
            .calculate(&input(json!({ "image_data": "YmlvZmllbGQtZnJhbWU=" })))
            .unwrap();
        let metrics = raw["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 17);
        for (name, value) in metrics {
            let v = value.as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v), "{} = {}", name, v);
        }
        for score in ["energy_score", "symmetry_score", "coherence_score"] {
            let v = raw["composite_scores"][score].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn metric_subset_respected_and_consistent() {
        let engine = BiofieldEngine::new();
        let full = engine
            .calculate(&input(json!({ "image_data": "c2FtZS1mcmFtZQ==" })))
            .unwrap();
        let subset = engine
            .calculate(&input(json!({
                "image_data": "c2FtZS1mcmFtZQ==",
                "metrics_requested": ["symmetry_score", "coherence_index"]
            })))
            .unwrap();
        assert_eq!(subset["metrics"].as_object().unwrap().len(), 2);
        // Subset values match the full report for the same frame.
        assert_eq!(full["metrics"]["symmetry_score"], subset["metrics"]["symmetry_score"]);
        assert_eq!(full["metrics"]["coherence_index"], subset["metrics"]["coherence_index"]);
    }

    #[test]
    fn unknown_metric_rejected() {
        let engine = BiofieldEngine::new();
        let err = engine
            .calculate(&input(json!({
                "image_data": "eA==",
                "metrics_requested": ["aura_voltage"]
            })))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn raw_data_never_contains_frame_bytes() {
        let engine = BiofieldEngine::new();
        let frame = "dmVyeS1wcml2YXRlLWJpb21ldHJpYy1ieXRlcw==";
        let raw = engine.calculate(&input(json!({ "image_data": frame }))).unwrap();
        assert!(!raw.to_string().contains(frame));
    }

    #[test]
    fn deterministic_per_frame() {
        let engine = BiofieldEngine::new();
        let payload = json!({ "image_data": "ZnJhbWUtYQ==" });
        let a = engine.calculate(&input(payload.clone())).unwrap();
        let b = engine.calculate(&input(payload)).unwrap();
        assert_eq!(a, b);
        let other = engine
            .calculate(&input(json!({ "image_data": "ZnJhbWUtYg==" })))
            .unwrap();
        assert_ne!(a["metrics"], other["metrics"]);
    }
}
