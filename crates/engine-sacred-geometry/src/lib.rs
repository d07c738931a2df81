//! Sacred Geometry Divination Engine
//!
//! Generates personalized geometric patterns as pure geometric descriptions
//! (element lists, ratios, meditation points) over the arcana-geometry
//! primitives. Pattern parameters can be derived from the birth date when a
//! "personal" pattern is requested. No rendering -- image synthesis belongs
//! to a presentation layer outside the core.

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use arcana_geometry::{
    flower_of_life, golden_spiral_pattern, mandala, platonic_vertices, sri_yantra, vesica_piscis,
    Pattern, Point,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

const TEMPLATES_JSON: &str = include_str!("../data/templates.json");

/// Default construction parameters per pattern, loaded from
/// `data/templates.json` and shape-asserted at first use.
fn templates() -> &'static serde_json::Map<String, Value> {
    static TEMPLATES: OnceLock<serde_json::Map<String, Value>> = OnceLock::new();
    TEMPLATES.get_or_init(|| {
        let value: Value =
            serde_json::from_str(TEMPLATES_JSON).expect("templates.json is malformed");
        let map = value.as_object().expect("templates.json must be an object").clone();
        for key in [
            "mandala",
            "flower_of_life",
            "sri_yantra",
            "golden_spiral",
            "vesica_piscis",
            "platonic_solid",
        ] {
            assert!(map.contains_key(key), "template '{}' missing", key);
        }
        map
    })
}

fn template_u64(pattern: &str, key: &str, fallback: u64) -> u64 {
    templates()[pattern][key].as_u64().unwrap_or(fallback)
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeometryInput {
    intention: String,
    #[serde(default)]
    birth_date: Option<NaiveDate>,
    #[serde(default = "default_pattern")]
    pattern_type: String,
    #[serde(default)]
    petal_count: Option<u32>,
    #[serde(default)]
    layer_count: Option<u32>,
    #[serde(default)]
    spiral_turns: Option<u32>,
    #[serde(default)]
    solid_type: Option<String>,
}

fn default_pattern() -> String {
    "personal".into()
}

/// Personal pattern selection: the birth date picks the archetype.
fn personal_pattern_type(birth_date: Option<NaiveDate>, intention: &str) -> &'static str {
    let seed = birth_date
        .map(|d| d.day() + d.month() + d.year().unsigned_abs())
        .unwrap_or(intention.len() as u32);
    match seed % 6 {
        0 => "mandala",
        1 => "flower_of_life",
        2 => "sri_yantra",
        3 => "golden_spiral",
        4 => "vesica_piscis",
        _ => "platonic_solid",
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct SacredGeometryEngine;

impl SacredGeometryEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SacredGeometryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn symbolism_for(pattern_type: &str) -> &'static str {
    match pattern_type {
        "mandala" => "Wholeness radiating from a still centre",
        "flower_of_life" => "The lattice from which all forms unfold",
        "sri_yantra" => "The union of ascending and descending currents",
        "golden_spiral" => "Growth that keeps its own proportion",
        "vesica_piscis" => "The womb of form where two fields overlap",
        "platonic_solid" => "The elemental building blocks of space",
        _ => "Geometric resonance",
    }
}

impl DivinationEngine for SacredGeometryEngine {
    fn name(&self) -> &'static str {
        "sacred_geometry"
    }

    fn description(&self) -> &'static str {
        "Sacred geometry mapper — personalized mandalas, yantras and harmonic forms as geometric descriptions"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("intention", FieldKind::String, "Focus for the pattern"),
            FieldSpec::optional("birth_date", FieldKind::Date, "Birth date for personalization"),
            FieldSpec::optional("pattern_type", FieldKind::String, "Pattern archetype").one_of(&[
                "mandala",
                "flower_of_life",
                "sri_yantra",
                "golden_spiral",
                "vesica_piscis",
                "platonic_solid",
                "personal",
            ]),
            FieldSpec::optional("petal_count", FieldKind::Integer, "Mandala petals").range(4.0, 24.0),
            FieldSpec::optional("layer_count", FieldKind::Integer, "Concentric layers").range(2.0, 8.0),
            FieldSpec::optional("spiral_turns", FieldKind::Integer, "Spiral turns").range(2.0, 10.0),
            FieldSpec::optional("solid_type", FieldKind::String, "Platonic solid").one_of(&[
                "tetrahedron",
                "cube",
                "octahedron",
                "dodecahedron",
                "icosahedron",
            ]),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("primary_pattern", FieldKind::Object, "Geometric description"),
            FieldSpec::required("sacred_ratios", FieldKind::Object, "Ratios present"),
            FieldSpec::required("meditation_points", FieldKind::Array, "Focal points"),
            FieldSpec::required("geometric_meaning", FieldKind::String, "Symbolism"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed: GeometryInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        if parsed.intention.trim().is_empty() {
            return Err(EngineError::invalid_input("intention", "must not be empty"));
        }

        let resolved_type = if parsed.pattern_type == "personal" {
            personal_pattern_type(parsed.birth_date, &parsed.intention).to_string()
        } else {
            parsed.pattern_type.clone()
        };

        let center = Point::new(0.0, 0.0);
        let petals = parsed
            .petal_count
            .unwrap_or_else(|| template_u64("mandala", "petal_count", 12) as u32)
            as usize;
        let layers = parsed
            .layer_count
            .unwrap_or_else(|| template_u64("mandala", "layer_count", 3) as u32)
            as usize;
        let turns = parsed
            .spiral_turns
            .unwrap_or_else(|| template_u64("golden_spiral", "spiral_turns", 4) as u32)
            as usize;

        let (pattern, solid): (Option<Pattern>, Option<Value>) = match resolved_type.as_str() {
            "mandala" => (Some(mandala(center, 10.0, petals, layers)), None),
            "flower_of_life" => (Some(flower_of_life(center, 1.0, layers)), None),
            "sri_yantra" => (Some(sri_yantra(center, 10.0)), None),
            "golden_spiral" => (Some(golden_spiral_pattern(center, turns)), None),
            "vesica_piscis" => (
                Some(vesica_piscis(Point::new(-1.0, 0.0), Point::new(1.0, 0.0), 2.0)),
                None,
            ),
            "platonic_solid" => {
                let default_solid = templates()["platonic_solid"]["solid_type"]
                    .as_str()
                    .unwrap_or("dodecahedron");
                let name = parsed.solid_type.as_deref().unwrap_or(default_solid);
                let vertices = platonic_vertices(name).ok_or_else(|| {
                    EngineError::invalid_input("solid_type", format!("unknown solid '{}'", name))
                })?;
                (
                    None,
                    Some(json!({
                        "solid": name,
                        "vertex_count": vertices.len(),
                        "vertices": vertices,
                    })),
                )
            }
            other => {
                return Err(EngineError::invalid_input(
                    "pattern_type",
                    format!("unknown pattern '{}'", other),
                ))
            }
        };

        let meaning = symbolism_for(&resolved_type);
        let sacred_ratios = pattern.as_ref().map(|p| json!(p.sacred_ratios));
        let meditation_points = pattern.as_ref().map(|p| json!(p.meditation_points));
        let element_count = pattern.as_ref().map(|p| p.elements.len());

        Ok(json!({
            "intention": parsed.intention,
            "pattern_type": resolved_type,
            "primary_pattern": pattern,
            "platonic_solid": solid,
            "sacred_ratios": sacred_ratios,
            "meditation_points": meditation_points,
            "element_count": element_count,
            "geometric_meaning": meaning,
            "meditation_guidance": format!(
                "Rest your gaze at the centre and let the intention '{}' settle into the form",
                parsed.intention
            ),
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = String::from("🔯 SACRED GEOMETRY TRANSMISSION 🔯\n\n");
        text.push_str(&format!(
            "✨ Pattern: {}\n🎯 Intention: {}\n\n{}\n",
            raw["pattern_type"].as_str().unwrap_or(""),
            raw["intention"].as_str().unwrap_or(""),
            raw["geometric_meaning"].as_str().unwrap_or(""),
        ));
        if let Some(count) = raw["element_count"].as_u64() {
            text.push_str(&format!("\n📐 {} geometric elements generated\n", count));
        }
        text.push_str(&format!("\n🧘 {}\n", raw["meditation_guidance"].as_str().unwrap_or("")));
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec![
            "Trace the pattern slowly with your eyes before meditating on it".to_string(),
            format!(
                "Return to the {} whenever the intention needs re-anchoring",
                raw["pattern_type"].as_str().unwrap_or("pattern")
            ),
        ]
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec![format!(
            "The {}",
            match raw["pattern_type"].as_str() {
                Some("mandala") => "Circle Keeper",
                Some("flower_of_life") => "Pattern Weaver",
                Some("sri_yantra") => "Union Seeker",
                Some("golden_spiral") => "Proportioned Grower",
                Some("vesica_piscis") => "Threshold Walker",
                _ => "Form Builder",
            }
        )]
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
    fn mandala_request_produces_elements() {
        let engine = SacredGeometryEngine::new();
        let raw = engine
            .calculate(&input(json!({
                "intention": "inner stillness",
                "pattern_type": "mandala",
                "petal_count": 8,
                "layer_count": 3
            })))
            .unwrap();
        assert_eq!(raw["pattern_type"], "mandala");
        assert!(raw["element_count"].as_u64().unwrap() > 0);
        assert!(raw["sacred_ratios"]["phi"].as_f64().unwrap() > 1.6);
    }

    #[test]
    fn personal_pattern_is_deterministic_by_birth_date() {
        let engine = SacredGeometryEngine::new();
        let payload = json!({
            "intention": "clarity",
            "birth_date": "1990-05-15"
        });
        let a = engine.calculate(&input(payload.clone())).unwrap();
        let b = engine.calculate(&input(payload)).unwrap();
        assert_eq!(a["pattern_type"], b["pattern_type"]);
    }

    #[test]
    fn platonic_solid_returns_vertices() {
        let engine = SacredGeometryEngine::new();
        let raw = engine
            .calculate(&input(json!({
                "intention": "grounding",
                "pattern_type": "platonic_solid",
                "solid_type": "icosahedron"
            })))
            .unwrap();
        assert_eq!(raw["platonic_solid"]["vertex_count"], 12);
        assert!(raw["primary_pattern"].is_null());
    }

    #[test]
    fn rejects_empty_intention() {
        let engine = SacredGeometryEngine::new();
        assert!(engine
            .calculate(&input(json!({ "intention": " " })))
            .is_err());
    }

    #[test]
    fn schema_rejects_out_of_range_petals() {
        let engine = SacredGeometryEngine::new();
        let mut payload = Map::new();
        payload.insert("intention".into(), json!("x"));
        payload.insert("petal_count".into(), json!(100));
        assert!(engine.input_schema().validate(&payload).is_err());
    }
}
