//! Sigil Forge Divination Engine
//!
//! Transforms a written intention into a geometric sigil using the
//! classical letter-elimination method from arcana-geometry: unique
//! letters, alphabet positions, radial/spiral/grid placement, line or
//! curve connections, and invariant decoration circles.

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use arcana_geometry::{forge, ConnectionStyle, SigilLayout};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct SigilInput {
    intention: String,
    #[serde(default = "default_method")]
    generation_method: String,
    #[serde(default = "default_style")]
    connection_style: String,
}

fn default_method() -> String {
    "radial".into()
}

fn default_style() -> String {
    "line".into()
}

pub struct SigilForgeEngine;

impl SigilForgeEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SigilForgeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for SigilForgeEngine {
    fn name(&self) -> &'static str {
        "sigil_forge"
    }

    fn description(&self) -> &'static str {
        "Sigil synthesis — distills an intention into a chargeable geometric glyph"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("intention", FieldKind::String, "The intention to encode"),
            FieldSpec::optional("generation_method", FieldKind::String, "Letter layout")
                .one_of(&["traditional", "radial", "spiral", "grid"]),
            FieldSpec::optional("connection_style", FieldKind::String, "How points join")
                .one_of(&["line", "curve"]),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("unique_letters", FieldKind::Array, "Distilled letters"),
            FieldSpec::required("letter_numbers", FieldKind::Array, "Alphabet positions"),
            FieldSpec::required("elements", FieldKind::Array, "Drawable sigil elements"),
            FieldSpec::required("activation_guidance", FieldKind::String, "How to charge it"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed: SigilInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;

        // "traditional" is the classical radial circle placement.
        let layout = match parsed.generation_method.as_str() {
            "traditional" | "radial" => SigilLayout::Radial,
            "spiral" => SigilLayout::Spiral,
            "grid" => SigilLayout::Grid,
            other => {
                return Err(EngineError::invalid_input(
                    "generation_method",
                    format!("unknown method '{}'", other),
                ))
            }
        };
        let style = match parsed.connection_style.as_str() {
            "line" => ConnectionStyle::Line,
            "curve" => ConnectionStyle::Curve,
            other => {
                return Err(EngineError::invalid_input(
                    "connection_style",
                    format!("unknown style '{}'", other),
                ))
            }
        };

        let sigil = forge(&parsed.intention, layout, style, 10.0);
        if sigil.unique_letters.is_empty() {
            return Err(EngineError::invalid_input(
                "intention",
                "must contain at least one letter",
            ));
        }

        Ok(json!({
            "intention": parsed.intention,
            "generation_method": parsed.generation_method,
            "connection_style": parsed.connection_style,
            "unique_letters": sigil.unique_letters,
            "letter_numbers": sigil.letter_numbers,
            "points": sigil.points,
            "elements": sigil.elements,
            "element_count": sigil.elements.len(),
            "activation_guidance": "Gaze at the sigil while holding the intention, then release both and let the form do its work",
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let letters: Vec<String> = raw["unique_letters"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_str()).map(String::from).collect())
            .unwrap_or_default();
        let mut text = String::from("🜏 SIGIL FORGE SYNTHESIS 🜏\n\n");
        text.push_str(&format!(
            "🎯 Intention: {}\n🔤 Distilled letters: {}\n📐 {} elements in {} layout\n",
            raw["intention"].as_str().unwrap_or(""),
            letters.join(""),
            raw["element_count"],
            raw["generation_method"].as_str().unwrap_or(""),
        ));
        text.push_str(&format!("\n⚡ {}\n", raw["activation_guidance"].as_str().unwrap_or("")));
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, _raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec![
            "Draw the sigil by hand to embody it".to_string(),
            "Charge it once with full attention, then let it go".to_string(),
        ]
    }

    fn archetypal_themes(&self, _raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec!["The Symbol Maker".to_string()]
    }
}
