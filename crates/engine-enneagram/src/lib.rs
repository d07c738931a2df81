//! Enneagram Divination Engine
//!
//! Type resonance analysis over the nine-type model: centers of
//! intelligence, wings, integration/disintegration arrows and growth
//! guidance. Type data is loaded from `data/types.json` and shape-asserted
//! at first use. Identification is either by explicit self-selection or by
//! scoring behavioural answers against type keywords.

use std::sync::OnceLock;

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const TYPES_JSON: &str = include_str!("../data/types.json");

// ---------------------------------------------------------------------------
// Type data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnneagramType {
    pub number: u8,
    pub name: String,
    /// Center of intelligence: body, heart or head.
    pub center: String,
    pub core_fear: String,
    pub core_desire: String,
    pub vice: String,
    pub virtue: String,
    /// Arrow toward growth.
    pub integration: u8,
    /// Arrow under stress.
    pub disintegration: u8,
    pub wings: [u8; 2],
    pub keywords: Vec<String>,
}

fn types() -> &'static Vec<EnneagramType> {
    static TABLE: OnceLock<Vec<EnneagramType>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let table: Vec<EnneagramType> =
            serde_json::from_str(TYPES_JSON).expect("types.json is malformed");
        assert_eq!(table.len(), 9, "nine types required");
        for (i, t) in table.iter().enumerate() {
            assert_eq!(t.number as usize, i + 1, "types must be listed in order");
            assert!((1..=9).contains(&t.integration));
            assert!((1..=9).contains(&t.disintegration));
            assert!(["body", "heart", "head"].contains(&t.center.as_str()));
        }
        table
    })
}

pub fn enneagram_type(number: u8) -> &'static EnneagramType {
    &types()[(number as usize - 1).min(8)]
}

/// Score free-text behavioural answers against each type's keyword bag.
/// Returns (best type, per-type match counts).
pub fn score_answers(answers: &[String]) -> (u8, Vec<(u8, usize)>) {
    let joined = answers.join(" ").to_lowercase();
    let mut scores: Vec<(u8, usize)> = types()
        .iter()
        .map(|t| {
            let hits = t
                .keywords
                .iter()
                .filter(|k| joined.contains(k.as_str()))
                .count();
            (t.number, hits)
        })
        .collect();
    scores.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    (scores[0].0, scores)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct EnneagramEngine;

impl EnneagramEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnneagramEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for EnneagramEngine {
    fn name(&self) -> &'static str {
        "enneagram"
    }

    fn description(&self) -> &'static str {
        "Enneagram resonance mapping — type, center, wings and growth arrows"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required(
                "identification_method",
                FieldKind::String,
                "How the type is determined",
            )
            .one_of(&["self_select", "assessment"]),
            FieldSpec::optional("selected_type", FieldKind::Integer, "Self-selected type")
                .range(1.0, 9.0),
            FieldSpec::optional(
                "behavioral_answers",
                FieldKind::Array,
                "Free-text answers for assessment scoring",
            ),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("primary_type", FieldKind::Object, "Resolved type profile"),
            FieldSpec::required("wing", FieldKind::Object, "Dominant wing"),
            FieldSpec::required("integration_arrow", FieldKind::Object, "Growth direction"),
            FieldSpec::required("disintegration_arrow", FieldKind::Object, "Stress direction"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        #[derive(Deserialize)]
        struct EnneagramInput {
            identification_method: String,
            #[serde(default)]
            selected_type: Option<u8>,
            #[serde(default)]
            behavioral_answers: Vec<String>,
        }

        let parsed: EnneagramInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;

        let (type_number, assessment_scores) = match parsed.identification_method.as_str() {
            "self_select" => {
                let n = parsed.selected_type.ok_or_else(|| {
                    EngineError::invalid_input(
                        "selected_type",
                        "required when identification_method is self_select",
                    )
                })?;
                if !(1..=9).contains(&n) {
                    return Err(EngineError::invalid_input("selected_type", "must be 1-9"));
                }
                (n, None)
            }
            "assessment" => {
                if parsed.behavioral_answers.is_empty() {
                    return Err(EngineError::invalid_input(
                        "behavioral_answers",
                        "required when identification_method is assessment",
                    ));
                }
                let (best, scores) = score_answers(&parsed.behavioral_answers);
                (best, Some(scores))
            }
            other => {
                return Err(EngineError::invalid_input(
                    "identification_method",
                    format!("'{}' is not a supported method", other),
                ))
            }
        };

        let primary = enneagram_type(type_number);
        // The wing listed first is treated as dominant.
        let wing = enneagram_type(primary.wings[0]);
        let integration = enneagram_type(primary.integration);
        let disintegration = enneagram_type(primary.disintegration);

        Ok(json!({
            "primary_type": primary,
            "center": primary.center,
            "wing": { "number": wing.number, "name": wing.name },
            "integration_arrow": {
                "number": integration.number,
                "name": integration.name,
                "direction": format!("{} → {}", primary.number, integration.number),
            },
            "disintegration_arrow": {
                "number": disintegration.number,
                "name": disintegration.name,
                "direction": format!("{} → {}", primary.number, disintegration.number),
            },
            "growth_path": format!(
                "Move from {} toward {} by practicing {}",
                primary.vice, primary.virtue, integration.name
            ),
            "assessment_scores": assessment_scores.map(|scores| {
                scores.into_iter().map(|(t, s)| json!({"type": t, "matches": s})).collect::<Vec<_>>()
            }),
            "identification_method": parsed.identification_method,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let primary = &raw["primary_type"];
        let mut text = String::from("⭕ ENNEAGRAM RESONANCE MAP ⭕\n\n");
        text.push_str(&format!(
            "🎯 Type {}: {} ({} center)\n",
            primary["number"],
            primary["name"].as_str().unwrap_or(""),
            raw["center"].as_str().unwrap_or(""),
        ));
        text.push_str(&format!(
            "💠 Core desire: {}\n🕳 Core fear: {}\n",
            primary["core_desire"].as_str().unwrap_or(""),
            primary["core_fear"].as_str().unwrap_or(""),
        ));
        text.push_str(&format!(
            "🪽 Wing: {}\n",
            raw["wing"]["name"].as_str().unwrap_or("")
        ));
        text.push_str(&format!(
            "📈 Growth: {}   📉 Stress: {}\n",
            raw["integration_arrow"]["direction"].as_str().unwrap_or(""),
            raw["disintegration_arrow"]["direction"].as_str().unwrap_or(""),
        ));
        text.push_str(&format!("\n🌱 {}\n", raw["growth_path"].as_str().unwrap_or("")));
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let primary = &raw["primary_type"];
        vec![
            format!(
                "Notice when {} drives your choices; its antidote is {}",
                primary["vice"].as_str().unwrap_or(""),
                primary["virtue"].as_str().unwrap_or("")
            ),
            format!(
                "Borrow the healthy qualities of {} when you feel secure",
                raw["integration_arrow"]["name"].as_str().unwrap_or("")
            ),
        ]
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        raw["primary_type"]["name"]
            .as_str()
            .map(|n| vec![n.to_string()])
            .unwrap_or_default()
    }

    /// Assessment-based identification is less certain than self-selection.
    fn confidence(&self, raw: &Value, _input: &ValidatedInput) -> f64 {
        match raw["identification_method"].as_str() {
            Some("assessment") => 0.7,
            _ => 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
