//! The Human Design engine implementation

use std::sync::Arc;

use arcana_astro::Ephemeris;
use arcana_core::{
    BirthData, DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde_json::{json, Value};

use crate::chart::compute_chart;
use crate::models::HdType;

pub struct HumanDesignEngine {
    ephemeris: Arc<dyn Ephemeris>,
}

impl HumanDesignEngine {
    pub fn new(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self { ephemeris }
    }

    fn parse_birth_data(input: &ValidatedInput) -> Result<BirthData, EngineError> {
        let birth: BirthData = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        birth.validate()?;
        birth.require_time()?;
        birth.require_location()?;
        Ok(birth)
    }
}

impl DivinationEngine for HumanDesignEngine {
    fn name(&self) -> &'static str {
        "human_design"
    }

    fn description(&self) -> &'static str {
        "Human Design bodygraph synthesis — type, strategy, authority, profile and incarnation cross from the 88° solar arc"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("birth_date", FieldKind::Date, "Date of birth"),
            FieldSpec::required("birth_time", FieldKind::Time, "Exact local time of birth"),
            FieldSpec::required("birth_location", FieldKind::Array, "(latitude, longitude)"),
            FieldSpec::required("timezone", FieldKind::String, "IANA timezone identifier"),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("personality_gates", FieldKind::Object, "Birth-side activations"),
            FieldSpec::required("design_gates", FieldKind::Object, "Design-side activations"),
            FieldSpec::required("type", FieldKind::String, "Energy type"),
            FieldSpec::required("strategy", FieldKind::String, "Type strategy"),
            FieldSpec::required("authority", FieldKind::String, "Inner authority"),
            FieldSpec::required("profile", FieldKind::String, "Personality/design line profile"),
            FieldSpec::required("incarnation_cross", FieldKind::String, "Four-gate cross"),
            FieldSpec::required("defined_centers", FieldKind::Array, "Defined centers"),
            FieldSpec::required("defined_channels", FieldKind::Array, "Defined channels"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let birth = Self::parse_birth_data(input)?;
        let birth_utc = birth.to_utc()?;
        let chart = compute_chart(self.ephemeris.as_ref(), birth_utc)?;

        let mut raw = serde_json::to_value(&chart)
            .map_err(|e| EngineError::internal("human_design", e.to_string()))?;
        // The serialized field is `hd_type`; the published key is `type`.
        if let Some(obj) = raw.as_object_mut() {
            if let Some(t) = obj.remove("hd_type") {
                obj.insert("type".into(), t);
            }
            obj.insert("birth_datetime_utc".into(), json!(birth_utc.to_rfc3339()));
        }
        Ok(raw)
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let hd_type = raw["type"].as_str().unwrap_or("Unknown");
        let strategy = raw["strategy"].as_str().unwrap_or("");
        let authority = raw["authority"].as_str().unwrap_or("");
        let profile = raw["profile"].as_str().unwrap_or("");
        let cross = raw["incarnation_cross"].as_str().unwrap_or("");

        let mut text = String::from("⚡ HUMAN DESIGN BODYGRAPH TRANSMISSION ⚡\n\n");
        text.push_str(&format!("🔮 Type: {}\n", hd_type));
        text.push_str(&format!("🧭 Strategy: {}\n", strategy));
        text.push_str(&format!("💎 Authority: {}\n", authority));
        text.push_str(&format!("🎭 Profile: {}\n", profile));
        text.push_str(&format!("✨ Incarnation Cross: {}\n", cross));

        if let Some(centers) = raw["defined_centers"].as_array() {
            if centers.is_empty() {
                text.push_str("\n🌙 All nine centers open: you sample and reflect the field around you.\n");
            } else {
                let names: Vec<&str> = centers.iter().filter_map(|c| c.as_str()).collect();
                text.push_str(&format!("\n🏛 Defined centers: {}\n", names.join(", ")));
            }
        }
        if let Some(sun) = raw["personality_gates"]["sun"].as_object() {
            text.push_str(&format!(
                "\n☀️ Personality Sun: Gate {} Line {}\n",
                sun["number"], sun["line"]
            ));
        }

        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = Vec::new();
        match raw["type"].as_str() {
            Some("Generator") => {
                recs.push("Wait for something to respond to before committing your energy".into())
            }
            Some("Manifestor") => {
                recs.push("Inform those in your orbit before you initiate".into())
            }
            Some("Projector") => {
                recs.push("Wait for recognition and invitation before offering guidance".into())
            }
            Some("Reflector") => {
                recs.push("Give major decisions a full lunar cycle before committing".into())
            }
            _ => {}
        }
        if let Some(authority) = raw["authority"].as_str() {
            recs.push(format!(
                "Decide through your {} authority rather than mental pressure",
                authority.to_lowercase()
            ));
        }
        recs
    }

    fn reality_patches(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec![
            format!(
                "Install: {} strategy as the default decision filter",
                raw["strategy"].as_str().unwrap_or("type")
            ),
            "Activate: bodygraph awareness during collaboration".to_string(),
        ]
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut themes = Vec::new();
        if let Some(t) = raw["type"].as_str() {
            themes.push(match t {
                t if t == HdType::Manifestor.as_str() => "The Initiator",
                t if t == HdType::Generator.as_str() => "The Life Force",
                t if t == HdType::Projector.as_str() => "The Guide",
                _ => "The Mirror",
            }.to_string());
        }
        if let Some(profile) = raw["profile"].as_str() {
            if let Some(names) = profile.split(' ').nth(1) {
                themes.extend(names.split('/').map(|n| format!("The {}", n)));
            }
        }
        themes
    }

    /// Confidence tracks the design-time search: a fallback design moment
    /// degrades the chart slightly.
    fn confidence(&self, raw: &Value, _input: &ValidatedInput) -> f64 {
        if raw["design_converged"].as_bool().unwrap_or(true) {
            1.0
        } else {
            0.8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_astro::NativeEphemeris;
    use arcana_core::RequestEnvelope;
    use serde_json::Map;

    fn engine() -> HumanDesignEngine {
        HumanDesignEngine::new(Arc::new(NativeEphemeris::new()))
    }

    fn bengaluru_input() -> ValidatedInput {
        let payload = json!({
            "birth_date": "1991-08-13",
            "birth_time": "13:31",
            "birth_location": [12.9716, 77.5946],
            "timezone": "Asia/Kolkata"
        });
        let map: Map<String, Value> = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        ValidatedInput::new(RequestEnvelope::default(), map)
    }

    #[test]
    fn bengaluru_reference_chart() {
        let raw = engine().calculate(&bengaluru_input()).unwrap();

        let p_sun = raw["personality_gates"]["sun"]["number"].as_u64().unwrap();
        let d_sun = raw["design_gates"]["sun"]["number"].as_u64().unwrap();
        assert!((1..=64).contains(&p_sun));
        assert!((1..=64).contains(&d_sun));

        // Profile pattern: <1-6>/<1-6> <word>/<word>
        let profile = raw["profile"].as_str().unwrap();
        let (lines, names) = profile.split_once(' ').unwrap();
        let (p, d) = lines.split_once('/').unwrap();
        assert!((1..=6).contains(&p.parse::<u8>().unwrap()));
        assert!((1..=6).contains(&d.parse::<u8>().unwrap()));
        assert_eq!(names.split('/').count(), 2);
    }

    #[test]
    fn requires_birth_time_and_location() {
        let engine = engine();
        let payload = json!({
            "birth_date": "1991-08-13",
            "timezone": "Asia/Kolkata"
        });
        let map = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let input = ValidatedInput::new(RequestEnvelope::default(), map);
        let err = engine.calculate(&input).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn interpret_carries_type_and_profile() {
        let engine = engine();
        let input = bengaluru_input();
        let raw = engine.calculate(&input).unwrap();
        let text = engine.interpret(&raw, &input);
        let text = text.as_text().unwrap();
        assert!(text.contains("Type:"));
        assert!(text.contains("Incarnation Cross:"));
    }

    #[test]
    fn deterministic_for_same_birth() {
        let engine = engine();
        let a = engine.calculate(&bengaluru_input()).unwrap();
        let b = engine.calculate(&bengaluru_input()).unwrap();
        assert_eq!(a, b);
    }
}
