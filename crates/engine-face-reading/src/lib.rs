//! Face Reading Divination Engine
//!
//! Traditional physiognomy analysis: the twelve houses (gong) of the face
//! and the five-element constitution. This engine processes biometric data
//! and refuses to run without explicit `data_processing_consent`.
//!
//! Image decoding libraries are external collaborators; this engine runs in
//! simulation mode, deriving features deterministically from a hash of the
//! submitted image bytes (or birth date when no image is given). The
//! contract -- feature shape, ranges, and the no-raw-bytes rule -- holds in
//! both modes: only the hash and derived features ever reach `raw_data`,
//! never the image itself.

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

/// The twelve houses of traditional face reading.
pub const TWELVE_HOUSES: [(&str, &str); 12] = [
    ("ming_gong", "Life Palace — overall vitality and destiny"),
    ("cai_bo_gong", "Wealth Palace — material resources"),
    ("xiong_di_gong", "Siblings Palace — peer relationships"),
    ("tian_zhai_gong", "Property Palace — home and security"),
    ("nan_nv_gong", "Children Palace — creativity and legacy"),
    ("nu_pu_gong", "Servants Palace — support networks"),
    ("qi_qie_gong", "Marriage Palace — partnership"),
    ("ji_e_gong", "Health Palace — constitutional resilience"),
    ("qian_yi_gong", "Travel Palace — movement and change"),
    ("guan_lu_gong", "Career Palace — vocation and standing"),
    ("fu_de_gong", "Fortune Palace — inner happiness"),
    ("fu_mu_gong", "Parents Palace — ancestry and inheritance"),
];

/// The five elements of the constitution analysis.
pub const FIVE_ELEMENTS: [&str; 5] = ["wood", "fire", "earth", "metal", "water"];

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

    /// Uniform value in [0, 1).
    fn unit(&mut self) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[derive(Debug, Deserialize)]
struct FaceReadingInput {
    #[serde(default)]
    image_data: Option<String>,
    #[serde(default)]
    birth_date: Option<NaiveDate>,
    #[serde(default = "default_depth")]
    analysis_depth: String,
    #[serde(default)]
    include_health_indicators: bool,
}

fn default_depth() -> String {
    "detailed".into()
}

pub struct FaceReadingEngine;

impl FaceReadingEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FaceReadingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for FaceReadingEngine {
    fn name(&self) -> &'static str {
        "face_reading"
    }

    fn description(&self) -> &'static str {
        "Traditional physiognomy — twelve houses and five-element constitution from facial features"
    }

    fn requires_consent(&self) -> bool {
        true
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::optional("image_data", FieldKind::String, "Base64 facial image"),
            FieldSpec::optional("birth_date", FieldKind::Date, "Birth date for elemental correlation"),
            FieldSpec::optional("analysis_depth", FieldKind::String, "Level of detail")
                .one_of(&["basic", "detailed", "comprehensive"]),
            FieldSpec::optional(
                "include_health_indicators",
                FieldKind::Boolean,
                "Include constitutional health notes",
            ),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("twelve_houses", FieldKind::Object, "House-by-house readings"),
            FieldSpec::required("five_elements", FieldKind::Object, "Elemental constitution"),
            FieldSpec::required("dominant_element", FieldKind::String, "Leading element"),
            FieldSpec::required("image_hash", FieldKind::String, "Hash of the analysed image"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed: FaceReadingInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;

        if parsed.image_data.is_none() && parsed.birth_date.is_none() {
            return Err(EngineError::invalid_input(
                "image_data",
                "either image_data or birth_date is required",
            ));
        }

        // The image bytes are consumed here and never stored; only the hash
        // survives into the output.
        let seed_material = parsed
            .image_data
            .as_deref()
            .map(|d| d.as_bytes().to_vec())
            .unwrap_or_else(|| parsed.birth_date.unwrap().to_string().into_bytes());
        let image_hash = format!("{:016x}", fnv1a(&seed_material));
        let mut rng = SplitMix64(fnv1a(&seed_material));

        let mut houses = serde_json::Map::new();
        for (key, description) in TWELVE_HOUSES {
            let strength = (rng.unit() * 100.0).round() / 100.0;
            houses.insert(
                key.to_string(),
                json!({
                    "description": description,
                    "strength": strength,
                    "quality": if strength > 0.66 { "strong" } else if strength > 0.33 { "balanced" } else { "developing" },
                }),
            );
        }

        let mut elements = serde_json::Map::new();
        let mut dominant = ("wood", 0.0);
        for element in FIVE_ELEMENTS {
            let score = (rng.unit() * 100.0).round() / 100.0;
            if score > dominant.1 {
                dominant = (element, score);
            }
            elements.insert(element.to_string(), json!(score));
        }

        let health = parsed.include_health_indicators.then(|| {
            json!({
                "constitutional_note": format!(
                    "A {}-dominant constitution favours routines that balance its excess",
                    dominant.0
                ),
                "advisory": "Physiognomic indicators are reflective, not diagnostic",
            })
        });

        Ok(json!({
            "analysis_depth": parsed.analysis_depth,
            "analysis_mode": "simulation",
            "image_hash": image_hash,
            "twelve_houses": houses,
            "five_elements": elements,
            "dominant_element": dominant.0,
            "health_indicators": health,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = String::from("👁 FACE READING CONSTITUTION MAP 👁\n\n");
        text.push_str(&format!(
            "🌳 Dominant element: {}\n\n",
            raw["dominant_element"].as_str().unwrap_or("")
        ));
        if let Some(houses) = raw["twelve_houses"].as_object() {
            let strong: Vec<&str> = houses
                .iter()
                .filter(|(_, h)| h["quality"] == "strong")
                .filter_map(|(_, h)| h["description"].as_str())
                .collect();
            if !strong.is_empty() {
                text.push_str("💪 Strong houses:\n");
                for house in strong {
                    text.push_str(&format!("   • {}\n", house));
                }
            }
        }
        text.push_str("\n🙏 Readings reflect patterns, not fixed fate.\n");
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        vec![format!(
            "Balance your {}-dominant constitution with its complementary element practices",
            raw["dominant_element"].as_str().unwrap_or("")
        )]
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        raw["dominant_element"]
            .as_str()
            .map(|e| {
                vec![match e {
                    "wood" => "The Grower".to_string(),
                    "fire" => "The Radiator".to_string(),
                    "earth" => "The Stabilizer".to_string(),
                    "metal" => "The Refiner".to_string(),
                    _ => "The Flow Finder".to_string(),
                }]
            })
            .unwrap_or_default()
    }

    /// Simulation mode carries less certainty than landmark-based analysis.
    fn confidence(&self, _raw: &Value, _input: &ValidatedInput) -> f64 {
        0.6
    }
}
