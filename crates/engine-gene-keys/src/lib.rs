//! Gene Keys Divination Engine
//!
//! Maps the personality and design activations onto the 64 Gene Keys and
//! assembles the Activation sequence (Life's Work, Evolution, Radiance,
//! Purpose) plus the Venus and Pearl sequences. Each key carries its
//! shadow / gift / siddhi frequency spectrum, loaded from
//! `data/gene_keys.json` and shape-asserted at first use.

use std::sync::{Arc, OnceLock};

use arcana_astro::{find_design_time, gate_for, julian_day, Body, Ephemeris, Role, Zodiac};
use arcana_core::{
    BirthData, DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const GENE_KEYS_JSON: &str = include_str!("../data/gene_keys.json");

// ---------------------------------------------------------------------------
// Spectrum data
// ---------------------------------------------------------------------------

/// One Gene Key's frequency spectrum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneKey {
    pub key: u8,
    pub shadow: String,
    pub gift: String,
    pub siddhi: String,
}

fn spectrum() -> &'static Vec<GeneKey> {
    static TABLE: OnceLock<Vec<GeneKey>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let keys: Vec<GeneKey> =
            serde_json::from_str(GENE_KEYS_JSON).expect("gene_keys.json is malformed");
        assert_eq!(keys.len(), 64, "spectrum must cover 64 keys");
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(k.key as usize, i + 1, "keys must be listed in order");
        }
        keys
    })
}

/// Spectrum for a key number (1-64).
pub fn gene_key(number: u8) -> &'static GeneKey {
    &spectrum()[(number as usize - 1).min(63)]
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct GeneKeysEngine {
    ephemeris: Arc<dyn Ephemeris>,
}

impl GeneKeysEngine {
    pub fn new(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self { ephemeris }
    }

    fn sphere(body: Body, role: Role, jd: f64, eph: &dyn Ephemeris) -> Result<Value, EngineError> {
        let position = eph.position(jd, body, Zodiac::Tropical)?;
        let activation = gate_for(position.longitude_deg, role, body);
        let key = gene_key(activation.number);
        Ok(json!({
            "gene_key": activation.number,
            "line": activation.line,
            "shadow": key.shadow,
            "gift": key.gift,
            "siddhi": key.siddhi,
        }))
    }
}

impl DivinationEngine for GeneKeysEngine {
    fn name(&self) -> &'static str {
        "gene_keys"
    }

    fn description(&self) -> &'static str {
        "Gene Keys hologenetic profile — activation, Venus and Pearl sequences with shadow/gift/siddhi pathworking"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("birth_date", FieldKind::Date, "Date of birth"),
            FieldSpec::required("birth_time", FieldKind::Time, "Exact local time of birth"),
            FieldSpec::required("birth_location", FieldKind::Array, "(latitude, longitude)"),
            FieldSpec::required("timezone", FieldKind::String, "IANA timezone identifier"),
            FieldSpec::optional("focus_sequence", FieldKind::String, "Sequence to emphasise")
                .one_of(&["activation", "venus", "pearl", "all"]),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("activation_sequence", FieldKind::Object, "The four prime gifts"),
            FieldSpec::required("venus_sequence", FieldKind::Object, "Relational spheres"),
            FieldSpec::required("pearl_sequence", FieldKind::Object, "Prosperity spheres"),
            FieldSpec::required("primary_gene_key", FieldKind::Integer, "Life's Work key"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        #[derive(Deserialize)]
        struct GeneKeysInput {
            #[serde(flatten)]
            birth: BirthData,
            #[serde(default)]
            focus_sequence: Option<String>,
        }

        let parsed: GeneKeysInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        parsed.birth.validate()?;
        parsed.birth.require_time()?;
        parsed.birth.require_location()?;

        let birth_utc = parsed.birth.to_utc()?;
        let birth_jd = julian_day(&birth_utc);
        let design = find_design_time(self.ephemeris.as_ref(), birth_jd)?;
        let eph = self.ephemeris.as_ref();

        // Activation sequence: the four prime gifts.
        let lifes_work = Self::sphere(Body::Sun, Role::Personality, birth_jd, eph)?;
        let evolution = Self::sphere(Body::Earth, Role::Personality, birth_jd, eph)?;
        let radiance = Self::sphere(Body::Sun, Role::Design, design.jd, eph)?;
        let purpose = Self::sphere(Body::Earth, Role::Design, design.jd, eph)?;

        // Venus sequence: the relational path.
        let attraction = Self::sphere(Body::Moon, Role::Design, design.jd, eph)?;
        let iq = Self::sphere(Body::Venus, Role::Personality, birth_jd, eph)?;
        let eq = Self::sphere(Body::Venus, Role::Design, design.jd, eph)?;
        let sq = Self::sphere(Body::Mars, Role::Design, design.jd, eph)?;

        // Pearl sequence: the prosperity path.
        let vocation = Self::sphere(Body::Mars, Role::Personality, birth_jd, eph)?;
        let culture = Self::sphere(Body::Jupiter, Role::Design, design.jd, eph)?;
        let pearl = Self::sphere(Body::Jupiter, Role::Personality, birth_jd, eph)?;

        let primary = lifes_work["gene_key"].clone();

        Ok(json!({
            "activation_sequence": {
                "lifes_work": lifes_work,
                "evolution": evolution,
                "radiance": radiance,
                "purpose": purpose,
            },
            "venus_sequence": {
                "attraction": attraction,
                "iq": iq,
                "eq": eq,
                "sq": sq,
            },
            "pearl_sequence": {
                "vocation": vocation,
                "culture": culture,
                "pearl": pearl,
            },
            "primary_gene_key": primary,
            "focus_sequence": parsed.focus_sequence.unwrap_or_else(|| "activation".into()),
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = String::from("🧬 GENE KEYS HOLOGENETIC PROFILE 🧬\n\n");
        let spheres = [
            ("🌟 Life's Work", &raw["activation_sequence"]["lifes_work"]),
            ("🌍 Evolution", &raw["activation_sequence"]["evolution"]),
            ("☀️ Radiance", &raw["activation_sequence"]["radiance"]),
            ("🧭 Purpose", &raw["activation_sequence"]["purpose"]),
        ];
        for (label, sphere) in spheres {
            text.push_str(&format!(
                "{}: Key {} — {} → {} → {}\n",
                label,
                sphere["gene_key"],
                sphere["shadow"].as_str().unwrap_or(""),
                sphere["gift"].as_str().unwrap_or(""),
                sphere["siddhi"].as_str().unwrap_or(""),
            ));
        }
        text.push_str(
            "\n🗝 Contemplate each shadow as the doorway to its gift; the siddhi is what remains when the contemplation dissolves.\n",
        );
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let lw = &raw["activation_sequence"]["lifes_work"];
        vec![
            format!(
                "Contemplate the shadow of {} as the entry to your {} gift",
                lw["shadow"].as_str().unwrap_or(""),
                lw["gift"].as_str().unwrap_or("")
            ),
            "Work one sphere at a time; the sequence unfolds in order".to_string(),
        ]
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        ["lifes_work", "evolution"]
            .iter()
            .filter_map(|s| raw["activation_sequence"][s]["gift"].as_str())
            .map(|g| format!("The Gift of {}", g))
            .collect()
    }
}
