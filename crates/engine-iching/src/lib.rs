//! I-Ching Divination Engine
//!
//! Question-seeded hexagram casting. Six lines are cast bottom-to-top by
//! the three-coin or yarrow-stalk method (different old/young line odds),
//! the primary hexagram is resolved through the King Wen trigram table, and
//! any changing lines transform into the resulting hexagram. The 64
//! judgments are loaded from `data/hexagrams.json` and shape-asserted at
//! first use.

use std::sync::OnceLock;

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const HEXAGRAMS_JSON: &str = include_str!("../data/hexagrams.json");

// ---------------------------------------------------------------------------
// Hexagram data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hexagram {
    pub number: u8,
    pub name: String,
    pub judgment: String,
}

fn hexagrams() -> &'static Vec<Hexagram> {
    static TABLE: OnceLock<Vec<Hexagram>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let table: Vec<Hexagram> =
            serde_json::from_str(HEXAGRAMS_JSON).expect("hexagrams.json is malformed");
        assert_eq!(table.len(), 64, "64 hexagrams required");
        for (i, h) in table.iter().enumerate() {
            assert_eq!(h.number as usize, i + 1, "hexagrams must be in King Wen order");
        }
        table
    })
}

/// King Wen numbers indexed by [lower][upper] trigram.
///
/// Trigram order: Heaven, Thunder, Water, Mountain, Earth, Wind, Fire, Lake.
const KING_WEN: [[u8; 8]; 8] = [
    [1, 34, 5, 26, 11, 9, 14, 43],
    [25, 51, 3, 27, 24, 42, 21, 17],
    [6, 40, 29, 4, 7, 59, 64, 47],
    [33, 62, 39, 52, 15, 53, 56, 31],
    [12, 16, 8, 23, 2, 20, 35, 45],
    [44, 32, 48, 18, 46, 57, 50, 28],
    [13, 55, 63, 22, 36, 37, 30, 49],
    [10, 54, 60, 41, 19, 61, 38, 58],
];

/// Trigram index from three lines, bottom-to-top (`true` = yang).
fn trigram_index(lines: [bool; 3]) -> usize {
    match lines {
        [true, true, true] => 0,    // Heaven
        [true, false, false] => 1,  // Thunder
        [false, true, false] => 2,  // Water
        [false, false, true] => 3,  // Mountain
        [false, false, false] => 4, // Earth
        [false, true, true] => 5,   // Wind
        [true, false, true] => 6,   // Fire
        [true, true, false] => 7,   // Lake
    }
}

/// King Wen number for six lines, bottom-to-top.
pub fn hexagram_number(lines: [bool; 6]) -> u8 {
    let lower = trigram_index([lines[0], lines[1], lines[2]]);
    let upper = trigram_index([lines[3], lines[4], lines[5]]);
    KING_WEN[lower][upper]
}

pub fn hexagram(number: u8) -> &'static Hexagram {
    &hexagrams()[(number as usize - 1).min(63)]
}

// ---------------------------------------------------------------------------
// Casting
// ---------------------------------------------------------------------------

/// Casting method; the odds of old (changing) lines differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastMethod {
    Coins,
    Yarrow,
}

fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.as_bytes() {
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
}

/// Cast one line: 6 old yin, 7 young yang, 8 young yin, 9 old yang.
fn cast_line(rng: &mut SplitMix64, method: CastMethod) -> u8 {
    match method {
        // Three coins: 6 with 1/8, 7 with 3/8, 8 with 3/8, 9 with 1/8.
        CastMethod::Coins => {
            let coins = (0..3).map(|_| 2 + (rng.next() % 2) as u8).sum::<u8>();
            coins
        }
        // Yarrow stalks: 6 with 1/16, 7 with 5/16, 8 with 7/16, 9 with 3/16.
        CastMethod::Yarrow => match rng.next() % 16 {
            0 => 6,
            1..=5 => 7,
            6..=12 => 8,
            _ => 9,
        },
    }
}

/// A full cast: six line values, bottom-to-top.
pub fn cast(question: &str, method: CastMethod) -> [u8; 6] {
    let seed = fnv1a(&format!("{}|{:?}", question.trim().to_lowercase(), method));
    let mut rng = SplitMix64(seed);
    let mut lines = [0u8; 6];
    for line in &mut lines {
        *line = cast_line(&mut rng, method);
    }
    lines
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct IChingEngine;

impl IChingEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IChingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for IChingEngine {
    fn name(&self) -> &'static str {
        "iching"
    }

    fn description(&self) -> &'static str {
        "I-Ching mutation oracle — hexagram casting with changing lines and resulting transformation"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("question", FieldKind::String, "The question posed to the oracle"),
            FieldSpec::optional("method", FieldKind::String, "Casting method")
                .one_of(&["coins", "yarrow"]),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("primary_hexagram", FieldKind::Object, "The cast hexagram"),
            FieldSpec::required("changing_lines", FieldKind::Array, "Old lines, 1-6 from the bottom"),
            FieldSpec::required("resulting_hexagram", FieldKind::Object, "After transformation"),
            FieldSpec::required("lines", FieldKind::Array, "Raw line values"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        #[derive(Deserialize)]
        struct IChingInput {
            question: String,
            #[serde(default = "default_method")]
            method: CastMethod,
        }
        fn default_method() -> CastMethod {
            CastMethod::Coins
        }

        let parsed: IChingInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        if parsed.question.trim().is_empty() {
            return Err(EngineError::invalid_input("question", "must not be empty"));
        }

        let lines = cast(&parsed.question, parsed.method);

        let primary_lines: [bool; 6] = lines.map(|v| v == 7 || v == 9);
        let primary = hexagram(hexagram_number(primary_lines));

        let changing: Vec<u8> = lines
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 6 || v == 9)
            .map(|(i, _)| i as u8 + 1)
            .collect();

        let resulting = if changing.is_empty() {
            None
        } else {
            let resulting_lines: [bool; 6] = lines.map(|v| match v {
                6 => true,  // old yin becomes yang
                9 => false, // old yang becomes yin
                v => v == 7,
            });
            Some(hexagram(hexagram_number(resulting_lines)))
        };

        Ok(json!({
            "question": parsed.question,
            "method": parsed.method,
            "lines": lines,
            "primary_hexagram": primary,
            "changing_lines": changing,
            "resulting_hexagram": resulting,
            "mutation_active": resulting.is_some(),
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let primary = &raw["primary_hexagram"];
        let mut text = format!(
            "☯️ I-CHING MUTATION ORACLE ☯️\n\n❓ {}\n\n",
            raw["question"].as_str().unwrap_or("")
        );
        text.push_str(&format!(
            "䷀ Hexagram {}: {}\n   {}\n",
            primary["number"],
            primary["name"].as_str().unwrap_or(""),
            primary["judgment"].as_str().unwrap_or(""),
        ));

        if let Some(changing) = raw["changing_lines"].as_array() {
            if !changing.is_empty() {
                let positions: Vec<String> =
                    changing.iter().filter_map(|v| v.as_u64()).map(|v| v.to_string()).collect();
                text.push_str(&format!("\n⚡ Changing lines: {}\n", positions.join(", ")));
                let resulting = &raw["resulting_hexagram"];
                text.push_str(&format!(
                    "→ Becoming Hexagram {}: {}\n   {}\n",
                    resulting["number"],
                    resulting["name"].as_str().unwrap_or(""),
                    resulting["judgment"].as_str().unwrap_or(""),
                ));
            } else {
                text.push_str("\n🗿 No changing lines: the situation is stable as cast.\n");
            }
        }

        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = vec![format!(
            "Sit with the judgment of {} before acting",
            raw["primary_hexagram"]["name"].as_str().unwrap_or("the hexagram")
        )];
        if raw["mutation_active"].as_bool().unwrap_or(false) {
            recs.push("Changing lines mark where the situation is already in motion; act there first".into());
        }
        recs
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut themes = Vec::new();
        if let Some(name) = raw["primary_hexagram"]["name"].as_str() {
            themes.push(name.to_string());
        }
        if let Some(name) = raw["resulting_hexagram"]["name"].as_str() {
            themes.push(name.to_string());
        }
        themes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
