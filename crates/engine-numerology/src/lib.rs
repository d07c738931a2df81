//! Numerology Divination Engine
//!
//! Implements Pythagorean and Chaldean numerology systems: core numbers
//! (Life Path, Expression, Soul Urge, Personality), maturity, personal
//! year/month/day cycles, bridges, master numbers and karmic debt.
//! Pure math -- no external dependencies beyond arcana-core.

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Letter-to-number tables
// ---------------------------------------------------------------------------

/// Pythagorean mapping: A=1 .. I=9, J=1 .. R=9, S=1 .. Z=8.
pub fn pythagorean_value(ch: char) -> Option<u32> {
    match ch.to_ascii_uppercase() {
        'A' | 'J' | 'S' => Some(1),
        'B' | 'K' | 'T' => Some(2),
        'C' | 'L' | 'U' => Some(3),
        'D' | 'M' | 'V' => Some(4),
        'E' | 'N' | 'W' => Some(5),
        'F' | 'O' | 'X' => Some(6),
        'G' | 'P' | 'Y' => Some(7),
        'H' | 'Q' | 'Z' => Some(8),
        'I' | 'R' => Some(9),
        _ => None,
    }
}

/// Chaldean mapping. 9 is reserved and never assigned to a letter.
pub fn chaldean_value(ch: char) -> Option<u32> {
    match ch.to_ascii_uppercase() {
        'A' | 'I' | 'J' | 'Q' | 'Y' => Some(1),
        'B' | 'K' | 'R' => Some(2),
        'C' | 'G' | 'L' | 'S' => Some(3),
        'D' | 'M' | 'T' => Some(4),
        'E' | 'H' | 'N' | 'X' => Some(5),
        'U' | 'V' | 'W' => Some(6),
        'O' | 'Z' => Some(7),
        'F' | 'P' => Some(8),
        _ => None,
    }
}

/// Numerology system selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumerologySystem {
    Pythagorean,
    Chaldean,
}

impl Default for NumerologySystem {
    fn default() -> Self {
        NumerologySystem::Pythagorean
    }
}

impl NumerologySystem {
    fn letter_value(&self, ch: char) -> Option<u32> {
        match self {
            NumerologySystem::Pythagorean => pythagorean_value(ch),
            NumerologySystem::Chaldean => chaldean_value(ch),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            NumerologySystem::Pythagorean => "pythagorean",
            NumerologySystem::Chaldean => "chaldean",
        }
    }
}

// ---------------------------------------------------------------------------
// Name parsing
// ---------------------------------------------------------------------------

/// Y counts as a consonant; the letter tables above settle its value.
fn is_vowel(ch: char) -> bool {
    matches!(ch.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U')
}

pub fn extract_letters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase()
}

pub fn extract_vowels(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() && is_vowel(*c))
        .collect::<String>()
        .to_uppercase()
}

pub fn extract_consonants(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() && !is_vowel(*c))
        .collect::<String>()
        .to_uppercase()
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Master numbers that halt reduction when preservation is on.
pub const MASTER_NUMBERS: [u32; 4] = [11, 22, 33, 44];

/// Karmic debt numbers, flagged when they appear as intermediate sums.
pub const KARMIC_DEBT_NUMBERS: [u32; 4] = [13, 14, 16, 19];

pub fn is_master(n: u32) -> bool {
    MASTER_NUMBERS.contains(&n)
}

fn digit_sum(n: u32) -> u32 {
    let mut total = 0;
    let mut v = n;
    while v > 0 {
        total += v % 10;
        v /= 10;
    }
    total
}

/// Outcome of a digital-root reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reduction {
    pub value: u32,
    /// Every sum produced, starting with the input.
    pub chain: Vec<u32>,
    /// Karmic debt numbers encountered anywhere in the chain.
    pub karmic_debts: Vec<u32>,
}

/// Repeatedly sum digits until one digit remains. With `preserve_master`,
/// reduction halts early on 11, 22, 33 or 44.
pub fn reduce(n: u32, preserve_master: bool) -> Reduction {
    let mut chain = vec![n];
    let mut current = n;
    while current > 9 && !(preserve_master && is_master(current)) {
        current = digit_sum(current);
        chain.push(current);
    }
    let karmic_debts = chain
        .iter()
        .copied()
        .filter(|v| KARMIC_DEBT_NUMBERS.contains(v))
        .collect();
    Reduction { value: current, chain, karmic_debts }
}

// ---------------------------------------------------------------------------
// Core calculations
// ---------------------------------------------------------------------------

pub struct NumerologyCalculator {
    system: NumerologySystem,
}

impl NumerologyCalculator {
    pub fn new(system: NumerologySystem) -> Self {
        Self { system }
    }

    fn sum_text(&self, text: &str) -> u32 {
        text.chars().filter_map(|c| self.system.letter_value(c)).sum()
    }

    /// Life Path: digits of MMDDYYYY summed and reduced with master
    /// preservation.
    pub fn life_path(&self, birth_date: NaiveDate) -> Reduction {
        let digits = format!(
            "{:02}{:02}{:04}",
            birth_date.month(),
            birth_date.day(),
            birth_date.year()
        );
        let total: u32 = digits.chars().filter_map(|c| c.to_digit(10)).sum();
        reduce(total, true)
    }

    /// Expression (Destiny): all letters of the full birth name.
    pub fn expression(&self, full_name: &str) -> Reduction {
        reduce(self.sum_text(&extract_letters(full_name)), true)
    }

    /// Soul Urge (Heart's Desire): vowels only.
    pub fn soul_urge(&self, full_name: &str) -> Reduction {
        reduce(self.sum_text(&extract_vowels(full_name)), true)
    }

    /// Personality: consonants only.
    pub fn personality(&self, full_name: &str) -> Reduction {
        reduce(self.sum_text(&extract_consonants(full_name)), true)
    }

    /// Maturity: Life Path + Expression, reduced with master preservation.
    pub fn maturity(&self, life_path: u32, expression: u32) -> Reduction {
        reduce(life_path + expression, true)
    }

    /// Personal Year: digits of MMDD + target year, reduced WITHOUT master
    /// preservation.
    pub fn personal_year(&self, birth_date: NaiveDate, target_year: i32) -> Reduction {
        let digits = format!(
            "{:02}{:02}{}",
            birth_date.month(),
            birth_date.day(),
            target_year
        );
        let total: u32 = digits.chars().filter_map(|c| c.to_digit(10)).sum();
        reduce(total, false)
    }

    /// Personal Month: personal year + month, no master preservation.
    pub fn personal_month(&self, birth_date: NaiveDate, target_year: i32, month: u32) -> Reduction {
        let year = self.personal_year(birth_date, target_year).value;
        reduce(year + month, false)
    }

    /// Personal Day: personal month + day, no master preservation.
    pub fn personal_day(&self, birth_date: NaiveDate, target_date: NaiveDate) -> Reduction {
        let month = self
            .personal_month(birth_date, target_date.year(), target_date.month())
            .value;
        reduce(month + target_date.day(), false)
    }

    /// Bridge numbers: absolute differences between designated pairs.
    pub fn bridges(
        &self,
        life_path: u32,
        expression: u32,
        soul_urge: u32,
        personality: u32,
    ) -> (u32, u32) {
        (
            life_path.abs_diff(expression),
            soul_urge.abs_diff(personality),
        )
    }
}

// ---------------------------------------------------------------------------
// Meaning lookup
// ---------------------------------------------------------------------------

fn meaning_for(n: u32) -> &'static str {
    match n {
        1 => "Leadership, independence, pioneering",
        2 => "Partnership, diplomacy, sensitivity",
        3 => "Creativity, expression, joy",
        4 => "Structure, discipline, foundation",
        5 => "Freedom, change, adventure",
        6 => "Responsibility, nurturing, harmony",
        7 => "Analysis, wisdom, introspection",
        8 => "Power, abundance, achievement",
        9 => "Compassion, completion, universal love",
        11 => "Intuition, spiritual insight, illumination (master)",
        22 => "Master builder, practical visionary (master)",
        33 => "Master teacher, selfless service (master)",
        44 => "Master healer, disciplined power (master)",
        _ => "Compound vibration",
    }
}

// ---------------------------------------------------------------------------
// Typed input
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NumerologyInput {
    full_name: String,
    birth_date: NaiveDate,
    #[serde(default)]
    system: NumerologySystem,
    #[serde(default)]
    current_year: Option<i32>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct NumerologyEngine;

impl NumerologyEngine {
    pub fn new() -> Self {
        Self
    }

    fn parse_input(input: &ValidatedInput) -> Result<NumerologyInput, EngineError> {
        let parsed: NumerologyInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        if extract_letters(&parsed.full_name).is_empty() {
            return Err(EngineError::invalid_input(
                "full_name",
                "must contain at least one letter",
            ));
        }
        Ok(parsed)
    }
}

impl Default for NumerologyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for NumerologyEngine {
    fn name(&self) -> &'static str {
        "numerology"
    }

    fn description(&self) -> &'static str {
        "Soul-number matrix extraction and vibrational signature analysis through sacred numerology"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("full_name", FieldKind::String, "Complete birth name"),
            FieldSpec::required("birth_date", FieldKind::Date, "Date of birth"),
            FieldSpec::optional("system", FieldKind::String, "Numerology system")
                .one_of(&["pythagorean", "chaldean"]),
            FieldSpec::optional("current_year", FieldKind::Integer, "Year for personal cycles")
                .range(1800.0, 2400.0),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("life_path", FieldKind::Integer, "Life Path number"),
            FieldSpec::required("expression", FieldKind::Integer, "Expression number"),
            FieldSpec::required("soul_urge", FieldKind::Integer, "Soul Urge number"),
            FieldSpec::required("personality", FieldKind::Integer, "Personality number"),
            FieldSpec::required("maturity", FieldKind::Integer, "Maturity number"),
            FieldSpec::required("personal_year", FieldKind::Integer, "Personal Year number"),
            FieldSpec::required("bridges", FieldKind::Object, "Bridge numbers"),
            FieldSpec::required("master_numbers", FieldKind::Array, "Master numbers present"),
            FieldSpec::required("karmic_debt", FieldKind::Array, "Karmic debt numbers present"),
            FieldSpec::required("name_analysis", FieldKind::Object, "Name decomposition"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed = Self::parse_input(input)?;
        let calc = NumerologyCalculator::new(parsed.system);

        let current_year = parsed
            .current_year
            .unwrap_or_else(|| input.envelope.timestamp.date_naive().year());

        let life_path = calc.life_path(parsed.birth_date);
        let expression = calc.expression(&parsed.full_name);
        let soul_urge = calc.soul_urge(&parsed.full_name);
        let personality = calc.personality(&parsed.full_name);
        let maturity = calc.maturity(life_path.value, expression.value);
        let personal_year = calc.personal_year(parsed.birth_date, current_year);
        let today = input.envelope.timestamp.date_naive();
        let personal_month = calc.personal_month(parsed.birth_date, today.year(), today.month());
        let personal_day = calc.personal_day(parsed.birth_date, today);

        let (life_expression_bridge, soul_personality_bridge) = calc.bridges(
            life_path.value,
            expression.value,
            soul_urge.value,
            personality.value,
        );

        let core = [
            ("life_path", &life_path),
            ("expression", &expression),
            ("soul_urge", &soul_urge),
            ("personality", &personality),
            ("maturity", &maturity),
        ];

        let mut master_numbers: Vec<u32> = core
            .iter()
            .map(|(_, r)| r.value)
            .filter(|v| is_master(*v))
            .collect();
        master_numbers.sort_unstable();
        master_numbers.dedup();

        let mut karmic_debt: Vec<u32> = core
            .iter()
            .flat_map(|(_, r)| r.karmic_debts.iter().copied())
            .chain(personal_year.karmic_debts.iter().copied())
            .collect();
        karmic_debt.sort_unstable();
        karmic_debt.dedup();

        let letters = extract_letters(&parsed.full_name);

        Ok(json!({
            "system": parsed.system.as_str(),
            "life_path": life_path.value,
            "expression": expression.value,
            "soul_urge": soul_urge.value,
            "personality": personality.value,
            "maturity": maturity.value,
            "personal_year": personal_year.value,
            "personal_month": personal_month.value,
            "personal_day": personal_day.value,
            "bridges": {
                "life_expression_bridge": life_expression_bridge,
                "soul_personality_bridge": soul_personality_bridge,
            },
            "master_numbers": master_numbers,
            "karmic_debt": karmic_debt,
            "reduction_chains": {
                "life_path": life_path.chain,
                "expression": expression.chain,
                "soul_urge": soul_urge.chain,
                "personality": personality.chain,
                "maturity": maturity.chain,
            },
            "name_analysis": {
                "full_name": parsed.full_name,
                "letters_only": letters,
                "vowels": extract_vowels(&parsed.full_name),
                "consonants": extract_consonants(&parsed.full_name),
                "total_letters": letters.chars().count(),
            },
            "birth_date": parsed.birth_date.to_string(),
            "calculation_year": current_year,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let name = raw["name_analysis"]["full_name"]
            .as_str()
            .unwrap_or("")
            .to_uppercase();
        let life_path = raw["life_path"].as_u64().unwrap_or(0) as u32;
        let expression = raw["expression"].as_u64().unwrap_or(0) as u32;
        let soul_urge = raw["soul_urge"].as_u64().unwrap_or(0) as u32;
        let personality = raw["personality"].as_u64().unwrap_or(0) as u32;
        let personal_year = raw["personal_year"].as_u64().unwrap_or(0);

        let mut text = format!("🔢 NUMEROLOGY FIELD EXTRACTION - {} 🔢\n\n", name);
        text.push_str(&format!("⚡ Life Path {}: {}\n", life_path, meaning_for(life_path)));
        text.push_str(&format!("🌟 Expression {}: {}\n", expression, meaning_for(expression)));
        text.push_str(&format!("💖 Soul Urge {}: {}\n", soul_urge, meaning_for(soul_urge)));
        text.push_str(&format!("🎭 Personality {}: {}\n", personality, meaning_for(personality)));
        text.push_str(&format!("\n📅 Personal Year {}\n", personal_year));

        if let Some(masters) = raw["master_numbers"].as_array() {
            if !masters.is_empty() {
                let list: Vec<String> = masters
                    .iter()
                    .filter_map(|v| v.as_u64())
                    .map(|v| v.to_string())
                    .collect();
                text.push_str(&format!("\n✨ Master numbers active: {}\n", list.join(", ")));
            }
        }
        if let Some(debts) = raw["karmic_debt"].as_array() {
            if !debts.is_empty() {
                let list: Vec<String> = debts
                    .iter()
                    .filter_map(|v| v.as_u64())
                    .map(|v| v.to_string())
                    .collect();
                text.push_str(&format!("🌀 Karmic debt patterns: {}\n", list.join(", ")));
            }
        }

        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = Vec::new();
        let life_path = raw["life_path"].as_u64().unwrap_or(0) as u32;
        recs.push(format!(
            "Align daily choices with your Life Path {} vibration: {}",
            life_path,
            meaning_for(life_path)
        ));
        if let Some(py) = raw["personal_year"].as_u64() {
            recs.push(format!(
                "Personal Year {}: treat this year as a cycle of {}",
                py,
                meaning_for(py as u32).to_lowercase()
            ));
        }
        if raw["karmic_debt"].as_array().map(|a| !a.is_empty()).unwrap_or(false) {
            recs.push(
                "Karmic debt numbers present: old patterns are asking for conscious completion"
                    .into(),
            );
        }
        recs
    }

    fn reality_patches(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut patches = vec!["Install: daily numerological awareness practice".to_string()];
        if raw["master_numbers"].as_array().map(|a| !a.is_empty()).unwrap_or(false) {
            patches.push("Activate: master number frequency alignment".into());
        }
        patches
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut themes = Vec::new();
        for key in ["life_path", "expression"] {
            if let Some(n) = raw[key].as_u64() {
                themes.push(
                    match n {
                        1 => "The Pioneer",
                        2 => "The Diplomat",
                        3 => "The Creator",
                        4 => "The Builder",
                        5 => "The Explorer",
                        6 => "The Nurturer",
                        7 => "The Seeker",
                        8 => "The Achiever",
                        9 => "The Humanitarian",
                        11 => "The Illuminator",
                        22 => "The Master Builder",
                        33 => "The Master Teacher",
                        44 => "The Master Healer",
                        _ => "The Mystic",
                    }
                    .to_string(),
                );
            }
        }
        themes.dedup();
        themes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::RequestEnvelope;
    use serde_json::Map;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(payload: Value) -> ValidatedInput {
        let map: Map<String, Value> = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        ValidatedInput::new(RequestEnvelope::default(), map)
    }

    #[test]
    fn pythagorean_table_spot_checks() {
        assert_eq!(pythagorean_value('A'), Some(1));
        assert_eq!(pythagorean_value('I'), Some(9));
        assert_eq!(pythagorean_value('J'), Some(1));
        assert_eq!(pythagorean_value('S'), Some(1));
        assert_eq!(pythagorean_value('Y'), Some(7));
        assert_eq!(pythagorean_value('Z'), Some(8));
        assert_eq!(pythagorean_value('3'), None);
    }

    #[test]
    fn chaldean_table_spot_checks() {
        assert_eq!(chaldean_value('F'), Some(8));
        assert_eq!(chaldean_value('O'), Some(7));
        assert_eq!(chaldean_value('Y'), Some(1));
        assert_eq!(chaldean_value('Z'), Some(7));
        // 9 is never assigned in the Chaldean system.
        for ch in 'A'..='Z' {
            assert_ne!(chaldean_value(ch), Some(9), "{} maps to 9", ch);
        }
    }

    #[test]
    fn reduction_preserves_all_four_masters() {
        for master in MASTER_NUMBERS {
            let r = reduce(master, true);
            assert_eq!(r.value, master);
            assert_eq!(r.chain, vec![master]);
        }
        // 29 -> 11 stops at the master.
        assert_eq!(reduce(29, true).value, 11);
        // Without preservation it reduces through: 29 -> 11 -> 2.
        assert_eq!(reduce(29, false).value, 2);
    }

    #[test]
    fn reduction_flags_karmic_debt_intermediates() {
        let r = reduce(16, true);
        assert_eq!(r.value, 7);
        assert_eq!(r.karmic_debts, vec![16]);

        // 49 -> 13 -> 4 passes through karmic 13.
        let r = reduce(49, true);
        assert_eq!(r.value, 4);
        assert_eq!(r.karmic_debts, vec![13]);

        assert!(reduce(30, true).karmic_debts.is_empty());
    }

    #[test]
    fn life_path_sums_mmddyyyy_digits() {
        let calc = NumerologyCalculator::new(NumerologySystem::Pythagorean);
        // 05 15 1990: 0+5+1+5+1+9+9+0 = 30 -> 3
        let lp = calc.life_path(date(1990, 5, 15));
        assert_eq!(lp.value, 3);
        assert_eq!(lp.chain, vec![30, 3]);
    }

    #[test]
    fn john_smith_core_numbers() {
        let calc = NumerologyCalculator::new(NumerologySystem::Pythagorean);
        // JOHNSMITH: 1+6+8+5 + 1+4+9+2+8 = 44, a master number.
        assert_eq!(calc.expression("John Smith").value, 44);
        // Vowels O+I = 6+9 = 15 -> 6.
        assert_eq!(calc.soul_urge("John Smith").value, 6);
        // Consonants J+H+N+S+M+T+H = 29 -> 11, preserved as a master.
        assert_eq!(calc.personality("John Smith").value, 11);
    }

    #[test]
    fn personal_year_does_not_preserve_masters() {
        let calc = NumerologyCalculator::new(NumerologySystem::Pythagorean);
        // 0515 + 2024: 0+5+1+5+2+0+2+4 = 19 -> 10 -> 1
        let py = calc.personal_year(date(1990, 5, 15), 2024);
        assert_eq!(py.value, 1);
        assert_eq!(py.karmic_debts, vec![19]);
    }

    #[test]
    fn maturity_is_reduced_sum_of_life_path_and_expression() {
        let calc = NumerologyCalculator::new(NumerologySystem::Pythagorean);
        // 3 + 44 = 47 -> 11 (master preserved)
        assert_eq!(calc.maturity(3, 44).value, 11);
        assert_eq!(calc.maturity(3, 2).value, 5);
    }

    #[test]
    fn bridges_are_absolute_differences() {
        let calc = NumerologyCalculator::new(NumerologySystem::Pythagorean);
        assert_eq!(calc.bridges(3, 44, 6, 11), (41, 5));
        assert_eq!(calc.bridges(7, 3, 2, 9), (4, 7));
    }

    #[test]
    fn engine_calculate_produces_contract_keys() {
        let engine = NumerologyEngine::new();
        let raw = engine
            .calculate(&input(json!({
                "full_name": "John Smith",
                "birth_date": "1990-05-15",
                "system": "pythagorean",
                "current_year": 2024
            })))
            .unwrap();

        assert_eq!(raw["life_path"], 3);
        assert_eq!(raw["expression"], 44);
        assert_eq!(raw["soul_urge"], 6);
        assert_eq!(raw["personality"], 11);
        assert_eq!(raw["maturity"], 11);
        assert_eq!(raw["personal_year"], 1);
        assert_eq!(raw["bridges"]["life_expression_bridge"], 41);
        assert_eq!(raw["bridges"]["soul_personality_bridge"], 5);
        assert_eq!(raw["master_numbers"], json!([11, 44]));
        assert_eq!(raw["karmic_debt"], json!([19]));
        assert_eq!(raw["name_analysis"]["vowels"], "OI");
        assert_eq!(raw["name_analysis"]["total_letters"], 9);
    }

    #[test]
    fn chaldean_system_differs_from_pythagorean() {
        let engine = NumerologyEngine::new();
        let base = json!({ "full_name": "John Smith", "birth_date": "1990-05-15" });
        let mut chal = base.clone();
        chal["system"] = json!("chaldean");

        let p = engine.calculate(&input(base)).unwrap();
        let c = engine.calculate(&input(chal)).unwrap();
        assert_ne!(p["expression"], c["expression"]);
        // Life Path comes from the date alone and is system-independent.
        assert_eq!(p["life_path"], c["life_path"]);
    }

    #[test]
    fn rejects_letterless_name() {
        let engine = NumerologyEngine::new();
        let err = engine
            .calculate(&input(json!({ "full_name": "123", "birth_date": "1990-05-15" })))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn interpret_mentions_core_numbers() {
        let engine = NumerologyEngine::new();
        let inp = input(json!({
            "full_name": "John Smith",
            "birth_date": "1990-05-15"
        }));
        let raw = engine.calculate(&inp).unwrap();
        let text = engine.interpret(&raw, &inp);
        let text = text.as_text().unwrap();
        assert!(text.contains("JOHN SMITH"));
        assert!(text.contains("Life Path 3"));
    }

    #[test]
    fn helpers_return_content() {
        let engine = NumerologyEngine::new();
        let inp = input(json!({
            "full_name": "John Smith",
            "birth_date": "1990-05-15"
        }));
        let raw = engine.calculate(&inp).unwrap();
        assert!(!engine.recommendations(&raw, &inp).is_empty());
        assert!(!engine.reality_patches(&raw, &inp).is_empty());
        assert!(!engine.archetypal_themes(&raw, &inp).is_empty());
        assert_eq!(engine.confidence(&raw, &inp), 1.0);
    }

    #[test]
    fn schema_rejects_unknown_field() {
        let engine = NumerologyEngine::new();
        let mut payload = Map::new();
        payload.insert("full_name".into(), json!("A"));
        payload.insert("birth_date".into(), json!("1990-05-15"));
        payload.insert("shoe_size".into(), json!(43));
        assert!(engine.input_schema().validate(&payload).is_err());
    }
}
