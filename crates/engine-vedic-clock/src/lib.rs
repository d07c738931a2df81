//! VedicClock-TCM Divination Engine
//!
//! Combines three timing systems into one alignment reading: the Vedic day
//! lord (vara) and ghati position, the Traditional Chinese Medicine organ
//! clock (twelve organs, two hours each), and the personal day vibration
//! from numerology. The combined alignment score marks favourable windows
//! for the requested optimization focus.

use arcana_core::{
    BirthData, DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use engine_numerology::{NumerologyCalculator, NumerologySystem};
use serde::Deserialize;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Vedic day lords
// ---------------------------------------------------------------------------

/// (day lord, quality) for each weekday.
pub fn vara_for(weekday: Weekday) -> (&'static str, &'static str) {
    match weekday {
        Weekday::Sun => ("Sun", "vitality, authority, new initiatives"),
        Weekday::Mon => ("Moon", "nurture, reflection, emotional work"),
        Weekday::Tue => ("Mars", "action, courage, decisive effort"),
        Weekday::Wed => ("Mercury", "communication, study, commerce"),
        Weekday::Thu => ("Jupiter", "expansion, teaching, counsel"),
        Weekday::Fri => ("Venus", "relationship, art, harmonising"),
        Weekday::Sat => ("Saturn", "discipline, completion, structure"),
    }
}

/// Ghati position: 60 ghatis per day of 24 minutes each, counted from a
/// 06:00 conventional sunrise.
pub fn ghati_for(time: NaiveTime) -> (u32, u32) {
    let minutes_since_sunrise =
        (time.hour() as i64 * 60 + time.minute() as i64 - 6 * 60).rem_euclid(24 * 60);
    let ghati = (minutes_since_sunrise / 24) as u32;
    let pala = ((minutes_since_sunrise % 24) * 60 / 24) as u32;
    (ghati, pala)
}

// ---------------------------------------------------------------------------
// TCM organ clock
// ---------------------------------------------------------------------------

/// (organ, element, quality) for each two-hour window, starting 23:00.
pub const ORGAN_CLOCK: [(&str, &str, &str); 12] = [
    ("Gallbladder", "wood", "decision-making and courage"),       // 23-01
    ("Liver", "wood", "planning and deep restoration"),           // 01-03
    ("Lung", "metal", "breath, grief release, renewal"),          // 03-05
    ("Large Intestine", "metal", "letting go and elimination"),   // 05-07
    ("Stomach", "earth", "nourishment and intake"),               // 07-09
    ("Spleen", "earth", "transformation and focus"),              // 09-11
    ("Heart", "fire", "joy, connection, circulation"),            // 11-13
    ("Small Intestine", "fire", "discernment and sorting"),       // 13-15
    ("Bladder", "water", "reserves and steady effort"),           // 15-17
    ("Kidney", "water", "willpower and deep energy"),             // 17-19
    ("Pericardium", "fire", "intimacy and protection"),           // 19-21
    ("Triple Burner", "fire", "integration and regulation"),      // 21-23
];

/// Organ-clock window for a local time.
pub fn organ_for(time: NaiveTime) -> (&'static str, &'static str, &'static str) {
    let hour = time.hour();
    let index = (((hour + 1) % 24) / 2) as usize;
    ORGAN_CLOCK[index]
}

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

fn element_for_planet(planet: &str) -> &'static str {
    match planet {
        "Sun" | "Mars" => "fire",
        "Moon" | "Venus" => "water",
        "Mercury" => "earth",
        "Jupiter" => "wood",
        _ => "metal", // Saturn
    }
}

/// How well two elements support each other under the generating cycle.
fn element_harmony(a: &str, b: &str) -> f64 {
    // Generating cycle: wood -> fire -> earth -> metal -> water -> wood.
    const CYCLE: [&str; 5] = ["wood", "fire", "earth", "metal", "water"];
    let pos = |e: &str| CYCLE.iter().position(|c| *c == e);
    match (pos(a), pos(b)) {
        (Some(x), Some(y)) if x == y => 1.0,
        (Some(x), Some(y)) if (x + 1) % 5 == y || (y + 1) % 5 == x => 0.8,
        (Some(x), Some(y)) if (x + 2) % 5 == y || (y + 2) % 5 == x => 0.4,
        _ => 0.6,
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VedicClockInput {
    #[serde(flatten)]
    birth: BirthData,
    #[serde(default)]
    target_date: Option<NaiveDate>,
    #[serde(default, with = "arcana_core::types::opt_hhmm")]
    target_time: Option<NaiveTime>,
    #[serde(default)]
    optimization_focus: Option<String>,
}

pub struct VedicClockEngine;

impl VedicClockEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VedicClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for VedicClockEngine {
    fn name(&self) -> &'static str {
        "vedicclock_tcm"
    }

    fn description(&self) -> &'static str {
        "VedicClock-TCM timing synthesis — day lords, organ-clock windows and personal vibration alignment"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("birth_date", FieldKind::Date, "Date of birth"),
            FieldSpec::optional("birth_time", FieldKind::Time, "Local time of birth"),
            FieldSpec::optional("birth_location", FieldKind::Array, "(latitude, longitude)"),
            FieldSpec::optional("timezone", FieldKind::String, "IANA timezone identifier"),
            FieldSpec::optional("target_date", FieldKind::Date, "Date to optimise (defaults to today)"),
            FieldSpec::optional("target_time", FieldKind::Time, "Local time to optimise"),
            FieldSpec::optional("optimization_focus", FieldKind::String, "What to optimise for")
                .one_of(&["energy", "decisions", "communication", "rest", "creativity"]),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("vara", FieldKind::Object, "Vedic day lord"),
            FieldSpec::required("ghati", FieldKind::Object, "Ghati position"),
            FieldSpec::required("organ_window", FieldKind::Object, "TCM organ window"),
            FieldSpec::required("personal_day", FieldKind::Integer, "Numerological day vibration"),
            FieldSpec::required("alignment_score", FieldKind::Float, "Combined timing alignment"),
            FieldSpec::required("optimal_windows", FieldKind::Array, "Favourable windows today"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed: VedicClockInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        parsed.birth.validate()?;

        let target_date = parsed
            .target_date
            .unwrap_or_else(|| input.envelope.timestamp.date_naive());
        let target_time = parsed
            .target_time
            .unwrap_or_else(|| input.envelope.timestamp.time());

        let (day_lord, day_quality) = vara_for(target_date.weekday());
        let (ghati, pala) = ghati_for(target_time);
        let (organ, organ_element, organ_quality) = organ_for(target_time);

        let calc = NumerologyCalculator::new(NumerologySystem::Pythagorean);
        let personal_day = calc.personal_day(parsed.birth.birth_date, target_date).value;

        let day_element = element_for_planet(day_lord);
        let alignment_score =
            (element_harmony(day_element, organ_element) + (personal_day as f64 / 9.0).min(1.0))
                / 2.0;

        // Scan the day's twelve windows for the most supportive ones.
        let mut optimal_windows: Vec<Value> = Vec::new();
        for (i, (organ, element, quality)) in ORGAN_CLOCK.iter().enumerate() {
            let start_hour = (23 + 2 * i) % 24;
            let harmony = element_harmony(day_element, element);
            if harmony >= 0.8 {
                optimal_windows.push(json!({
                    "window": format!("{:02}:00-{:02}:00", start_hour, (start_hour + 2) % 24),
                    "organ": organ,
                    "element": element,
                    "quality": quality,
                    "harmony": harmony,
                }));
            }
        }

        Ok(json!({
            "target_date": target_date.to_string(),
            "target_time": target_time.format("%H:%M").to_string(),
            "vara": {
                "day_lord": day_lord,
                "quality": day_quality,
                "element": day_element,
            },
            "ghati": { "ghati": ghati, "pala": pala },
            "organ_window": {
                "organ": organ,
                "element": organ_element,
                "quality": organ_quality,
            },
            "personal_day": personal_day,
            "alignment_score": alignment_score,
            "optimization_focus": parsed.optimization_focus,
            "optimal_windows": optimal_windows,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = String::from("🕉 VEDICCLOCK-TCM TIMING SYNTHESIS 🕉\n\n");
        text.push_str(&format!(
            "📿 Day lord: {} — {}\n",
            raw["vara"]["day_lord"].as_str().unwrap_or(""),
            raw["vara"]["quality"].as_str().unwrap_or(""),
        ));
        text.push_str(&format!(
            "⏳ Ghati {} pala {}\n",
            raw["ghati"]["ghati"], raw["ghati"]["pala"]
        ));
        text.push_str(&format!(
            "🫀 Organ window: {} ({}) — {}\n",
            raw["organ_window"]["organ"].as_str().unwrap_or(""),
            raw["organ_window"]["element"].as_str().unwrap_or(""),
            raw["organ_window"]["quality"].as_str().unwrap_or(""),
        ));
        text.push_str(&format!(
            "🔢 Personal day vibration: {}\n\n⚖️ Alignment: {:.2}\n",
            raw["personal_day"],
            raw["alignment_score"].as_f64().unwrap_or(0.0),
        ));
        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = vec![format!(
            "Work with the {} window: {}",
            raw["organ_window"]["organ"].as_str().unwrap_or(""),
            raw["organ_window"]["quality"].as_str().unwrap_or("")
        )];
        if let Some(windows) = raw["optimal_windows"].as_array() {
            if let Some(first) = windows.first() {
                recs.push(format!(
                    "Today's most supported window is {} ({})",
                    first["window"].as_str().unwrap_or(""),
                    first["organ"].as_str().unwrap_or("")
                ));
            }
        }
        recs
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        raw["vara"]["day_lord"]
            .as_str()
            .map(|lord| vec![format!("The {} Day", lord)])
            .unwrap_or_default()
    }
}
