//! Vimshottari Dasha Divination Engine
//!
//! Computes the 120-year planetary period timeline from the sidereal Moon
//! nakshatra at birth, with nested Antardasha and Pratyantardasha periods
//! and the balance of the first period set by how far the Moon had moved
//! through its mansion.

pub mod calculator;

use std::sync::Arc;

use arcana_astro::{julian_day, nakshatra_for, Body, Ephemeris, Zodiac};
use arcana_core::{
    BirthData, DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use serde_json::{json, Value};

pub use calculator::{
    current_periods, mahadasha_timeline, planet_theme, subdivide, CurrentPeriods, DashaPeriod,
    CYCLE_YEARS, DASHA_SEQUENCE,
};

pub struct VimshottariEngine {
    ephemeris: Arc<dyn Ephemeris>,
}

impl VimshottariEngine {
    pub fn new(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self { ephemeris }
    }
}

impl DivinationEngine for VimshottariEngine {
    fn name(&self) -> &'static str {
        "vimshottari"
    }

    fn description(&self) -> &'static str {
        "Vimshottari dasha timeline decoder — 120-year planetary periods from the Moon nakshatra"
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
            FieldSpec::required("moon_nakshatra", FieldKind::Object, "Birth Moon mansion"),
            FieldSpec::required("timeline", FieldKind::Array, "Mahadasha timeline"),
            FieldSpec::required("current_periods", FieldKind::Object, "Nested current periods"),
            FieldSpec::required("upcoming_periods", FieldKind::Array, "Next Mahadashas"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let birth: BirthData = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;
        birth.validate()?;
        birth.require_time()?;
        birth.require_location()?;

        let birth_utc = birth.to_utc()?;
        let jd = julian_day(&birth_utc);

        let moon = self
            .ephemeris
            .position(jd, Body::Moon, Zodiac::Sidereal)?;
        let nakshatra = nakshatra_for(moon.longitude_deg);
        let fraction = nakshatra.completed_fraction();

        let timeline = mahadasha_timeline(birth.birth_date, &nakshatra.lord, fraction);
        let today = input.envelope.timestamp.date_naive();
        let current = current_periods(&timeline, today);

        let upcoming: Vec<&DashaPeriod> = timeline
            .iter()
            .filter(|p| p.start_date > today)
            .take(3)
            .collect();

        let timeline_json: Vec<Value> = timeline
            .iter()
            .map(|p| {
                json!({
                    "planet": p.planet,
                    "start_date": p.start_date.to_string(),
                    "end_date": p.end_date.to_string(),
                    "duration_years": p.duration_years,
                    "theme": planet_theme(&p.planet),
                })
            })
            .collect();

        let period_json = |p: &DashaPeriod| {
            json!({
                "planet": p.planet,
                "start_date": p.start_date.to_string(),
                "end_date": p.end_date.to_string(),
                "duration_years": p.duration_years,
                "theme": planet_theme(&p.planet),
            })
        };

        Ok(json!({
            "moon_nakshatra": {
                "name": nakshatra.name,
                "lord": nakshatra.lord,
                "pada": nakshatra.pada,
                "degrees_in_nakshatra": nakshatra.degrees_in_nakshatra,
                "longitude": nakshatra.longitude,
                "completed_fraction": fraction,
            },
            "first_period_balance_years": timeline[0].duration_years,
            "timeline": timeline_json,
            "current_periods": current.as_ref().map(|c| json!({
                "mahadasha": period_json(&c.mahadasha),
                "antardasha": c.antardasha.as_ref().map(period_json),
                "pratyantardasha": c.pratyantardasha.as_ref().map(period_json),
            })),
            "upcoming_periods": upcoming.iter().map(|p| period_json(p)).collect::<Vec<_>>(),
            "cycle_years": CYCLE_YEARS,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = String::from("🌙 VIMSHOTTARI DASHA TIMELINE ANALYSIS 🌙\n\n");
        let nakshatra = &raw["moon_nakshatra"];
        text.push_str(&format!(
            "🌌 Birth Moon: {} (pada {}), ruled by {}\n\n",
            nakshatra["name"].as_str().unwrap_or(""),
            nakshatra["pada"],
            nakshatra["lord"].as_str().unwrap_or(""),
        ));

        if let Some(current) = raw["current_periods"].as_object() {
            if let Some(maha) = current.get("mahadasha") {
                text.push_str(&format!(
                    "🔥 MAHADASHA: {} ({} → {})\n   {}\n",
                    maha["planet"].as_str().unwrap_or(""),
                    maha["start_date"].as_str().unwrap_or(""),
                    maha["end_date"].as_str().unwrap_or(""),
                    maha["theme"].as_str().unwrap_or(""),
                ));
            }
            if let Some(antar) = current.get("antardasha").filter(|v| !v.is_null()) {
                text.push_str(&format!(
                    "🌊 ANTARDASHA: {}\n",
                    antar["planet"].as_str().unwrap_or("")
                ));
            }
            if let Some(pratyantar) = current.get("pratyantardasha").filter(|v| !v.is_null()) {
                text.push_str(&format!(
                    "⚡ PRATYANTARDASHA: {}\n",
                    pratyantar["planet"].as_str().unwrap_or("")
                ));
            }
        }

        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = Vec::new();
        if let Some(planet) = raw["current_periods"]["mahadasha"]["planet"].as_str() {
            recs.push(format!(
                "Work with the {} Mahadasha current: {}",
                planet,
                planet_theme(planet).to_lowercase()
            ));
        }
        if let Some(next) = raw["upcoming_periods"].as_array().and_then(|a| a.first()) {
            recs.push(format!(
                "Prepare for the coming {} period beginning {}",
                next["planet"].as_str().unwrap_or(""),
                next["start_date"].as_str().unwrap_or("")
            ));
        }
        recs
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        raw["current_periods"]["mahadasha"]["planet"]
            .as_str()
            .map(|p| vec![format!("The {} Current", p)])
            .unwrap_or_default()
    }
}
