//! Biorhythm Divination Engine
//!
//! Sine-wave biorhythm analysis over the three core cycles (physical 23d,
//! emotional 28d, intellectual 33d) and the optional extended cycles
//! (intuitive 38d, aesthetic 43d, spiritual 53d). Includes phase labelling,
//! critical-day detection, an N-day forecast, and a two-person
//! compatibility helper. Pure math -- no dependencies beyond chrono.

use arcana_core::{
    DivinationEngine, EngineError, FieldKind, FieldSpec, FormattedOutput, InputSchema,
    OutputSchema, ValidatedInput,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// Cycle definitions
// ---------------------------------------------------------------------------

/// Core cycles: (name, period in days).
pub const CORE_CYCLES: [(&str, u32); 3] = [("physical", 23), ("emotional", 28), ("intellectual", 33)];

/// Extended cycles: (name, period in days).
pub const EXTENDED_CYCLES: [(&str, u32); 3] = [("intuitive", 38), ("aesthetic", 43), ("spiritual", 53)];

/// Percentage band around zero that counts as a critical crossing.
pub const CRITICAL_BAND: f64 = 5.0;

/// Cycle percentage at `days_alive` for a period: sin(2π·d/p) · 100.
pub fn cycle_percentage(days_alive: i64, period: u32) -> f64 {
    (2.0 * PI * days_alive as f64 / period as f64).sin() * 100.0
}

/// First derivative sign carrier: cos(2π·d/p).
fn cycle_derivative(days_alive: i64, period: u32) -> f64 {
    (2.0 * PI * days_alive as f64 / period as f64).cos()
}

/// Phase label from value and derivative.
///
/// Near zero is critical; positive values rise, then peak near the top on
/// the way down, then fall; negative values mirror this through the valley.
pub fn phase_label(percentage: f64, derivative: f64) -> &'static str {
    if percentage.abs() < CRITICAL_BAND {
        "critical"
    } else if percentage > 0.0 {
        if derivative > 0.0 {
            "rising"
        } else if percentage >= 95.0 {
            "peak"
        } else {
            "falling"
        }
    } else if derivative < 0.0 {
        "falling"
    } else if percentage <= -95.0 {
        "valley"
    } else {
        "rising"
    }
}

/// Snapshot of one cycle on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub name: String,
    pub period: u32,
    pub percentage: f64,
    pub phase: String,
}

pub fn snapshot(name: &str, period: u32, days_alive: i64) -> CycleSnapshot {
    let percentage = cycle_percentage(days_alive, period);
    let derivative = cycle_derivative(days_alive, period);
    CycleSnapshot {
        name: name.to_string(),
        period,
        percentage,
        phase: phase_label(percentage, derivative).to_string(),
    }
}

/// A day counts as critical when at least two cycles sit inside the
/// zero-crossing band at once.
pub fn is_critical_day(days_alive: i64, periods: &[u32]) -> bool {
    periods
        .iter()
        .filter(|&&p| cycle_percentage(days_alive, p).abs() < CRITICAL_BAND)
        .count()
        >= 2
}

/// Per-cycle compatibility between two people: 1.0 when in phase, 0.0 when
/// opposed, linear in the phase distance.
pub fn cycle_compatibility(days_alive_a: i64, days_alive_b: i64, period: u32) -> f64 {
    let diff = (days_alive_a - days_alive_b).rem_euclid(period as i64) as f64;
    let half = period as f64 / 2.0;
    1.0 - (diff.min(period as f64 - diff)) / half
}

// ---------------------------------------------------------------------------
// Typed input
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BiorhythmInput {
    birth_date: NaiveDate,
    #[serde(default)]
    target_date: Option<NaiveDate>,
    #[serde(default)]
    include_extended_cycles: bool,
    #[serde(default = "default_forecast_days")]
    forecast_days: u32,
}

fn default_forecast_days() -> u32 {
    7
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct BiorhythmEngine;

impl BiorhythmEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BiorhythmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DivinationEngine for BiorhythmEngine {
    fn name(&self) -> &'static str {
        "biorhythm"
    }

    fn description(&self) -> &'static str {
        "Biorhythm cycle analysis with critical day detection and energy optimization forecasting"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new(vec![
            FieldSpec::required("birth_date", FieldKind::Date, "Date of birth"),
            FieldSpec::optional("target_date", FieldKind::Date, "Date to calculate for (defaults to today)"),
            FieldSpec::optional(
                "include_extended_cycles",
                FieldKind::Boolean,
                "Include intuitive, aesthetic and spiritual cycles",
            ),
            FieldSpec::optional("forecast_days", FieldKind::Integer, "Days to forecast")
                .range(1.0, 90.0),
        ])
    }

    fn output_schema(&self) -> OutputSchema {
        OutputSchema::new(vec![
            FieldSpec::required("days_alive", FieldKind::Integer, "Days alive at target date"),
            FieldSpec::required("cycles", FieldKind::Object, "Per-cycle percentage and phase"),
            FieldSpec::required("critical_day", FieldKind::Boolean, "Two or more cycles near zero"),
            FieldSpec::required("overall_energy", FieldKind::Float, "Mean of core cycle percentages"),
            FieldSpec::required("forecast", FieldKind::Array, "Day-by-day forecast"),
            FieldSpec::required("critical_days_ahead", FieldKind::Array, "Critical days in the window"),
        ])
    }

    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
        let parsed: BiorhythmInput = serde_json::from_value(input.payload_value())
            .map_err(|e| EngineError::invalid_input("payload", e.to_string()))?;

        let target = parsed
            .target_date
            .unwrap_or_else(|| input.envelope.timestamp.date_naive());
        if target < parsed.birth_date {
            return Err(EngineError::invalid_input(
                "target_date",
                "must not precede birth_date",
            ));
        }

        let days_alive = (target - parsed.birth_date).num_days();

        let mut periods: Vec<(&str, u32)> = CORE_CYCLES.to_vec();
        if parsed.include_extended_cycles {
            periods.extend(EXTENDED_CYCLES);
        }
        let period_values: Vec<u32> = periods.iter().map(|(_, p)| *p).collect();

        let mut cycles = serde_json::Map::new();
        for (name, period) in &periods {
            cycles.insert(
                name.to_string(),
                serde_json::to_value(snapshot(name, *period, days_alive)).unwrap(),
            );
        }

        let core_values: Vec<f64> = CORE_CYCLES
            .iter()
            .map(|(_, p)| cycle_percentage(days_alive, *p))
            .collect();
        let overall_energy = core_values.iter().sum::<f64>() / core_values.len() as f64;

        // Forecast window: the N days after the target date.
        let mut forecast = Vec::new();
        let mut critical_days_ahead = Vec::new();
        let mut best_days_ahead = Vec::new();
        let mut challenging_days_ahead = Vec::new();

        for offset in 1..=parsed.forecast_days as i64 {
            let day = days_alive + offset;
            let date = target + chrono::Duration::days(offset);
            let values: Vec<f64> = CORE_CYCLES
                .iter()
                .map(|(_, p)| cycle_percentage(day, *p))
                .collect();
            let energy = values.iter().sum::<f64>() / values.len() as f64;
            let critical = is_critical_day(day, &period_values);

            if critical {
                critical_days_ahead.push(date.to_string());
            }
            if energy > 50.0 {
                best_days_ahead.push(date.to_string());
            }
            if energy < -50.0 || critical {
                challenging_days_ahead.push(date.to_string());
            }

            forecast.push(json!({
                "date": date.to_string(),
                "days_alive": day,
                "physical": values[0],
                "emotional": values[1],
                "intellectual": values[2],
                "overall_energy": energy,
                "critical_day": critical,
            }));
        }

        let energy_in_three_days = {
            let day = days_alive + 3;
            CORE_CYCLES
                .iter()
                .map(|(_, p)| cycle_percentage(day, *p))
                .sum::<f64>()
                / 3.0
        };
        let trend = if energy_in_three_days > overall_energy + 10.0 {
            "ascending"
        } else if energy_in_three_days < overall_energy - 10.0 {
            "descending"
        } else {
            "stable"
        };

        Ok(json!({
            "birth_date": parsed.birth_date.to_string(),
            "target_date": target.to_string(),
            "days_alive": days_alive,
            "cycles": cycles,
            "physical_percentage": core_values[0],
            "emotional_percentage": core_values[1],
            "intellectual_percentage": core_values[2],
            "overall_energy": overall_energy,
            "critical_day": is_critical_day(days_alive, &period_values),
            "trend": trend,
            "forecast": forecast,
            "critical_days_ahead": critical_days_ahead,
            "best_days_ahead": best_days_ahead,
            "challenging_days_ahead": challenging_days_ahead,
            "extended_cycles_included": parsed.include_extended_cycles,
        }))
    }

    fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
        let mut text = format!(
            "🌊 BIORHYTHM FIELD ANALYSIS - {} 🌊\n\n",
            raw["target_date"].as_str().unwrap_or("")
        );
        text.push_str(&format!(
            "Days alive: {}\n\n",
            raw["days_alive"].as_i64().unwrap_or(0)
        ));

        for (emoji, key) in [
            ("🔴", "physical"),
            ("🟡", "emotional"),
            ("🔵", "intellectual"),
        ] {
            let cycle = &raw["cycles"][key];
            text.push_str(&format!(
                "{} {} ({:.1}%): {}\n",
                emoji,
                key.to_uppercase(),
                cycle["percentage"].as_f64().unwrap_or(0.0),
                cycle["phase"].as_str().unwrap_or("unknown"),
            ));
        }

        text.push_str(&format!(
            "\n⚖️ Overall energy: {:.1}%\n",
            raw["overall_energy"].as_f64().unwrap_or(0.0)
        ));

        if raw["critical_day"].as_bool().unwrap_or(false) {
            text.push_str("\n⚠️ CRITICAL DAY: two or more cycles crossing zero. Heightened sensitivity; move deliberately.\n");
        } else if let Some(days) = raw["critical_days_ahead"].as_array() {
            if let Some(next) = days.first().and_then(|d| d.as_str()) {
                text.push_str(&format!("\n🔮 Next critical day: {}\n", next));
            } else {
                text.push_str("\n✅ No critical days in the forecast window.\n");
            }
        }

        FormattedOutput::Text(text)
    }

    fn recommendations(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut recs = Vec::new();
        for key in ["physical", "emotional", "intellectual"] {
            let cycle = &raw["cycles"][key];
            let phase = cycle["phase"].as_str().unwrap_or("");
            let rec = match (key, phase) {
                ("physical", "peak") => "Physical peak: schedule demanding physical work now",
                ("physical", "critical") => "Physical critical: avoid high-risk physical activities",
                ("physical", "valley") => "Physical valley: prioritise rest and recovery",
                ("emotional", "peak") => "Emotional peak: ideal window for important conversations",
                ("emotional", "critical") => "Emotional critical: practice patience, delay reactions",
                ("intellectual", "peak") => "Intellectual peak: tackle complex analysis and planning",
                ("intellectual", "critical") => "Intellectual critical: double-check important work",
                _ => continue,
            };
            recs.push(rec.to_string());
        }
        if recs.is_empty() {
            recs.push("Cycles are in transit: maintain steady routines".into());
        }
        recs
    }

    fn reality_patches(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let mut patches = vec!["Install: cycle-aware daily scheduling".to_string()];
        if raw["critical_day"].as_bool().unwrap_or(false) {
            patches.push("Activate: critical-day mindfulness protocol".into());
        }
        patches
    }

    fn archetypal_themes(&self, raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        let energy = raw["overall_energy"].as_f64().unwrap_or(0.0);
        vec![if energy > 33.0 {
            "The Wave Rider".to_string()
        } else if energy < -33.0 {
            "The Deep Rester".to_string()
        } else {
            "The Balancer".to_string()
        }]
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

    fn input(payload: Value) -> ValidatedInput {
        let map: Map<String, Value> = match payload {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        ValidatedInput::new(RequestEnvelope::default(), map)
    }

    #[test]
    fn zero_boundary_on_birth_date() {
        for (_, p) in CORE_CYCLES.iter().chain(EXTENDED_CYCLES.iter()) {
            assert_eq!(cycle_percentage(0, *p), 0.0);
        }
    }

    #[test]
    fn percentages_stay_in_range() {
        for d in 0..500 {
            for (_, p) in CORE_CYCLES {
                let v = cycle_percentage(d, p);
                assert!((-100.0..=100.0).contains(&v));
            }
        }
    }

    #[test]
    fn series_over_two_periods_sums_to_about_zero() {
        for (_, p) in CORE_CYCLES {
            let sum: f64 = (0..(2 * p as i64)).map(|d| cycle_percentage(d, p)).sum();
            assert!(sum.abs() < 1e-6, "period {}: sum {}", p, sum);
        }
    }

    #[test]
    fn phase_labels_follow_value_and_derivative() {
        assert_eq!(phase_label(2.0, 1.0), "critical");
        assert_eq!(phase_label(-4.9, -1.0), "critical");
        assert_eq!(phase_label(50.0, 0.5), "rising");
        assert_eq!(phase_label(98.0, -0.1), "peak");
        assert_eq!(phase_label(50.0, -0.5), "falling");
        assert_eq!(phase_label(-50.0, -0.5), "falling");
        assert_eq!(phase_label(-98.0, 0.1), "valley");
        assert_eq!(phase_label(-50.0, 0.5), "rising");
    }

    #[test]
    fn critical_day_requires_two_cycles_near_zero() {
        let periods: Vec<u32> = CORE_CYCLES.iter().map(|(_, p)| *p).collect();
        // Day 0: every cycle is exactly at zero.
        assert!(is_critical_day(0, &periods));
        // Day 6: physical sin(2π·6/23)=~1.0, emotional ~0.97, intellectual ~0.9 — none near zero.
        assert!(!is_critical_day(6, &periods));
    }

    #[test]
    fn known_days_alive() {
        let engine = BiorhythmEngine::new();
        let raw = engine
            .calculate(&input(json!({
                "birth_date": "1990-05-15",
                "target_date": "2024-01-15"
            })))
            .unwrap();
        assert_eq!(raw["days_alive"], 12298);
        for key in [
            "physical_percentage",
            "emotional_percentage",
            "intellectual_percentage",
        ] {
            let v = raw[key].as_f64().unwrap();
            assert!((-100.0..=100.0).contains(&v));
        }
        assert!(raw["critical_day"].is_boolean());
    }

    #[test]
    fn forecast_length_matches_request() {
        let engine = BiorhythmEngine::new();
        let raw = engine
            .calculate(&input(json!({
                "birth_date": "1990-05-15",
                "target_date": "2024-01-15",
                "forecast_days": 14
            })))
            .unwrap();
        assert_eq!(raw["forecast"].as_array().unwrap().len(), 14);
    }

    #[test]
    fn extended_cycles_only_when_requested() {
        let engine = BiorhythmEngine::new();
        let base = engine
            .calculate(&input(json!({
                "birth_date": "1990-05-15",
                "target_date": "2024-01-15"
            })))
            .unwrap();
        assert!(base["cycles"]["intuitive"].is_null());

        let extended = engine
            .calculate(&input(json!({
                "birth_date": "1990-05-15",
                "target_date": "2024-01-15",
                "include_extended_cycles": true
            })))
            .unwrap();
        for key in ["intuitive", "aesthetic", "spiritual"] {
            assert!(extended["cycles"][key].is_object(), "{} missing", key);
        }
    }

    #[test]
    fn rejects_target_before_birth() {
        let engine = BiorhythmEngine::new();
        let err = engine
            .calculate(&input(json!({
                "birth_date": "1990-05-15",
                "target_date": "1980-01-01"
            })))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn compatibility_bounds() {
        // Same birth date: fully in phase.
        assert!((cycle_compatibility(100, 100, 23) - 1.0).abs() < 1e-9);
        // Half a period apart: fully opposed.
        assert!(cycle_compatibility(100, 100 + 14, 28).abs() < 1e-9);
        for offset in 0..60 {
            let c = cycle_compatibility(1000, 1000 + offset, 33);
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn interpret_mentions_critical_state() {
        let engine = BiorhythmEngine::new();
        let inp = input(json!({
            "birth_date": "1990-05-15",
            "target_date": "1990-05-15"
        }));
        let raw = engine.calculate(&inp).unwrap();
        // Birth day itself: all cycles at zero, a critical day by definition.
        assert_eq!(raw["critical_day"], true);
        let text = engine.interpret(&raw, &inp);
        assert!(text.as_text().unwrap().contains("CRITICAL DAY"));
    }
}
