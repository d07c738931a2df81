//! Human Design wheel mapping
//!
//! Converts ecliptic longitudes into Human Design gate activations. The 64
//! gates are laid out around the wheel in the official sequence -- four
//! quarters of four godheads of four gates each. The sequence is data, not
//! logic: it is loaded verbatim from `data/hd_wheel.json` together with the
//! per-role longitude offsets, and shape-asserted at first use.
//!
//! Mapping:
//! - 360° / 64 gates = 5.625° per gate
//! - before indexing, the raw longitude is shifted by a per-role offset
//!   (personality vs design, sun-group vs earth)
//! - gate = sequence[floor(shifted / 5.625)], position clamped to 0-63
//! - line = floor((shifted mod 5.625) / 0.9375) + 1, clamped to 1-6

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::ephemeris::Body;

const DEGREES_PER_GATE: f64 = 360.0 / 64.0; // 5.625°
const DEGREES_PER_LINE: f64 = DEGREES_PER_GATE / 6.0; // 0.9375°

const WHEEL_JSON: &str = include_str!("../data/hd_wheel.json");

// ---------------------------------------------------------------------------
// Wheel data
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WheelOffsets {
    personality_sun: f64,
    personality_earth: f64,
    design_sun: f64,
    design_earth: f64,
}

#[derive(Debug, Deserialize)]
struct WheelData {
    gate_sequence: Vec<u8>,
    offsets: WheelOffsets,
}

fn wheel() -> &'static WheelData {
    static WHEEL: OnceLock<WheelData> = OnceLock::new();
    WHEEL.get_or_init(|| {
        let data: WheelData =
            serde_json::from_str(WHEEL_JSON).expect("hd_wheel.json is malformed");
        assert_eq!(data.gate_sequence.len(), 64, "gate sequence must list 64 gates");
        let mut seen = [false; 65];
        for &gate in &data.gate_sequence {
            assert!((1..=64).contains(&gate), "gate {} out of range", gate);
            assert!(!seen[gate as usize], "gate {} appears twice", gate);
            seen[gate as usize] = true;
        }
        data
    })
}

/// Whether a longitude is being mapped for the personality (birth) or
/// design (88° prior) side of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Personality,
    Design,
}

/// One gate activation: gate number plus its sub-structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateActivation {
    /// Gate number, 1-64.
    pub number: u8,
    /// Line within the gate, 1-6.
    pub line: u8,
    /// Color, 1-6.
    pub color: u8,
    /// Tone, 1-6.
    pub tone: u8,
    /// Base, 1-5.
    pub base: u8,
}

/// Longitude offset applied before wheel indexing.
///
/// Earth uses its own offset per role; every other body uses the sun offset
/// of its role.
pub fn role_offset(role: Role, body: Body) -> f64 {
    let offsets = &wheel().offsets;
    match (role, body) {
        (Role::Personality, Body::Earth) => offsets.personality_earth,
        (Role::Personality, _) => offsets.personality_sun,
        (Role::Design, Body::Earth) => offsets.design_earth,
        (Role::Design, _) => offsets.design_sun,
    }
}

/// Map a raw ecliptic longitude to a gate activation for the given role and
/// body.
pub fn gate_for(longitude: f64, role: Role, body: Body) -> GateActivation {
    let shifted = (longitude + role_offset(role, body)).rem_euclid(360.0);

    let position = ((shifted / DEGREES_PER_GATE).floor() as usize).min(63);
    let number = wheel().gate_sequence[position];

    let line = (((shifted % DEGREES_PER_GATE) / DEGREES_PER_LINE).floor() as u8 + 1).clamp(1, 6);

    // Color/tone/base are digit transforms of the raw longitude.
    let raw = longitude.rem_euclid(360.0);
    let color = ((raw * 100.0).trunc() as i64 % 6 + 1) as u8;
    let tone = ((raw * 1000.0).trunc() as i64 % 6 + 1) as u8;
    let base = ((raw * 10000.0).trunc() as i64 % 5 + 1) as u8;

    GateActivation { number, line, color, tone, base }
}

/// A raw longitude whose mapping yields the given gate and line for the
/// given role and body. Inverse of [`gate_for`]; used by tests and by the
/// wheel-calibration tooling.
pub fn longitude_for_gate(gate: u8, line: u8, role: Role, body: Body) -> f64 {
    let position = wheel()
        .gate_sequence
        .iter()
        .position(|&g| g == gate)
        .expect("gate must be 1-64") as f64;
    let shifted =
        position * DEGREES_PER_GATE + (line as f64 - 1.0) * DEGREES_PER_LINE + DEGREES_PER_LINE / 2.0;
    (shifted - role_offset(role, body)).rem_euclid(360.0)
}

/// The official 64-gate sequence, in wheel order.
pub fn gate_sequence() -> &'static [u8] {
    &wheel().gate_sequence
}
