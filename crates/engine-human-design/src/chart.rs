//! Chart computation
//!
//! Builds a complete Human Design chart from a UTC birth moment: thirteen
//! personality activations at birth, thirteen design activations at the
//! 88°-solar-arc design moment, then the derived structure (channels,
//! centers, type, strategy, authority, profile, incarnation cross).

use std::collections::BTreeSet;
use std::sync::OnceLock;

use arcana_astro::{
    find_design_time, gate_for, julian_day, julian_day_to_datetime, Body, Ephemeris, Role, Zodiac,
};
use arcana_core::EngineError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::centers::{defined_centers, defined_channels, motor_to_throat};
use crate::models::{
    line_name, ActivationMap, Authority, Center, Chart, HdType, SolarArc,
};

const CROSSES_JSON: &str = include_str!("../data/incarnation_crosses.json");

fn cross_table() -> &'static BTreeMap<u8, String> {
    static TABLE: OnceLock<BTreeMap<u8, String>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(CROSSES_JSON).expect("incarnation_crosses.json is malformed");
        let table: BTreeMap<u8, String> = raw
            .into_iter()
            .map(|(k, v)| (k.parse::<u8>().expect("cross table keys are gate numbers"), v))
            .collect();
        assert_eq!(table.len(), 64, "cross table must cover all 64 sun gates");
        table
    })
}

fn activations_for(
    eph: &dyn Ephemeris,
    jd: f64,
    role: Role,
) -> Result<ActivationMap, EngineError> {
    let positions = eph.positions_at(jd, &Body::CHART_BODIES, Zodiac::Tropical)?;
    let mut map = ActivationMap::new();
    for (body, position) in positions {
        map.insert(
            body.as_str().to_string(),
            gate_for(position.longitude_deg, role, body),
        );
    }
    Ok(map)
}

fn determine_type(defined: &[Center], motor_throat: bool) -> HdType {
    let sacral = defined.contains(&Center::Sacral);
    if defined.is_empty() {
        HdType::Reflector
    } else if motor_throat && !sacral {
        HdType::Manifestor
    } else if sacral {
        HdType::Generator
    } else {
        HdType::Projector
    }
}

fn determine_authority(defined: &[Center], hd_type: HdType) -> Authority {
    if defined.contains(&Center::SolarPlexus) {
        Authority::Emotional
    } else if defined.contains(&Center::Sacral) {
        Authority::Sacral
    } else if defined.contains(&Center::Spleen) {
        Authority::Splenic
    } else if defined.contains(&Center::Heart) {
        Authority::Ego
    } else if defined.contains(&Center::G) {
        Authority::SelfProjected
    } else if hd_type == HdType::Reflector {
        Authority::Lunar
    } else {
        Authority::Mental
    }
}

/// Compute a full chart for a UTC birth moment.
pub fn compute_chart(eph: &dyn Ephemeris, birth_utc: DateTime<Utc>) -> Result<Chart, EngineError> {
    let birth_jd = julian_day(&birth_utc);

    let personality_gates = activations_for(eph, birth_jd, Role::Personality)?;

    let design = find_design_time(eph, birth_jd)?;
    let design_gates = activations_for(eph, design.jd, Role::Design)?;

    let personality_sun = eph.sun_longitude(birth_jd)?;
    let design_sun = eph.sun_longitude(design.jd)?;

    let activated: BTreeSet<u8> = personality_gates
        .values()
        .chain(design_gates.values())
        .map(|a| a.number)
        .collect();

    let channels = defined_channels(&activated);
    let centers = defined_centers(&channels);
    let motor_throat = motor_to_throat(&channels);
    let hd_type = determine_type(&centers, motor_throat);
    let authority = determine_authority(&centers, hd_type);

    let p_sun = personality_gates
        .get("sun")
        .ok_or_else(|| EngineError::internal("human_design", "personality sun missing"))?;
    let d_sun = design_gates
        .get("sun")
        .ok_or_else(|| EngineError::internal("human_design", "design sun missing"))?;
    let p_earth = personality_gates
        .get("earth")
        .ok_or_else(|| EngineError::internal("human_design", "personality earth missing"))?;
    let d_earth = design_gates
        .get("earth")
        .ok_or_else(|| EngineError::internal("human_design", "design earth missing"))?;

    let profile = format!(
        "{}/{} {}/{}",
        p_sun.line,
        d_sun.line,
        line_name(p_sun.line),
        line_name(d_sun.line)
    );

    let cross_name = &cross_table()[&p_sun.number];
    let incarnation_cross = format!(
        "Right Angle Cross of {} ({}/{} | {}/{})",
        cross_name, p_sun.number, p_earth.number, d_sun.number, d_earth.number
    );

    Ok(Chart {
        personality_gates,
        design_gates,
        design_datetime: julian_day_to_datetime(design.jd).to_rfc3339(),
        design_converged: design.converged,
        defined_channels: channels.iter().map(|c| c.gates).collect(),
        defined_centers: centers,
        strategy: hd_type.strategy().to_string(),
        hd_type,
        authority,
        profile,
        incarnation_cross,
        solar_arc: SolarArc {
            personality_sun_longitude: personality_sun,
            design_sun_longitude: design_sun,
            arc_degrees: (personality_sun - design_sun).rem_euclid(360.0),
        },
    })
}
