//! Human Design chart model types

use arcana_astro::GateActivation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The nine centers of the bodygraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Center {
    Head,
    Ajna,
    Throat,
    G,
    Heart,
    Spleen,
    SolarPlexus,
    Sacral,
    Root,
}

impl Center {
    /// Motor centers can initiate; a motor-to-Throat connection is what
    /// makes a Manifestor.
    pub fn is_motor(&self) -> bool {
        matches!(
            self,
            Center::Heart | Center::SolarPlexus | Center::Sacral | Center::Root
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Center::Head => "Head",
            Center::Ajna => "Ajna",
            Center::Throat => "Throat",
            Center::G => "G",
            Center::Heart => "Heart",
            Center::Spleen => "Spleen",
            Center::SolarPlexus => "Solar Plexus",
            Center::Sacral => "Sacral",
            Center::Root => "Root",
        }
    }
}

/// A channel: two gates bridging two centers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Channel {
    pub gates: (u8, u8),
    pub centers: (Center, Center),
    pub name: &'static str,
}

/// The four energy types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HdType {
    Manifestor,
    Generator,
    Projector,
    Reflector,
}

impl HdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HdType::Manifestor => "Manifestor",
            HdType::Generator => "Generator",
            HdType::Projector => "Projector",
            HdType::Reflector => "Reflector",
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            HdType::Manifestor => "To Inform",
            HdType::Generator => "To Respond",
            HdType::Projector => "Wait for the Invitation",
            HdType::Reflector => "Wait a Lunar Cycle",
        }
    }
}

/// Inner authority, resolved through the classical hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authority {
    Emotional,
    Sacral,
    Splenic,
    Ego,
    SelfProjected,
    Mental,
    Lunar,
}

impl Authority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::Emotional => "Emotional",
            Authority::Sacral => "Sacral",
            Authority::Splenic => "Splenic",
            Authority::Ego => "Ego",
            Authority::SelfProjected => "Self-Projected",
            Authority::Mental => "Mental",
            Authority::Lunar => "Lunar",
        }
    }
}

/// Classical line names, 1-6.
pub fn line_name(line: u8) -> &'static str {
    match line {
        1 => "Investigator",
        2 => "Hermit",
        3 => "Martyr",
        4 => "Opportunist",
        5 => "Heretic",
        6 => "Role Model",
        _ => "Unknown",
    }
}

/// Activations for one side of the chart, keyed by body name.
pub type ActivationMap = BTreeMap<String, GateActivation>;

/// A complete Human Design chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chart {
    pub personality_gates: ActivationMap,
    pub design_gates: ActivationMap,
    /// UTC design moment located by the 88° solar-arc search.
    pub design_datetime: String,
    pub design_converged: bool,
    pub defined_channels: Vec<(u8, u8)>,
    pub defined_centers: Vec<Center>,
    pub hd_type: HdType,
    pub strategy: String,
    pub authority: Authority,
    /// "p_line/d_line Name/Name", e.g. "4/6 Opportunist/Role Model".
    pub profile: String,
    pub incarnation_cross: String,
    /// Solar-arc verification details.
    pub solar_arc: SolarArc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarArc {
    pub personality_sun_longitude: f64,
    pub design_sun_longitude: f64,
    pub arc_degrees: f64,
}
