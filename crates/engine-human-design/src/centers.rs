//! Channel table and center definition logic
//!
//! The 36 channels of the bodygraph, each joining two gates across two
//! centers. A channel is defined when both of its gates are activated
//! anywhere in the chart (personality or design); a center is defined when
//! any of its channels is.

use std::collections::BTreeSet;

use crate::models::{Center, Channel};

/// The 36 channels of the bodygraph.
pub const CHANNELS: [Channel; 36] = [
    Channel { gates: (1, 8), centers: (Center::G, Center::Throat), name: "Inspiration" },
    Channel { gates: (2, 14), centers: (Center::G, Center::Sacral), name: "The Beat" },
    Channel { gates: (3, 60), centers: (Center::Sacral, Center::Root), name: "Mutation" },
    Channel { gates: (4, 63), centers: (Center::Ajna, Center::Head), name: "Logic" },
    Channel { gates: (5, 15), centers: (Center::Sacral, Center::G), name: "Rhythm" },
    Channel { gates: (6, 59), centers: (Center::SolarPlexus, Center::Sacral), name: "Mating" },
    Channel { gates: (7, 31), centers: (Center::G, Center::Throat), name: "The Alpha" },
    Channel { gates: (9, 52), centers: (Center::Sacral, Center::Root), name: "Concentration" },
    Channel { gates: (10, 20), centers: (Center::G, Center::Throat), name: "Awakening" },
    Channel { gates: (10, 34), centers: (Center::G, Center::Sacral), name: "Exploration" },
    Channel { gates: (10, 57), centers: (Center::G, Center::Spleen), name: "Perfected Form" },
    Channel { gates: (11, 56), centers: (Center::Ajna, Center::Throat), name: "Curiosity" },
    Channel { gates: (12, 22), centers: (Center::Throat, Center::SolarPlexus), name: "Openness" },
    Channel { gates: (13, 33), centers: (Center::G, Center::Throat), name: "The Prodigal" },
    Channel { gates: (16, 48), centers: (Center::Throat, Center::Spleen), name: "The Wavelength" },
    Channel { gates: (17, 62), centers: (Center::Ajna, Center::Throat), name: "Acceptance" },
    Channel { gates: (18, 58), centers: (Center::Spleen, Center::Root), name: "Judgment" },
    Channel { gates: (19, 49), centers: (Center::Root, Center::SolarPlexus), name: "Synthesis" },
    Channel { gates: (20, 34), centers: (Center::Throat, Center::Sacral), name: "Charisma" },
    Channel { gates: (20, 57), centers: (Center::Throat, Center::Spleen), name: "The Brainwave" },
    Channel { gates: (21, 45), centers: (Center::Heart, Center::Throat), name: "Money" },
    Channel { gates: (23, 43), centers: (Center::Throat, Center::Ajna), name: "Structuring" },
    Channel { gates: (24, 61), centers: (Center::Ajna, Center::Head), name: "Awareness" },
    Channel { gates: (25, 51), centers: (Center::G, Center::Heart), name: "Initiation" },
    Channel { gates: (26, 44), centers: (Center::Heart, Center::Spleen), name: "Surrender" },
    Channel { gates: (27, 50), centers: (Center::Sacral, Center::Spleen), name: "Preservation" },
    Channel { gates: (28, 38), centers: (Center::Spleen, Center::Root), name: "Struggle" },
    Channel { gates: (29, 46), centers: (Center::Sacral, Center::G), name: "Discovery" },
    Channel { gates: (30, 41), centers: (Center::SolarPlexus, Center::Root), name: "Recognition" },
    Channel { gates: (32, 54), centers: (Center::Spleen, Center::Root), name: "Transformation" },
    Channel { gates: (35, 36), centers: (Center::Throat, Center::SolarPlexus), name: "Transitoriness" },
    Channel { gates: (37, 40), centers: (Center::SolarPlexus, Center::Heart), name: "Community" },
    Channel { gates: (39, 55), centers: (Center::Root, Center::SolarPlexus), name: "Emoting" },
    Channel { gates: (42, 53), centers: (Center::Sacral, Center::Root), name: "Maturation" },
    Channel { gates: (47, 64), centers: (Center::Ajna, Center::Head), name: "Abstraction" },
    Channel { gates: (6, 59), centers: (Center::SolarPlexus, Center::Sacral), name: "Intimacy" },
];

/// Channels whose gates are both activated.
pub fn defined_channels(activated_gates: &BTreeSet<u8>) -> Vec<Channel> {
    let mut seen = BTreeSet::new();
    CHANNELS
        .iter()
        .filter(|c| activated_gates.contains(&c.gates.0) && activated_gates.contains(&c.gates.1))
        .filter(|c| seen.insert(c.gates))
        .copied()
        .collect()
}

/// Centers defined by the given channels.
pub fn defined_centers(channels: &[Channel]) -> Vec<Center> {
    let mut centers = BTreeSet::new();
    for channel in channels {
        centers.insert(channel.centers.0);
        centers.insert(channel.centers.1);
    }
    centers.into_iter().collect()
}

/// Whether a defined-channel path connects any motor center to the Throat.
///
/// Walks the graph whose nodes are defined centers and whose edges are the
/// defined channels, so indirect motor-to-Throat paths count.
pub fn motor_to_throat(channels: &[Channel]) -> bool {
    let mut frontier: Vec<Center> = defined_centers(channels)
        .into_iter()
        .filter(|c| c.is_motor())
        .collect();
    let mut visited: BTreeSet<Center> = frontier.iter().copied().collect();

    while let Some(center) = frontier.pop() {
        if center == Center::Throat {
            return true;
        }
        for channel in channels {
            let next = if channel.centers.0 == center {
                Some(channel.centers.1)
            } else if channel.centers.1 == center {
                Some(channel.centers.0)
            } else {
                None
            };
            if let Some(next) = next {
                if visited.insert(next) {
                    frontier.push(next);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates(list: &[u8]) -> BTreeSet<u8> {
        list.iter().copied().collect()
    }

    #[test]
    fn every_gate_appears_in_some_channel() {
        let mut covered = BTreeSet::new();
        for channel in CHANNELS {
            covered.insert(channel.gates.0);
            covered.insert(channel.gates.1);
        }
        for gate in 1..=64u8 {
            assert!(covered.contains(&gate), "gate {} not in any channel", gate);
        }
    }

    #[test]
    fn channel_defined_only_with_both_gates() {
        assert!(defined_channels(&gates(&[1])).is_empty());
        let defined = defined_channels(&gates(&[1, 8]));
        assert_eq!(defined.len(), 1);
        assert_eq!(defined[0].gates, (1, 8));
    }

    #[test]
    fn duplicate_channel_rows_counted_once() {
        // 6-59 appears twice in the table under different names.
        let defined = defined_channels(&gates(&[6, 59]));
        assert_eq!(defined.len(), 1);
    }

    #[test]
    fn centers_from_channels() {
        let defined = defined_channels(&gates(&[34, 20]));
        let centers = defined_centers(&defined);
        assert!(centers.contains(&Center::Throat));
        assert!(centers.contains(&Center::Sacral));
    }

    #[test]
    fn direct_motor_to_throat() {
        // 20-34: Sacral (motor) to Throat.
        let defined = defined_channels(&gates(&[20, 34]));
        assert!(motor_to_throat(&defined));
    }

    #[test]
    fn indirect_motor_to_throat() {
        // Root -> SolarPlexus (19-49) and SolarPlexus -> Throat (35-36).
        let defined = defined_channels(&gates(&[19, 49, 35, 36]));
        assert!(motor_to_throat(&defined));
    }

    #[test]
    fn no_motor_to_throat_without_motor() {
        // 4-63: Ajna-Head only.
        let defined = defined_channels(&gates(&[4, 63]));
        assert!(!motor_to_throat(&defined));
        // 1-8: G to Throat, but G is not a motor.
        let defined = defined_channels(&gates(&[1, 8]));
        assert!(!motor_to_throat(&defined));
    }
}
