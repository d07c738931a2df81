//! Nakshatra mapping
//!
//! The 27 Vedic lunar mansions, each spanning 360/27 = 13.333…° of the
//! sidereal zodiac and divided into 4 padas. Names and ruling planets are
//! loaded from `data/nakshatras.json` and shape-asserted at first use (27
//! entries, lords repeating the nine-planet Vimshottari cycle).

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Width of one nakshatra in degrees.
pub const NAKSHATRA_SIZE: f64 = 360.0 / 27.0;

const NAKSHATRA_JSON: &str = include_str!("../data/nakshatras.json");

#[derive(Debug, Clone, Deserialize)]
struct NakshatraEntry {
    name: String,
    lord: String,
}

fn table() -> &'static [NakshatraEntry] {
    static TABLE: OnceLock<Vec<NakshatraEntry>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let entries: Vec<NakshatraEntry> =
            serde_json::from_str(NAKSHATRA_JSON).expect("nakshatras.json is malformed");
        assert_eq!(entries.len(), 27, "nakshatra table must list 27 mansions");
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(
                entry.lord,
                entries[i % 9].lord,
                "lords must repeat the nine-planet cycle"
            );
        }
        entries
    })
}

/// Position of the Moon (or any longitude) within the nakshatra wheel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NakshatraPosition {
    /// Index into the 27-mansion wheel, 0-26.
    pub index: usize,
    pub name: String,
    /// Ruling planet (Vimshottari lord).
    pub lord: String,
    /// Quarter of the nakshatra, 1-4.
    pub pada: u8,
    /// Degrees travelled into this nakshatra, [0, 13.333…).
    pub degrees_in_nakshatra: f64,
    /// The input longitude, normalised to [0, 360).
    pub longitude: f64,
}

impl NakshatraPosition {
    /// Fraction of this nakshatra already traversed, [0, 1).
    pub fn completed_fraction(&self) -> f64 {
        self.degrees_in_nakshatra / NAKSHATRA_SIZE
    }
}

/// Map a sidereal longitude to its nakshatra.
pub fn nakshatra_for(longitude: f64) -> NakshatraPosition {
    let normalised = longitude.rem_euclid(360.0);
    let index = ((normalised / NAKSHATRA_SIZE).floor() as usize).min(26);
    let degrees_in = normalised % NAKSHATRA_SIZE;
    let pada = ((degrees_in / (NAKSHATRA_SIZE / 4.0)).floor() as u8 + 1).clamp(1, 4);

    let entry = &table()[index];
    NakshatraPosition {
        index,
        name: entry.name.clone(),
        lord: entry.lord.clone(),
        pada,
        degrees_in_nakshatra: degrees_in,
        longitude: normalised,
    }
}

/// All 27 nakshatra names in wheel order.
pub fn nakshatra_names() -> Vec<String> {
    table().iter().map(|e| e.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_mansions() {
        let first = nakshatra_for(0.0);
        assert_eq!(first.name, "Ashwini");
        assert_eq!(first.lord, "Ketu");
        assert_eq!(first.pada, 1);

        let last = nakshatra_for(359.9);
        assert_eq!(last.name, "Revati");
        assert_eq!(last.lord, "Mercury");
        assert_eq!(last.pada, 4);
    }

    #[test]
    fn pada_boundaries() {
        // One pada is 13.333/4 = 3.333…°
        assert_eq!(nakshatra_for(0.0).pada, 1);
        assert_eq!(nakshatra_for(3.4).pada, 2);
        assert_eq!(nakshatra_for(6.7).pada, 3);
        assert_eq!(nakshatra_for(10.1).pada, 4);
        assert_eq!(nakshatra_for(13.34).pada, 1); // next mansion
    }

    #[test]
    fn degrees_in_nakshatra_is_residue() {
        let pos = nakshatra_for(20.0);
        assert_eq!(pos.index, 1); // Bharani
        assert!((pos.degrees_in_nakshatra - (20.0 - NAKSHATRA_SIZE)).abs() < 1e-9);
        assert!((0.0..1.0).contains(&pos.completed_fraction()));
    }

    #[test]
    fn lords_repeat_every_nine() {
        for i in 0..27 {
            let a = nakshatra_for(i as f64 * NAKSHATRA_SIZE + 1.0);
            let b = nakshatra_for(((i + 9) % 27) as f64 * NAKSHATRA_SIZE + 1.0);
            assert_eq!(a.lord, b.lord);
        }
    }

    #[test]
    fn longitude_normalises() {
        assert_eq!(nakshatra_for(370.0).index, nakshatra_for(10.0).index);
        assert_eq!(nakshatra_for(-350.0).index, nakshatra_for(10.0).index);
    }
}
