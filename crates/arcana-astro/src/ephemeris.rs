//! Ephemeris facade
//!
//! All planetary-position lookups go through the [`Ephemeris`] trait so the
//! rest of the platform never touches an astronomical library directly. Two
//! implementations are provided:
//!
//! - [`NativeEphemeris`] -- an analytic backend built on mean orbital
//!   elements. No external data files, deterministic, accurate to a few
//!   tenths of a degree for the Sun and Moon and a few degrees for the outer
//!   planets; sufficient for wheel/nakshatra indexing and for tests.
//! - `SwissEphemeris` (behind the `swiss-ephemeris` feature) -- a thin
//!   wrapper over the Swiss Ephemeris for research-grade precision.
//!
//! Sidereal mode subtracts the Lahiri ayanamsa from the tropical longitude.

use std::collections::BTreeMap;

use arcana_core::EngineError;
use serde::{Deserialize, Serialize};

use crate::julian::days_since_j2000;

// ---------------------------------------------------------------------------
// Bodies and zodiac modes
// ---------------------------------------------------------------------------

/// Celestial bodies the platform computes positions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    NorthNode,
    SouthNode,
    /// Geocentric Earth: always opposite the Sun.
    Earth,
}

impl Body {
    /// The thirteen bodies used for a Human Design chart.
    pub const CHART_BODIES: [Body; 13] = [
        Body::Sun,
        Body::Earth,
        Body::Moon,
        Body::NorthNode,
        Body::SouthNode,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
            Body::NorthNode => "north_node",
            Body::SouthNode => "south_node",
            Body::Earth => "earth",
        }
    }
}

/// Zodiac reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zodiac {
    Tropical,
    Sidereal,
}

/// Geocentric position of one body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    /// Ecliptic longitude, normalised to [0, 360).
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub distance_au: f64,
    pub longitude_speed_deg_per_day: f64,
    pub latitude_speed_deg_per_day: f64,
}

// ---------------------------------------------------------------------------
// The facade
// ---------------------------------------------------------------------------

/// Single seam between the platform and any astronomical library.
pub trait Ephemeris: Send + Sync {
    /// Geocentric position of one body at a Julian Day.
    fn position(&self, jd: f64, body: Body, zodiac: Zodiac) -> Result<Position, EngineError>;

    /// Positions for a set of bodies, keyed by body.
    fn positions_at(
        &self,
        jd: f64,
        bodies: &[Body],
        zodiac: Zodiac,
    ) -> Result<BTreeMap<Body, Position>, EngineError> {
        let mut out = BTreeMap::new();
        for &body in bodies {
            out.insert(body, self.position(jd, body, zodiac)?);
        }
        Ok(out)
    }

    /// Tropical Sun longitude, the quantity the 88° design search needs.
    fn sun_longitude(&self, jd: f64) -> Result<f64, EngineError> {
        Ok(self.position(jd, Body::Sun, Zodiac::Tropical)?.longitude_deg)
    }
}

/// Lahiri ayanamsa in degrees at a Julian Day.
///
/// Linear model anchored at J2000 (23.85°) with the standard precession
/// rate of 50.2888 arcseconds per Julian year.
pub fn lahiri_ayanamsa(jd: f64) -> f64 {
    23.85 + days_since_j2000(jd) / 365.25 * (50.2888 / 3600.0)
}

// ---------------------------------------------------------------------------
// Native analytic backend
// ---------------------------------------------------------------------------

/// Mean orbital elements: semi-major axis (AU), mean longitude at J2000
/// (deg), mean daily motion (deg/day).
struct MeanElements {
    a: f64,
    l0: f64,
    n: f64,
}

fn elements(body: Body) -> MeanElements {
    match body {
        Body::Mercury => MeanElements { a: 0.387098, l0: 252.250906, n: 4.092338796 },
        Body::Venus => MeanElements { a: 0.723330, l0: 181.979801, n: 1.602130224 },
        Body::Mars => MeanElements { a: 1.523679, l0: 355.433000, n: 0.524071086 },
        Body::Jupiter => MeanElements { a: 5.202603, l0: 34.351519, n: 0.083129439 },
        Body::Saturn => MeanElements { a: 9.554909, l0: 50.077444, n: 0.033497907 },
        Body::Uranus => MeanElements { a: 19.218446, l0: 314.055005, n: 0.011769036 },
        Body::Neptune => MeanElements { a: 30.110387, l0: 304.348665, n: 0.006020077 },
        Body::Pluto => MeanElements { a: 39.482117, l0: 238.958116, n: 0.003976776 },
        // Earth's heliocentric elements, used for the geocentric transform.
        _ => MeanElements { a: 1.000001, l0: 100.466457, n: 0.985609101 },
    }
}

/// Analytic ephemeris backend built on mean orbital elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEphemeris;

impl NativeEphemeris {
    pub fn new() -> Self {
        Self
    }

    /// Apparent tropical Sun longitude: mean longitude plus the equation of
    /// center.
    fn sun_tropical(jd: f64) -> f64 {
        let d = days_since_j2000(jd);
        let mean_long = 280.46646 + 0.98564736 * d;
        let mean_anom = (357.52911 + 0.98560028 * d).to_radians();
        let center = 1.914602 * mean_anom.sin() + 0.019993 * (2.0 * mean_anom).sin();
        (mean_long + center).rem_euclid(360.0)
    }

    /// Tropical Moon longitude with the three largest periodic terms
    /// (evection, variation, annual equation are folded into the first two).
    fn moon_tropical(jd: f64) -> f64 {
        let d = days_since_j2000(jd);
        let mean_long = 218.3164477 + 13.17639648 * d;
        let mean_anom = (134.9633964 + 13.06499295 * d).to_radians();
        let elongation = (297.8501921 + 12.19074912 * d).to_radians();
        let lon = mean_long
            + 6.288774 * mean_anom.sin()
            + 1.274027 * (2.0 * elongation - mean_anom).sin()
            + 0.658314 * (2.0 * elongation).sin()
            + 0.213618 * (2.0 * mean_anom).sin();
        lon.rem_euclid(360.0)
    }

    fn moon_latitude(jd: f64) -> f64 {
        let d = days_since_j2000(jd);
        let arg_lat = (93.2720950 + 13.22935024 * d).to_radians();
        5.128122 * arg_lat.sin()
    }

    /// Mean lunar ascending node; retrograde.
    fn node_tropical(jd: f64) -> f64 {
        let d = days_since_j2000(jd);
        (125.0445479 - 0.05295377 * d).rem_euclid(360.0)
    }

    /// Geocentric longitude of a planet from circular heliocentric orbits of
    /// the planet and the Earth.
    fn planet_tropical(jd: f64, body: Body) -> (f64, f64) {
        let d = days_since_j2000(jd);
        let p = elements(body);
        let e = elements(Body::Earth);

        let lp = (p.l0 + p.n * d).to_radians();
        let le = (e.l0 + e.n * d).to_radians();

        let (px, py) = (p.a * lp.cos(), p.a * lp.sin());
        let (ex, ey) = (e.a * le.cos(), e.a * le.sin());

        let (gx, gy) = (px - ex, py - ey);
        let lon = gy.atan2(gx).to_degrees().rem_euclid(360.0);
        let dist = (gx * gx + gy * gy).sqrt();
        (lon, dist)
    }

    fn tropical_longitude(jd: f64, body: Body) -> (f64, f64, f64) {
        match body {
            Body::Sun => (Self::sun_tropical(jd), 0.0, 1.0),
            Body::Earth => ((Self::sun_tropical(jd) + 180.0).rem_euclid(360.0), 0.0, 1.0),
            Body::Moon => (Self::moon_tropical(jd), Self::moon_latitude(jd), 0.00257),
            Body::NorthNode => (Self::node_tropical(jd), 0.0, 0.00257),
            Body::SouthNode => ((Self::node_tropical(jd) + 180.0).rem_euclid(360.0), 0.0, 0.00257),
            _ => {
                let (lon, dist) = Self::planet_tropical(jd, body);
                (lon, 0.0, dist)
            }
        }
    }
}

impl Ephemeris for NativeEphemeris {
    fn position(&self, jd: f64, body: Body, zodiac: Zodiac) -> Result<Position, EngineError> {
        let (lon, lat, dist) = Self::tropical_longitude(jd, body);
        let (lon_before, lat_before, _) = Self::tropical_longitude(jd - 0.5, body);
        let (lon_after, lat_after, _) = Self::tropical_longitude(jd + 0.5, body);

        // Wrap-safe central difference over one day.
        let lon_speed = ((lon_after - lon_before + 540.0).rem_euclid(360.0)) - 180.0;
        let lat_speed = lat_after - lat_before;

        let longitude = match zodiac {
            Zodiac::Tropical => lon,
            Zodiac::Sidereal => (lon - lahiri_ayanamsa(jd)).rem_euclid(360.0),
        };

        Ok(Position {
            longitude_deg: longitude,
            latitude_deg: lat,
            distance_au: dist,
            longitude_speed_deg_per_day: lon_speed,
            latitude_speed_deg_per_day: lat_speed,
        })
    }
}

// ---------------------------------------------------------------------------
// Swiss Ephemeris backend (optional)
// ---------------------------------------------------------------------------

#[cfg(feature = "swiss-ephemeris")]
pub mod swiss {
    use super::*;

    // SEFLG_SPEED | SEFLG_SWIEPH
    const FLAGS: i32 = 258;

    fn body_id(body: Body) -> Option<u32> {
        match body {
            Body::Sun => Some(0),
            Body::Moon => Some(1),
            Body::Mercury => Some(2),
            Body::Venus => Some(3),
            Body::Mars => Some(4),
            Body::Jupiter => Some(5),
            Body::Saturn => Some(6),
            Body::Uranus => Some(7),
            Body::Neptune => Some(8),
            Body::Pluto => Some(9),
            Body::NorthNode => Some(10),
            // Earth and South Node are derived as opposites.
            Body::Earth | Body::SouthNode => None,
        }
    }

    /// Swiss Ephemeris wrapper. Constructing it sets the ephemeris data
    /// path process-wide.
    pub struct SwissEphemeris {
        data_path: String,
    }

    impl SwissEphemeris {
        pub fn new(data_path: impl Into<String>) -> Self {
            let data_path = data_path.into();
            swisseph::swe::set_ephe_path(&data_path);
            Self { data_path }
        }

        pub fn data_path(&self) -> &str {
            &self.data_path
        }

        fn raw_position(&self, jd: f64, body: Body) -> Result<Position, EngineError> {
            if body == Body::Earth {
                let sun = self.raw_position(jd, Body::Sun)?;
                return Ok(Position {
                    longitude_deg: (sun.longitude_deg + 180.0).rem_euclid(360.0),
                    latitude_deg: -sun.latitude_deg,
                    distance_au: sun.distance_au,
                    longitude_speed_deg_per_day: sun.longitude_speed_deg_per_day,
                    latitude_speed_deg_per_day: -sun.latitude_speed_deg_per_day,
                });
            }
            if body == Body::SouthNode {
                let node = self.raw_position(jd, Body::NorthNode)?;
                return Ok(Position {
                    longitude_deg: (node.longitude_deg + 180.0).rem_euclid(360.0),
                    latitude_deg: -node.latitude_deg,
                    distance_au: node.distance_au,
                    longitude_speed_deg_per_day: node.longitude_speed_deg_per_day,
                    latitude_speed_deg_per_day: -node.latitude_speed_deg_per_day,
                });
            }

            let id = body_id(body).expect("derived bodies handled above");
            match swisseph::swe::calc_ut(jd, id, FLAGS) {
                Ok(result) => Ok(Position {
                    longitude_deg: result.out[0].rem_euclid(360.0),
                    latitude_deg: result.out[1],
                    distance_au: result.out[2],
                    longitude_speed_deg_per_day: result.out[3],
                    latitude_speed_deg_per_day: result.out[4],
                }),
                Err(e) => Err(EngineError::DependencyUnavailable(format!(
                    "Swiss Ephemeris failed for {:?}: {:?}",
                    body, e
                ))),
            }
        }
    }

    impl Ephemeris for SwissEphemeris {
        fn position(&self, jd: f64, body: Body, zodiac: Zodiac) -> Result<Position, EngineError> {
            let mut pos = self.raw_position(jd, body)?;
            if zodiac == Zodiac::Sidereal {
                pos.longitude_deg = (pos.longitude_deg - lahiri_ayanamsa(jd)).rem_euclid(360.0);
            }
            Ok(pos)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::julian::julian_day;
    use chrono::{TimeZone, Utc};

    #[test]
    fn sun_longitude_near_280_at_j2000() {
        let eph = NativeEphemeris::new();
        let jd = julian_day(&Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap());
        let lon = eph.sun_longitude(jd).unwrap();
        assert!((lon - 280.0).abs() < 2.0, "got {}", lon);
    }

    #[test]
    fn all_chart_bodies_in_range() {
        let eph = NativeEphemeris::new();
        let jd = julian_day(&Utc.with_ymd_and_hms(1991, 8, 13, 8, 1, 0).unwrap());
        let positions = eph.positions_at(jd, &Body::CHART_BODIES, Zodiac::Tropical).unwrap();
        assert_eq!(positions.len(), 13);
        for (body, pos) in &positions {
            assert!(
                (0.0..360.0).contains(&pos.longitude_deg),
                "{:?} longitude out of range: {}",
                body,
                pos.longitude_deg
            );
        }
    }

    #[test]
    fn earth_opposite_sun() {
        let eph = NativeEphemeris::new();
        let jd = 2448481.83;
        let sun = eph.position(jd, Body::Sun, Zodiac::Tropical).unwrap();
        let earth = eph.position(jd, Body::Earth, Zodiac::Tropical).unwrap();
        let diff = (earth.longitude_deg - sun.longitude_deg).rem_euclid(360.0);
        assert!((diff - 180.0).abs() < 1e-9);
    }

    #[test]
    fn south_node_opposite_north_node() {
        let eph = NativeEphemeris::new();
        let jd = 2451545.0;
        let north = eph.position(jd, Body::NorthNode, Zodiac::Tropical).unwrap();
        let south = eph.position(jd, Body::SouthNode, Zodiac::Tropical).unwrap();
        let diff = (north.longitude_deg - south.longitude_deg).rem_euclid(360.0);
        assert!((diff - 180.0).abs() < 0.1);
    }

    #[test]
    fn sun_moves_forward_about_one_degree_per_day() {
        let eph = NativeEphemeris::new();
        let pos = eph.position(2451545.0, Body::Sun, Zodiac::Tropical).unwrap();
        assert!((pos.longitude_speed_deg_per_day - 0.9856).abs() < 0.05);
    }

    #[test]
    fn sidereal_is_tropical_minus_ayanamsa() {
        let eph = NativeEphemeris::new();
        let jd = 2451545.0;
        let trop = eph.position(jd, Body::Moon, Zodiac::Tropical).unwrap();
        let sid = eph.position(jd, Body::Moon, Zodiac::Sidereal).unwrap();
        let diff = (trop.longitude_deg - sid.longitude_deg).rem_euclid(360.0);
        assert!((diff - lahiri_ayanamsa(jd)).abs() < 1e-9);
    }

    #[test]
    fn lahiri_ayanamsa_at_j2000() {
        assert!((lahiri_ayanamsa(2451545.0) - 23.85).abs() < 1e-9);
        // Drifts about 0.014°/year forward.
        assert!(lahiri_ayanamsa(2451545.0 + 3652.5) > 23.98);
    }
}
