//! Design time calculation -- the 88° solar arc
//!
//! The design instant is the unique earlier time at which the Sun's
//! ecliptic longitude was exactly 88° behind its birth longitude (mod 360).
//! This is NOT a simple 88-day subtraction: the Sun's apparent speed varies
//! over the year, so the instant is located by binary search against the
//! ephemeris facade.

use arcana_core::EngineError;
use serde::{Deserialize, Serialize};

use crate::ephemeris::Ephemeris;

/// Solar arc between birth and design, in degrees.
pub const DESIGN_ARC_DEGREES: f64 = 88.0;

/// Convergence tolerance in degrees (~1.4 minutes of time for the Sun).
const TOLERANCE_DEGREES: f64 = 0.001;

/// Interval floor in Julian days (~8 seconds).
const MIN_INTERVAL_DAYS: f64 = 0.0001;

const MAX_ITERATIONS: usize = 50;

/// Result of the design-time search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DesignTime {
    /// Julian day of the design instant.
    pub jd: f64,
    /// Sun longitude the search was aiming for.
    pub target_sun_longitude: f64,
    /// False when the search fell back to `birth - 88 days`.
    pub converged: bool,
}

/// Signed wrap-safe difference between two longitudes, in (-180, 180].
pub fn longitude_difference(target: f64, current: f64) -> f64 {
    (target - current + 180.0).rem_euclid(360.0) - 180.0
}

/// Locate the design instant for a birth Julian day.
///
/// Searches the interval `[birth_jd - 100 d, birth_jd - 80 d]` for the
/// moment the Sun sat at `birth_longitude - 88°` (mod 360). Converges when
/// the longitude difference drops below 0.001° or the interval narrows to
/// ~8 seconds; if neither happens within the iteration budget, falls back
/// to `birth_jd - 88` with `converged = false`.
pub fn find_design_time(eph: &dyn Ephemeris, birth_jd: f64) -> Result<DesignTime, EngineError> {
    let birth_longitude = eph.sun_longitude(birth_jd)?;
    let target = (birth_longitude - DESIGN_ARC_DEGREES).rem_euclid(360.0);

    let mut lower = birth_jd - 100.0;
    let mut upper = birth_jd - 80.0;

    for _ in 0..MAX_ITERATIONS {
        let mid = (lower + upper) / 2.0;
        let current = eph.sun_longitude(mid)?;
        let diff = longitude_difference(target, current);

        if diff.abs() < TOLERANCE_DEGREES {
            return Ok(DesignTime {
                jd: mid,
                target_sun_longitude: target,
                converged: true,
            });
        }

        // The Sun moves forward in time, so a positive difference means the
        // target longitude lies later in the interval.
        if diff > 0.0 {
            lower = mid;
        } else {
            upper = mid;
        }

        if (upper - lower).abs() < MIN_INTERVAL_DAYS {
            break;
        }
    }

    // Fallback: 88 calendar days before birth.
    Ok(DesignTime {
        jd: birth_jd - 88.0,
        target_sun_longitude: target,
        converged: false,
    })
}
