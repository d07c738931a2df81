//! Julian Day conversion
//!
//! Pure Gregorian-calendar conversion between `DateTime<Utc>` and Julian
//! Day Numbers. Local birth times must be converted to UTC before entering
//! this module (see `arcana_core::BirthData::to_utc`).

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

/// JD of the J2000.0 epoch (2000-01-01 12:00:00 UTC).
pub const J2000: f64 = 2451545.0;

/// Convert a UTC datetime to a Julian Day Number using the Gregorian
/// calendar formula.
pub fn julian_day(dt: &DateTime<Utc>) -> f64 {
    let (mut year, mut month) = (dt.year() as f64, dt.month() as f64);
    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }

    let day = dt.day() as f64
        + (dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0) / 24.0;

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + day + b - 1524.5
}

/// Convert a Julian Day Number back to a UTC datetime.
///
/// Offsets from the J2000 epoch in milliseconds; sub-millisecond residue is
/// irrelevant at the precision the engines need.
pub fn julian_day_to_datetime(jd: f64) -> DateTime<Utc> {
    let base = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
    base + Duration::milliseconds(((jd - J2000) * 86_400_000.0).round() as i64)
}

/// Days elapsed since J2000.0.
pub fn days_since_j2000(jd: f64) -> f64 {
    jd - J2000
}
