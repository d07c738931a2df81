//! Arcana Astro -- Astronomy primitives for the divination engines
//!
//! Julian-day conversion, a planetary-position facade with analytic and
//! Swiss Ephemeris backends, sidereal (Lahiri) mode, nakshatra mapping, the
//! Human Design wheel, and the 88°-solar-arc design-time search. Several
//! engines (Human Design, Gene Keys, Vimshottari, VedicClock-TCM) sit on
//! top of this crate; none of them talk to an astronomical library directly.

pub mod design_time;
pub mod ephemeris;
pub mod julian;
pub mod nakshatra;
pub mod wheel;

pub use design_time::{find_design_time, longitude_difference, DesignTime, DESIGN_ARC_DEGREES};
pub use ephemeris::{lahiri_ayanamsa, Body, Ephemeris, NativeEphemeris, Position, Zodiac};
pub use julian::{julian_day, julian_day_to_datetime, J2000};
pub use nakshatra::{nakshatra_for, nakshatra_names, NakshatraPosition, NAKSHATRA_SIZE};
pub use wheel::{gate_for, gate_sequence, longitude_for_gate, GateActivation, Role};

#[cfg(feature = "swiss-ephemeris")]
pub use ephemeris::swiss::SwissEphemeris;
