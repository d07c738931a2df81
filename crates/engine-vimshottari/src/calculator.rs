//! Dasha timeline calculation
//!
//! The Vimshottari cycle spans 120 years across nine planetary periods.
//! The first Mahadasha is ruled by the lord of the Moon's birth nakshatra,
//! with only the unelapsed balance remaining: the fraction of the nakshatra
//! already traversed at birth is the fraction of the period already spent.
//! Sub-periods nest proportionally: each Antardasha lasts
//! `mahadasha_years · period(sub) / 120`, and Pratyantardashas subdivide
//! Antardashas the same way, each sequence starting from its parent planet.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The nine dasha lords in cycle order, with period lengths in years.
pub const DASHA_SEQUENCE: [(&str, f64); 9] = [
    ("Ketu", 7.0),
    ("Venus", 20.0),
    ("Sun", 6.0),
    ("Moon", 10.0),
    ("Mars", 7.0),
    ("Rahu", 18.0),
    ("Jupiter", 16.0),
    ("Saturn", 19.0),
    ("Mercury", 17.0),
];

/// Total cycle length in years.
pub const CYCLE_YEARS: f64 = 120.0;

const DAYS_PER_YEAR: f64 = 365.25;

/// One planetary period at any nesting depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashaPeriod {
    pub planet: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_years: f64,
}

impl DashaPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date < self.end_date
    }
}

fn add_years(date: NaiveDate, years: f64) -> NaiveDate {
    date + Duration::days((years * DAYS_PER_YEAR).round() as i64)
}

fn sequence_from(planet: &str) -> impl Iterator<Item = (&'static str, f64)> {
    let start = DASHA_SEQUENCE
        .iter()
        .position(|(name, _)| *name == planet)
        .unwrap_or(0);
    (0..9).map(move |i| DASHA_SEQUENCE[(start + i) % 9])
}

/// Build the Mahadasha timeline from birth.
///
/// Starts with the balance of the nakshatra lord's period
/// (`period · (1 − completed_fraction)`), then appends complete periods
/// until at least `CYCLE_YEARS` years are covered.
pub fn mahadasha_timeline(
    birth_date: NaiveDate,
    nakshatra_lord: &str,
    completed_fraction: f64,
) -> Vec<DashaPeriod> {
    let mut timeline = Vec::new();
    let mut cursor = birth_date;
    let mut covered = 0.0;

    for (i, (planet, full_years)) in sequence_from(nakshatra_lord).enumerate() {
        let years = if i == 0 {
            full_years * (1.0 - completed_fraction)
        } else {
            full_years
        };
        let end = add_years(cursor, years);
        timeline.push(DashaPeriod {
            planet: planet.to_string(),
            start_date: cursor,
            end_date: end,
            duration_years: years,
        });
        cursor = end;
        covered += years;
        if covered >= CYCLE_YEARS {
            break;
        }
    }

    // A second cycle keeps the timeline meaningful for long-lived charts.
    if covered < CYCLE_YEARS + 1.0 {
        for (planet, years) in sequence_from(nakshatra_lord).take(3) {
            let end = add_years(cursor, years);
            timeline.push(DashaPeriod {
                planet: planet.to_string(),
                start_date: cursor,
                end_date: end,
                duration_years: years,
            });
            cursor = end;
        }
    }

    timeline
}

/// Subdivide a parent period into nine nested sub-periods, the sequence
/// starting from the parent's own planet.
pub fn subdivide(parent: &DashaPeriod) -> Vec<DashaPeriod> {
    let mut periods = Vec::new();
    let mut cursor = parent.start_date;
    for (planet, years) in sequence_from(&parent.planet) {
        let sub_years = parent.duration_years * years / CYCLE_YEARS;
        let end = add_years(cursor, sub_years);
        periods.push(DashaPeriod {
            planet: planet.to_string(),
            start_date: cursor,
            end_date: end,
            duration_years: sub_years,
        });
        cursor = end;
    }
    // Rounding drift lands on the parent boundary.
    if let Some(last) = periods.last_mut() {
        last.end_date = parent.end_date;
    }
    periods
}

/// The currently running Mahadasha, Antardasha and Pratyantardasha.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentPeriods {
    pub mahadasha: DashaPeriod,
    pub antardasha: Option<DashaPeriod>,
    pub pratyantardasha: Option<DashaPeriod>,
}

pub fn current_periods(timeline: &[DashaPeriod], today: NaiveDate) -> Option<CurrentPeriods> {
    let mahadasha = timeline.iter().find(|p| p.contains(today))?.clone();
    let antardasha = subdivide(&mahadasha).into_iter().find(|p| p.contains(today));
    let pratyantardasha = antardasha
        .as_ref()
        .and_then(|a| subdivide(a).into_iter().find(|p| p.contains(today)));
    Some(CurrentPeriods {
        mahadasha,
        antardasha,
        pratyantardasha,
    })
}

/// Life theme of a dasha lord.
pub fn planet_theme(planet: &str) -> &'static str {
    match planet {
        "Ketu" => "Spiritual detachment, past-life completion, liberation",
        "Venus" => "Pleasure, relationships, creativity, material comfort",
        "Sun" => "Authority, vitality, recognition, soul purpose",
        "Moon" => "Emotions, nurturing, public life, inner tides",
        "Mars" => "Action, courage, conflict, disciplined drive",
        "Rahu" => "Ambition, obsession, worldly expansion, the unfamiliar",
        "Jupiter" => "Wisdom, growth, fortune, teaching",
        "Saturn" => "Discipline, karma, structure, endurance",
        "Mercury" => "Intellect, communication, commerce, adaptability",
        _ => "Transition",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sequence_totals_120_years() {
        let total: f64 = DASHA_SEQUENCE.iter().map(|(_, y)| y).sum();
        assert_eq!(total, CYCLE_YEARS);
    }

    #[test]
    fn first_period_carries_only_the_balance() {
        // Half of the nakshatra traversed: half of Venus's 20 years remain.
        let timeline = mahadasha_timeline(date(1990, 1, 1), "Venus", 0.5);
        assert_eq!(timeline[0].planet, "Venus");
        assert!((timeline[0].duration_years - 10.0).abs() < 1e-9);
        assert_eq!(timeline[1].planet, "Sun");
        assert!((timeline[1].duration_years - 6.0).abs() < 1e-9);
    }

    #[test]
    fn timeline_covers_at_least_120_years() {
        let timeline = mahadasha_timeline(date(1990, 1, 1), "Ketu", 0.25);
        let total: f64 = timeline.iter().map(|p| p.duration_years).sum();
        assert!(total >= CYCLE_YEARS);
        // Periods are contiguous.
        for pair in timeline.windows(2) {
            assert_eq!(pair[0].end_date, pair[1].start_date);
        }
    }

    #[test]
    fn subdivision_starts_from_parent_and_fills_it() {
        let parent = DashaPeriod {
            planet: "Jupiter".into(),
            start_date: date(2000, 1, 1),
            end_date: add_years(date(2000, 1, 1), 16.0),
            duration_years: 16.0,
        };
        let subs = subdivide(&parent);
        assert_eq!(subs.len(), 9);
        assert_eq!(subs[0].planet, "Jupiter");
        assert_eq!(subs[0].start_date, parent.start_date);
        assert_eq!(subs.last().unwrap().end_date, parent.end_date);
        // Jupiter's Antardasha inside Jupiter: 16 * 16/120 years.
        assert!((subs[0].duration_years - 16.0 * 16.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn current_periods_nest() {
        let timeline = mahadasha_timeline(date(1990, 5, 15), "Moon", 0.3);
        let today = date(2024, 1, 15);
        let current = current_periods(&timeline, today).unwrap();
        assert!(current.mahadasha.contains(today));
        let antar = current.antardasha.unwrap();
        assert!(antar.contains(today));
        assert!(antar.start_date >= current.mahadasha.start_date);
        assert!(antar.end_date <= current.mahadasha.end_date);
        let pratyantar = current.pratyantardasha.unwrap();
        assert!(pratyantar.contains(today));
    }

    #[test]
    fn date_outside_timeline_yields_none() {
        let timeline = mahadasha_timeline(date(1990, 1, 1), "Sun", 0.0);
        assert!(current_periods(&timeline, date(1980, 1, 1)).is_none());
    }
}
