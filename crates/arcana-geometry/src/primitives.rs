//! Geometric building blocks
//!
//! Everything in this crate describes geometry; nothing renders it. Image
//! synthesis is a presentation-layer concern outside the core.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The golden ratio, φ.
pub const PHI: f64 = 1.618033988749895;

/// A point in the unit plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at a polar offset from this one.
    pub fn polar(&self, radius: f64, angle_rad: f64) -> Point {
        Point::new(self.x + radius * angle_rad.cos(), self.y + radius * angle_rad.sin())
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A point in three dimensions, for Platonic solids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One element of a geometric description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Circle {
        center: Point,
        radius: f64,
    },
    Line {
        from: Point,
        to: Point,
    },
    Polygon {
        vertices: Vec<Point>,
    },
    /// A sampled curve (spirals, arcs).
    Path {
        points: Vec<Point>,
    },
}

/// Vertices of a regular polygon centred at `center`.
pub fn regular_polygon(center: Point, radius: f64, sides: usize, rotation_rad: f64) -> Vec<Point> {
    (0..sides)
        .map(|i| center.polar(radius, rotation_rad + 2.0 * PI * i as f64 / sides as f64))
        .collect()
}

/// Sampled points of a golden (logarithmic) spiral.
///
/// The radius grows by a factor of φ per quarter turn, the defining property
/// of the golden spiral.
pub fn golden_spiral(center: Point, start_radius: f64, turns: usize, samples_per_turn: usize) -> Vec<Point> {
    let growth = PHI.ln() / (PI / 2.0);
    let total = turns * samples_per_turn;
    (0..=total)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / samples_per_turn as f64;
            let radius = start_radius * (growth * theta).exp();
            center.polar(radius, theta)
        })
        .collect()
}
