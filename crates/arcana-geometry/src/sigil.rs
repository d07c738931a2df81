//! Sigil construction primitives
//!
//! The classical letter-elimination method: strip an intention down to its
//! unique letters (first occurrence wins), map each to its 1-based alphabet
//! position, place the positions on a circle, spiral or grid, and connect
//! them with line or curve elements. Small invariant circles decorate the
//! centre and selected endpoints.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::primitives::{Element, Point};

/// Layout used to place the letters of a sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigilLayout {
    Radial,
    Spiral,
    Grid,
}

/// How consecutive letter points are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStyle {
    Line,
    Curve,
}

/// A constructed sigil: the distilled letters, their placements, and the
/// drawable elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sigil {
    pub unique_letters: Vec<char>,
    /// 1-based alphabet positions of the unique letters.
    pub letter_numbers: Vec<u8>,
    pub layout: SigilLayout,
    pub points: Vec<Point>,
    pub elements: Vec<Element>,
}

/// Reduce an intention to its unique letters, preserving first occurrence.
/// Non-alphabetic characters are discarded.
pub fn distill_letters(intention: &str) -> Vec<char> {
    let mut seen = [false; 26];
    let mut out = Vec::new();
    for ch in intention.chars() {
        if ch.is_ascii_alphabetic() {
            let upper = ch.to_ascii_uppercase();
            let idx = (upper as u8 - b'A') as usize;
            if !seen[idx] {
                seen[idx] = true;
                out.push(upper);
            }
        }
    }
    out
}

/// 1-based alphabet position of an uppercase letter.
pub fn letter_number(ch: char) -> u8 {
    ch.to_ascii_uppercase() as u8 - b'A' + 1
}

fn place(letters: &[char], layout: SigilLayout, radius: f64) -> Vec<Point> {
    let center = Point::new(0.0, 0.0);
    let n = letters.len().max(1);

    match layout {
        SigilLayout::Radial => letters
            .iter()
            .map(|&ch| {
                // Angle from the alphabet position, radius fixed.
                let angle = 2.0 * PI * (letter_number(ch) as f64 - 1.0) / 26.0;
                center.polar(radius, angle)
            })
            .collect(),
        SigilLayout::Spiral => letters
            .iter()
            .enumerate()
            .map(|(i, &ch)| {
                let t = (i as f64 + 1.0) / n as f64;
                let angle = 2.0 * PI * (letter_number(ch) as f64 - 1.0) / 26.0 + t * PI;
                center.polar(radius * t, angle)
            })
            .collect(),
        SigilLayout::Grid => {
            let cols = (n as f64).sqrt().ceil() as usize;
            let step = 2.0 * radius / cols.max(1) as f64;
            letters
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    let (row, col) = (i / cols, i % cols);
                    Point::new(
                        -radius + step * (col as f64 + 0.5),
                        radius - step * (row as f64 + 0.5),
                    )
                })
                .collect()
        }
    }
}

fn connect(points: &[Point], style: ConnectionStyle) -> Vec<Element> {
    let mut elements = Vec::new();
    for pair in points.windows(2) {
        match style {
            ConnectionStyle::Line => {
                elements.push(Element::Line { from: pair[0], to: pair[1] });
            }
            ConnectionStyle::Curve => {
                // Quadratic bend through a midpoint pushed off-axis.
                let mid = Point::new(
                    (pair[0].x + pair[1].x) / 2.0 - (pair[1].y - pair[0].y) * 0.25,
                    (pair[0].y + pair[1].y) / 2.0 + (pair[1].x - pair[0].x) * 0.25,
                );
                let samples: Vec<Point> = (0..=8)
                    .map(|i| {
                        let t = i as f64 / 8.0;
                        let u = 1.0 - t;
                        Point::new(
                            u * u * pair[0].x + 2.0 * u * t * mid.x + t * t * pair[1].x,
                            u * u * pair[0].y + 2.0 * u * t * mid.y + t * t * pair[1].y,
                        )
                    })
                    .collect();
                elements.push(Element::Path { points: samples });
            }
        }
    }
    elements
}

/// Build a sigil from an intention.
pub fn forge(intention: &str, layout: SigilLayout, style: ConnectionStyle, radius: f64) -> Sigil {
    let unique_letters = distill_letters(intention);
    let letter_numbers = unique_letters.iter().map(|&c| letter_number(c)).collect();
    let points = place(&unique_letters, layout, radius);
    let mut elements = connect(&points, style);

    // Invariant decorations: centre circle plus endpoint markers.
    elements.push(Element::Circle { center: Point::new(0.0, 0.0), radius: radius * 0.05 });
    if let Some(first) = points.first() {
        elements.push(Element::Circle { center: *first, radius: radius * 0.03 });
    }
    if let Some(last) = points.last() {
        elements.push(Element::Circle { center: *last, radius: radius * 0.03 });
    }

    Sigil { unique_letters, letter_numbers, layout, points, elements }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distill_keeps_first_occurrence_order() {
        assert_eq!(distill_letters("ABUNDANCE"), vec!['A', 'B', 'U', 'N', 'D', 'C', 'E']);
        assert_eq!(distill_letters("I am calm"), vec!['I', 'A', 'M', 'C', 'L']);
        assert!(distill_letters("123 !!").is_empty());
    }

    #[test]
    fn letter_numbers_are_one_based() {
        assert_eq!(letter_number('A'), 1);
        assert_eq!(letter_number('Z'), 26);
        assert_eq!(letter_number('m'), 13);
    }

    #[test]
    fn forge_places_one_point_per_unique_letter() {
        let sigil = forge("MANIFEST", SigilLayout::Radial, ConnectionStyle::Line, 10.0);
        assert_eq!(sigil.unique_letters.len(), sigil.points.len());
        assert_eq!(sigil.letter_numbers.len(), sigil.points.len());
    }

    #[test]
    fn forge_connects_consecutive_points() {
        let sigil = forge("PEACE", SigilLayout::Radial, ConnectionStyle::Line, 10.0);
        // P,E,A,C -> 4 unique letters -> 3 connections + 3 decoration circles.
        let lines = sigil.elements.iter().filter(|e| matches!(e, Element::Line { .. })).count();
        assert_eq!(lines, 3);
        let circles = sigil.elements.iter().filter(|e| matches!(e, Element::Circle { .. })).count();
        assert_eq!(circles, 3);
    }

    #[test]
    fn curve_style_emits_paths() {
        let sigil = forge("PEACE", SigilLayout::Spiral, ConnectionStyle::Curve, 10.0);
        assert!(sigil.elements.iter().any(|e| matches!(e, Element::Path { .. })));
    }

    #[test]
    fn grid_layout_fits_within_bounds() {
        let sigil = forge("TRANSFORMATION", SigilLayout::Grid, ConnectionStyle::Line, 5.0);
        for p in &sigil.points {
            assert!(p.x.abs() <= 5.0 && p.y.abs() <= 5.0);
        }
    }

    #[test]
    fn deterministic_for_same_intention() {
        let a = forge("CLARITY", SigilLayout::Radial, ConnectionStyle::Line, 10.0);
        let b = forge("CLARITY", SigilLayout::Radial, ConnectionStyle::Line, 10.0);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
