//! Sacred-geometry pattern generators
//!
//! Each generator returns a [`Pattern`]: a list of elements plus the sacred
//! ratios present. Parameters mirror the classical constructions (petal and
//! layer counts for mandalas, layer count for the Flower of Life, turn count
//! for the golden spiral).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::primitives::{golden_spiral, regular_polygon, Element, Point, Point3, PHI};

/// A complete geometric description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: String,
    pub center: Point,
    pub scale: f64,
    pub elements: Vec<Element>,
    pub sacred_ratios: BTreeMap<String, f64>,
    /// Key focal points for meditation use.
    pub meditation_points: Vec<Point>,
}

fn base_ratios() -> BTreeMap<String, f64> {
    let mut ratios = BTreeMap::new();
    ratios.insert("phi".to_string(), PHI);
    ratios.insert("pi".to_string(), PI);
    ratios.insert("sqrt_2".to_string(), 2.0_f64.sqrt());
    ratios.insert("sqrt_3".to_string(), 3.0_f64.sqrt());
    ratios
}

/// Concentric-ring mandala with radial petals.
pub fn mandala(center: Point, radius: f64, petal_count: usize, layer_count: usize) -> Pattern {
    let mut elements = Vec::new();
    let mut meditation_points = vec![center];

    for layer in 1..=layer_count {
        let layer_radius = radius * layer as f64 / layer_count as f64;
        elements.push(Element::Circle { center, radius: layer_radius });

        // Petal circles sit on the ring, one per division.
        let petal_radius = layer_radius * PI / petal_count as f64 / 2.0;
        for i in 0..petal_count {
            let angle = 2.0 * PI * i as f64 / petal_count as f64;
            let petal_center = center.polar(layer_radius, angle);
            elements.push(Element::Circle { center: petal_center, radius: petal_radius });
            if layer == layer_count {
                meditation_points.push(petal_center);
            }
        }
    }

    // Radial spokes.
    for i in 0..petal_count {
        let angle = 2.0 * PI * i as f64 / petal_count as f64;
        elements.push(Element::Line { from: center, to: center.polar(radius, angle) });
    }

    Pattern {
        pattern_type: "mandala".into(),
        center,
        scale: radius,
        elements,
        sacred_ratios: base_ratios(),
        meditation_points,
    }
}

/// Flower of Life: hexagonally packed unit circles grown layer by layer.
pub fn flower_of_life(center: Point, unit_radius: f64, layers: usize) -> Pattern {
    let mut elements = vec![Element::Circle { center, radius: unit_radius }];
    let mut meditation_points = vec![center];

    for ring in 1..=layers {
        // Walk the hexagonal ring at distance ring * unit_radius.
        for i in 0..(6 * ring) {
            let angle = 2.0 * PI * i as f64 / (6 * ring) as f64;
            let c = center.polar(unit_radius * ring as f64, angle);
            elements.push(Element::Circle { center: c, radius: unit_radius });
        }
        // The six cardinal intersections of each ring are focal points.
        for i in 0..6 {
            let angle = PI / 3.0 * i as f64;
            meditation_points.push(center.polar(unit_radius * ring as f64, angle));
        }
    }

    Pattern {
        pattern_type: "flower_of_life".into(),
        center,
        scale: unit_radius * (layers as f64 + 1.0),
        elements,
        sacred_ratios: base_ratios(),
        meditation_points,
    }
}

/// Sri Yantra: nine interlocking triangles, four pointing up and five down,
/// inside a containing circle.
pub fn sri_yantra(center: Point, radius: f64) -> Pattern {
    let mut elements = vec![Element::Circle { center, radius }];

    // Scale steps for the nested triangles.
    let upward_scales = [1.0, 0.78, 0.55, 0.32];
    let downward_scales = [0.9, 0.72, 0.54, 0.38, 0.2];

    for &s in &upward_scales {
        elements.push(Element::Polygon {
            vertices: regular_polygon(center, radius * s, 3, -PI / 2.0),
        });
    }
    for &s in &downward_scales {
        elements.push(Element::Polygon {
            vertices: regular_polygon(center, radius * s, 3, PI / 2.0),
        });
    }

    let mut ratios = base_ratios();
    ratios.insert("triangles_up".into(), 4.0);
    ratios.insert("triangles_down".into(), 5.0);

    Pattern {
        pattern_type: "sri_yantra".into(),
        center,
        scale: radius,
        elements,
        sacred_ratios: ratios,
        meditation_points: vec![center],
    }
}

/// Golden spiral pattern.
pub fn golden_spiral_pattern(center: Point, turns: usize) -> Pattern {
    let points = golden_spiral(center, 1.0, turns, 36);
    let outer = points.last().copied().unwrap_or(center);

    Pattern {
        pattern_type: "golden_spiral".into(),
        center,
        scale: center.distance_to(&outer),
        elements: vec![Element::Path { points }],
        sacred_ratios: base_ratios(),
        meditation_points: vec![center, outer],
    }
}

/// Vesica Piscis: two circles of equal radius, each passing through the
/// other's centre.
pub fn vesica_piscis(center_a: Point, center_b: Point, radius: f64) -> Pattern {
    let elements = vec![
        Element::Circle { center: center_a, radius },
        Element::Circle { center: center_b, radius },
    ];
    let midpoint = Point::new((center_a.x + center_b.x) / 2.0, (center_a.y + center_b.y) / 2.0);

    let mut ratios = base_ratios();
    // The height/width ratio of the lens is √3.
    ratios.insert("vesica_ratio".into(), 3.0_f64.sqrt());

    Pattern {
        pattern_type: "vesica_piscis".into(),
        center: midpoint,
        scale: radius,
        elements,
        sacred_ratios: ratios,
        meditation_points: vec![midpoint, center_a, center_b],
    }
}

// ---------------------------------------------------------------------------
// Platonic solids
// ---------------------------------------------------------------------------

/// Canonical vertices of the five Platonic solids, unit-ish scale.
pub fn platonic_vertices(name: &str) -> Option<Vec<Point3>> {
    let phi = PHI;
    let verts: Vec<[f64; 3]> = match name {
        "tetrahedron" => vec![
            [1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
        ],
        "cube" => {
            let mut v = Vec::new();
            for x in [-1.0, 1.0] {
                for y in [-1.0, 1.0] {
                    for z in [-1.0, 1.0] {
                        v.push([x, y, z]);
                    }
                }
            }
            v
        }
        "octahedron" => vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        "dodecahedron" => {
            let mut v = Vec::new();
            for x in [-1.0, 1.0] {
                for y in [-1.0, 1.0] {
                    for z in [-1.0, 1.0] {
                        v.push([x, y, z]);
                    }
                }
            }
            let inv = 1.0 / phi;
            for a in [-inv, inv] {
                for b in [-phi, phi] {
                    v.push([0.0, a, b]);
                    v.push([a, b, 0.0]);
                    v.push([b, 0.0, a]);
                }
            }
            v
        }
        "icosahedron" => {
            let mut v = Vec::new();
            for a in [-1.0, 1.0] {
                for b in [-phi, phi] {
                    v.push([0.0, a, b]);
                    v.push([a, b, 0.0]);
                    v.push([b, 0.0, a]);
                }
            }
            v
        }
        _ => return None,
    };

    Some(verts.into_iter().map(|[x, y, z]| Point3 { x, y, z }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandala_element_count() {
        let p = mandala(Point::new(0.0, 0.0), 10.0, 8, 3);
        // 3 rings + 3*8 petals + 8 spokes
        assert_eq!(p.elements.len(), 3 + 24 + 8);
        assert_eq!(p.pattern_type, "mandala");
        assert!(!p.meditation_points.is_empty());
    }

    #[test]
    fn flower_of_life_circle_count() {
        // 1 + 6 + 12 circles for two layers.
        let p = flower_of_life(Point::new(0.0, 0.0), 1.0, 2);
        let circles = p
            .elements
            .iter()
            .filter(|e| matches!(e, Element::Circle { .. }))
            .count();
        assert_eq!(circles, 19);
    }

    #[test]
    fn sri_yantra_has_nine_triangles() {
        let p = sri_yantra(Point::new(0.0, 0.0), 5.0);
        let triangles = p
            .elements
            .iter()
            .filter(|e| matches!(e, Element::Polygon { vertices } if vertices.len() == 3))
            .count();
        assert_eq!(triangles, 9);
    }

    #[test]
    fn platonic_vertex_counts() {
        assert_eq!(platonic_vertices("tetrahedron").unwrap().len(), 4);
        assert_eq!(platonic_vertices("cube").unwrap().len(), 8);
        assert_eq!(platonic_vertices("octahedron").unwrap().len(), 6);
        assert_eq!(platonic_vertices("dodecahedron").unwrap().len(), 20);
        assert_eq!(platonic_vertices("icosahedron").unwrap().len(), 12);
        assert!(platonic_vertices("hypercube").is_none());
    }

    #[test]
    fn vesica_ratio_is_sqrt_3() {
        let p = vesica_piscis(Point::new(-1.0, 0.0), Point::new(1.0, 0.0), 2.0);
        assert!((p.sacred_ratios["vesica_ratio"] - 3.0_f64.sqrt()).abs() < 1e-12);
    }
}
