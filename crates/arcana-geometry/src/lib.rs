//! Arcana Geometry -- Sacred-geometry and sigil primitives
//!
//! Pure geometric descriptions (points, circles, lines, polygons, sampled
//! paths) shared by the sacred-geometry and sigil-forge engines. Rendering
//! to images is explicitly out of scope.

pub mod patterns;
pub mod primitives;
pub mod sigil;

pub use patterns::{
    flower_of_life, golden_spiral_pattern, mandala, platonic_vertices, sri_yantra, vesica_piscis,
    Pattern,
};
pub use primitives::{golden_spiral, regular_polygon, Element, Point, Point3, PHI};
pub use sigil::{distill_letters, forge, letter_number, ConnectionStyle, Sigil, SigilLayout};
