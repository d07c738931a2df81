//! Human Design Divination Engine
//!
//! Computes a full bodygraph from timezone-aware birth data: thirteen
//! personality and thirteen design activations (the design moment located
//! by the 88° solar arc), defined channels and centers, energy type,
//! strategy, authority, profile and incarnation cross. All astronomy goes
//! through the arcana-astro facade.

pub mod centers;
pub mod chart;
pub mod engine;
pub mod models;

pub use chart::compute_chart;
pub use engine::HumanDesignEngine;
pub use models::{Authority, Center, Channel, Chart, HdType};
