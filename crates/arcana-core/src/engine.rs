//! The uniform engine contract

use serde_json::Value;

use crate::error::EngineError;
use crate::schema::{InputSchema, OutputSchema};
use crate::types::{FormattedOutput, ValidatedInput};

/// The capability set every divination engine implements.
///
/// Engines are pure, synchronous computations from a validated input to a
/// raw JSON result. They never start timers, touch caches or storage, or
/// spawn background work; the orchestrator owns the whole lifecycle around
/// `calculate` / `interpret`. Implementations must be stateless (or guard
/// internal state) because one instance serves concurrent requests.
pub trait DivinationEngine: Send + Sync {
    /// Stable engine identifier: lowercase, underscore-separated.
    fn name(&self) -> &'static str;

    /// Human-readable description for the engine listing.
    fn description(&self) -> &'static str;

    /// Declared payload schema; validated before `calculate` is entered.
    fn input_schema(&self) -> InputSchema;

    /// Declared output shape, for documentation and listings.
    fn output_schema(&self) -> OutputSchema;

    /// Whether this engine refuses to run without explicit
    /// `data_processing_consent` (face reading, biofield).
    fn requires_consent(&self) -> bool {
        false
    }

    /// The core computation: validated input to raw result.
    fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError>;

    /// Deterministic human-readable rendering of a raw result.
    fn interpret(&self, raw: &Value, input: &ValidatedInput) -> FormattedOutput;

    /// Actionable guidance derived from the raw result.
    fn recommendations(&self, _raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        Vec::new()
    }

    /// Suggested reality patches.
    fn reality_patches(&self, _raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        Vec::new()
    }

    /// Archetypal themes present in the result.
    fn archetypal_themes(&self, _raw: &Value, _input: &ValidatedInput) -> Vec<String> {
        Vec::new()
    }

    /// Confidence in the result, 0.0-1.0.
    fn confidence(&self, _raw: &Value, _input: &ValidatedInput) -> f64 {
        1.0
    }
}
