//! Arcana Core -- Shared contract and types for the Arcana divination platform
//!
//! All 13 divination engines implement the [`DivinationEngine`] trait defined
//! here. This crate provides the uniform engine contract, the base
//! input/output envelopes, declarative payload schemas, and the unified
//! error type. Everything above it (orchestration, caching, persistence,
//! synthesis, HTTP) builds on these types; everything below it (the engines)
//! stays pure.

pub mod engine;
pub mod error;
pub mod schema;
pub mod types;

pub use engine::DivinationEngine;
pub use error::EngineError;
pub use schema::{FieldKind, FieldSpec, InputSchema, OutputSchema};
pub use types::{
    BirthData, EngineOutput, FormattedOutput, PrivacyLevel, RequestEnvelope, StoredReading,
    ValidatedInput, CACHE_KEY_EXCLUDED_FIELDS, ENVELOPE_FIELDS,
};
