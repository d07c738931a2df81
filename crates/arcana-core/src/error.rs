//! Unified error types for the Arcana platform

/// Main error type for all Arcana engines and services.
///
/// The first six variants map one-to-one onto the error kinds surfaced to
/// API callers. `CacheError` and `StorageError` never fail a request; the
/// orchestrator logs them and degrades.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid input: field '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("Consent required: engine '{0}' processes biometric data and requires data_processing_consent=true")]
    ConsentRequired(String),

    #[error("Timeout: engine '{engine}' did not complete within {deadline_secs}s")]
    Timeout { engine: String, deadline_secs: u64 },

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Data file error: {0}")]
    DataError(String),

    #[error("Internal error in engine '{engine}' [correlation {correlation_id}]: {message}")]
    InternalError {
        engine: String,
        correlation_id: String,
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a validation failure on a named field.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wrap an unexpected engine failure with a fresh correlation id.
    pub fn internal(engine: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InternalError {
            engine: engine.into(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Timeout { .. } | EngineError::DependencyUnavailable(_)
        )
    }

    /// Stable machine-readable code for API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput { .. } => "INVALID_INPUT",
            EngineError::UnknownEngine(_) => "UNKNOWN_ENGINE",
            EngineError::UnknownWorkflow(_) => "UNKNOWN_WORKFLOW",
            EngineError::ConsentRequired(_) => "CONSENT_REQUIRED",
            EngineError::Timeout { .. } => "TIMEOUT",
            EngineError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            EngineError::CacheError(_) => "CACHE_ERROR",
            EngineError::StorageError(_) => "STORAGE_ERROR",
            EngineError::DataError(_) => "DATA_ERROR",
            EngineError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }
}
