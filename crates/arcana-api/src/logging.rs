//! Tracing initialisation for the Arcana API server

use tracing_subscriber::{fmt, EnvFilter};

/// Human-readable log output for development.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

/// Structured JSON log output for production.
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().json().with_env_filter(filter).init();
}
