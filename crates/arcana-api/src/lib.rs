//! Arcana API -- Axum HTTP server for the divination platform
//!
//! Wires the engine registry, orchestrator, cache, store and workflow
//! manager into a JSON/HTTP surface. Every response shares the envelope
//! `{success, data?, error?, processing_time_seconds, timestamp, engine}`.

mod config;
mod logging;

pub use config::ServiceConfig;
pub use logging::{init_tracing, init_tracing_json};

use std::sync::Arc;
use std::time::Instant;

use arcana_astro::{julian_day, Body, Ephemeris, NativeEphemeris, Zodiac};
use arcana_cache::CacheManager;
use arcana_core::{BirthData, EngineError};
use arcana_orchestrator::{
    workflow::{workflow_definition, WORKFLOWS},
    EngineRegistry, Orchestrator, OrchestratorConfig, WorkflowManager,
};
use arcana_store::{ReadingStore, RetentionPolicy};
use axum::{
    extract::{Json, Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub workflows: Arc<WorkflowManager>,
    pub ephemeris: Arc<dyn Ephemeris>,
    pub startup_time: Instant,
}

/// Register the thirteen divination engines.
pub fn build_registry(ephemeris: Arc<dyn Ephemeris>) -> Result<EngineRegistry, EngineError> {
    let mut registry = EngineRegistry::new();
    registry.register(Arc::new(engine_numerology::NumerologyEngine::new()))?;
    registry.register(Arc::new(engine_biorhythm::BiorhythmEngine::new()))?;
    registry.register(Arc::new(engine_human_design::HumanDesignEngine::new(
        ephemeris.clone(),
    )))?;
    registry.register(Arc::new(engine_vimshottari::VimshottariEngine::new(
        ephemeris.clone(),
    )))?;
    registry.register(Arc::new(engine_gene_keys::GeneKeysEngine::new(
        ephemeris.clone(),
    )))?;
    registry.register(Arc::new(engine_tarot::TarotEngine::new()))?;
    registry.register(Arc::new(engine_iching::IChingEngine::new()))?;
    registry.register(Arc::new(engine_enneagram::EnneagramEngine::new()))?;
    registry.register(Arc::new(engine_sacred_geometry::SacredGeometryEngine::new()))?;
    registry.register(Arc::new(engine_sigil_forge::SigilForgeEngine::new()))?;
    registry.register(Arc::new(engine_face_reading::FaceReadingEngine::new()))?;
    registry.register(Arc::new(engine_biofield::BiofieldEngine::new()))?;
    registry.register(Arc::new(engine_vedic_clock::VedicClockEngine::new()))?;
    Ok(registry)
}

/// Build the application state: engines, cache, optional persistence.
///
/// Cache and persistence degrade gracefully when unreachable; the
/// ephemeris facade is always available through the analytic backend.
pub async fn build_app_state(config: &ServiceConfig) -> AppState {
    let ephemeris: Arc<dyn Ephemeris> = Arc::new(NativeEphemeris::new());

    let registry =
        build_registry(ephemeris.clone()).expect("engine registration must not conflict");

    let cache = Arc::new(CacheManager::new(
        config.redis_url.as_deref(),
        4096,
        config.cache_ttl(),
    ));

    let policy = RetentionPolicy {
        default_days: config.default_retention_days,
        biometric_cap_days: config.biometric_retention_days,
    };

    let mut orchestrator = Orchestrator::new(Arc::new(registry))
        .with_cache(cache)
        .with_policy(policy)
        .with_config(OrchestratorConfig {
            engine_deadline: config.engine_deadline(),
            write_deadline: config.write_deadline(),
            cache_ttl: config.cache_ttl(),
        });

    if let Some(ref url) = config.database_url {
        match ReadingStore::connect(url, policy).await {
            Ok(store) => orchestrator = orchestrator.with_store(Arc::new(store)),
            Err(e) => warn!(error = %e, "Persistence unavailable; readings will not be stored"),
        }
    }

    let orchestrator = Arc::new(orchestrator);
    AppState {
        workflows: Arc::new(WorkflowManager::new(orchestrator.clone())),
        orchestrator,
        ephemeris,
        startup_time: Instant::now(),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/engines", get(list_engines_handler))
        .route("/engines/:engine_name/calculate", post(calculate_handler))
        .route("/workflows", get(list_workflows_handler))
        .route("/workflows/:workflow_name/run", post(workflow_handler))
        .route("/swiss_ephemeris/calculate", post(ephemeris_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

fn envelope(engine: &str, started: Instant, result: Result<Value, EngineError>) -> impl IntoResponse {
    let processing_time_seconds = started.elapsed().as_secs_f64();
    let timestamp = Utc::now().to_rfc3339();

    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": data,
                "processing_time_seconds": processing_time_seconds,
                "timestamp": timestamp,
                "engine": engine,
            })),
        ),
        Err(error) => {
            let status = match &error {
                EngineError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::UnknownEngine(_) | EngineError::UnknownWorkflow(_) => {
                    StatusCode::NOT_FOUND
                }
                EngineError::ConsentRequired(_) => StatusCode::FORBIDDEN,
                EngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                EngineError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(json!({
                    "success": false,
                    "error": {
                        "code": error.code(),
                        "message": error.to_string(),
                        "retryable": error.is_retryable(),
                    },
                    "processing_time_seconds": processing_time_seconds,
                    "timestamp": timestamp,
                    "engine": engine,
                })),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CalculateRequest {
    input: Value,
    #[serde(default)]
    options: Value,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health -- status and available engines.
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "arcana-engine",
        "engines_available": state.orchestrator.registry().names(),
        "workflows_available": WORKFLOWS.iter().map(|w| w.name).collect::<Vec<_>>(),
        "uptime_seconds": state.startup_time.elapsed().as_secs(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /engines -- engine names and descriptions.
async fn list_engines_handler(State(state): State<AppState>) -> Json<Value> {
    let descriptors: Vec<Value> = state
        .orchestrator
        .registry()
        .descriptors()
        .into_iter()
        .map(|(name, description)| json!({ "name": name, "description": description }))
        .collect();
    Json(json!({
        "engines": descriptors,
        "count": descriptors.len(),
        "service": "arcana-engine",
    }))
}

/// POST /engines/:engine_name/calculate -- run one engine.
async fn calculate_handler(
    State(state): State<AppState>,
    Path(engine_name): Path<String>,
    Json(request): Json<CalculateRequest>,
) -> impl IntoResponse {
    let started = Instant::now();

    // Options may carry envelope overrides; fold them into the input.
    let mut input = request.input;
    if let (Value::Object(input_map), Value::Object(options)) = (&mut input, &request.options) {
        for (key, value) in options {
            input_map.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    let result = state
        .orchestrator
        .run(&engine_name, input)
        .await
        .and_then(|reading| {
            serde_json::to_value(&reading)
                .map_err(|e| EngineError::internal(&engine_name, e.to_string()))
        });

    envelope(&engine_name, started, result)
}

/// GET /workflows -- the named workflow recipes.
async fn list_workflows_handler() -> Json<Value> {
    let workflows: Vec<Value> = WORKFLOWS
        .iter()
        .map(|w| {
            json!({
                "name": w.name,
                "description": w.description,
                "engines": w.engines,
            })
        })
        .collect();
    Json(json!({ "workflows": workflows, "count": workflows.len() }))
}

/// POST /workflows/:workflow_name/run -- run a named workflow.
async fn workflow_handler(
    State(state): State<AppState>,
    Path(workflow_name): Path<String>,
    Json(request): Json<CalculateRequest>,
) -> impl IntoResponse {
    let started = Instant::now();

    if workflow_definition(&workflow_name).is_none() {
        return envelope(
            &workflow_name,
            started,
            Err(EngineError::UnknownWorkflow(workflow_name.clone())),
        );
    }

    let result = state
        .workflows
        .run_workflow(&workflow_name, request.input, request.options)
        .await;

    envelope(&workflow_name, started, result)
}

/// POST /swiss_ephemeris/calculate -- thin wrapper over the astronomy
/// facade.
async fn ephemeris_handler(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> impl IntoResponse {
    let started = Instant::now();
    let result = compute_positions(state.ephemeris.as_ref(), request.input);
    envelope("swiss_ephemeris", started, result)
}

fn compute_positions(ephemeris: &dyn Ephemeris, input: Value) -> Result<Value, EngineError> {
    #[derive(Deserialize)]
    struct EphemerisRequest {
        #[serde(flatten)]
        birth: BirthData,
        #[serde(default)]
        bodies: Option<Vec<Body>>,
        #[serde(default)]
        sidereal: bool,
    }

    let parsed: EphemerisRequest = serde_json::from_value(input)
        .map_err(|e| EngineError::invalid_input("input", e.to_string()))?;
    parsed.birth.validate()?;

    let utc = parsed.birth.to_utc()?;
    let jd = julian_day(&utc);
    let bodies = parsed.bodies.unwrap_or_else(|| Body::CHART_BODIES.to_vec());
    let zodiac = if parsed.sidereal {
        Zodiac::Sidereal
    } else {
        Zodiac::Tropical
    };

    let positions = ephemeris.positions_at(jd, &bodies, zodiac)?;
    let by_name: serde_json::Map<String, Value> = positions
        .into_iter()
        .map(|(body, position)| {
            (
                body.as_str().to_string(),
                serde_json::to_value(position).unwrap_or(Value::Null),
            )
        })
        .collect();

    Ok(json!({
        "julian_day": jd,
        "utc_datetime": utc.to_rfc3339(),
        "zodiac": zodiac,
        "positions": by_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_holds_thirteen_engines() {
        let registry = build_registry(Arc::new(NativeEphemeris::new())).unwrap();
        assert_eq!(registry.len(), 13);
        let names = registry.names();
        for expected in [
            "biofield",
            "biorhythm",
            "enneagram",
            "face_reading",
            "gene_keys",
            "human_design",
            "iching",
            "numerology",
            "sacred_geometry",
            "sigil_forge",
            "tarot",
            "vedicclock_tcm",
            "vimshottari",
        ] {
            assert!(names.contains(&expected.to_string()), "{} missing", expected);
        }
    }

    #[test]
    fn ephemeris_endpoint_computes_positions() {
        let eph = NativeEphemeris::new();
        let result = compute_positions(
            &eph,
            json!({
                "birth_date": "1991-08-13",
                "birth_time": "13:31",
                "birth_location": [12.9716, 77.5946],
                "timezone": "Asia/Kolkata"
            }),
        )
        .unwrap();
        assert!(result["julian_day"].as_f64().unwrap() > 2_400_000.0);
        assert_eq!(result["positions"].as_object().unwrap().len(), 13);
        let sun = &result["positions"]["sun"];
        let lon = sun["longitude_deg"].as_f64().unwrap();
        assert!((0.0..360.0).contains(&lon));
    }

    #[test]
    fn ephemeris_endpoint_rejects_bad_coordinates() {
        let eph = NativeEphemeris::new();
        let err = compute_positions(
            &eph,
            json!({
                "birth_date": "1991-08-13",
                "birth_location": [95.0, 10.0],
                "timezone": "UTC"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }
}
