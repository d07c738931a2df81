//! Arcana Orchestrator -- validation, routing and engine lifecycle
//!
//! The orchestrator is the concurrency boundary of the platform. Engines
//! are pure synchronous computations; everything around them -- envelope
//! splitting, schema validation, consent gating, cache read-through,
//! timing, deadlines, storage-aware assembly and write-behind -- lives
//! here.
//!
//! # Architecture
//!
//! - [`EngineRegistry`] -- write-once map of `Arc<dyn DivinationEngine>`
//!   keyed by engine name, loaded at startup and read-only thereafter.
//!   Duplicate registration fails fast.
//! - [`Orchestrator`] -- `run` executes one engine end-to-end;
//!   `run_many` fans a batch out in parallel or walks it sequentially.
//!   Per-engine failures never abort sibling engines.
//! - [`workflow`] -- named multi-engine recipes composed over `run_many`
//!   plus the synthesiser.

pub mod workflow;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arcana_cache::CacheManager;
use arcana_core::{
    DivinationEngine, EngineError, EngineOutput, FormattedOutput, PrivacyLevel, RequestEnvelope,
    StoredReading, ValidatedInput, ENVELOPE_FIELDS,
};
use arcana_store::{ReadingRecord, ReadingStore, RetentionPolicy};
use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};

pub use workflow::{WorkflowDefinition, WorkflowManager, WorkflowMode};

// ---------------------------------------------------------------------------
// EngineRegistry
// ---------------------------------------------------------------------------

/// Write-once registry of divination engines keyed by `name()`.
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn DivinationEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Register an engine. Registering two engines under one name is a
    /// startup bug and fails immediately.
    pub fn register(&mut self, engine: Arc<dyn DivinationEngine>) -> Result<(), EngineError> {
        let name = engine.name().to_string();
        if self.engines.contains_key(&name) {
            return Err(EngineError::internal(
                name.clone(),
                "duplicate engine registration",
            ));
        }
        info!(engine = %name, "Registering engine");
        self.engines.insert(name, engine);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DivinationEngine>> {
        self.engines.get(name).cloned()
    }

    /// All engine names, sorted for deterministic listings.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    /// (name, description) pairs, sorted by name.
    pub fn descriptors(&self) -> Vec<(String, String)> {
        let mut list: Vec<(String, String)> = self
            .engines
            .values()
            .map(|e| (e.name().to_string(), e.description().to_string()))
            .collect();
        list.sort();
        list
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Deadlines and cache policy for engine runs.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Budget for one engine run, validation to assembly.
    pub engine_deadline: Duration,
    /// Budget for decoupled cache/persistence writes.
    pub write_deadline: Duration,
    /// TTL applied to cache entries.
    pub cache_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            engine_deadline: Duration::from_secs(30),
            write_deadline: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(86_400),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch types
// ---------------------------------------------------------------------------

/// Execution mode for [`Orchestrator::run_many`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Engines run concurrently; no ordering guarantees.
    Parallel,
    /// Engines run in submission order; earlier outputs are observable
    /// through the outcome's context map.
    Sequential,
}

/// Result of a batch run: one entry per request, in submission order.
pub struct BatchOutcome {
    pub results: Vec<(String, Result<StoredReading, EngineError>)>,
}

impl BatchOutcome {
    /// Successful outputs keyed by engine name.
    pub fn outputs(&self) -> BTreeMap<String, StoredReading> {
        self.results
            .iter()
            .filter_map(|(name, result)| {
                result.as_ref().ok().map(|r| (name.clone(), r.clone()))
            })
            .collect()
    }

    /// Failed engines with their errors, as serialisable descriptions.
    pub fn errors(&self) -> BTreeMap<String, Value> {
        self.results
            .iter()
            .filter_map(|(name, result)| {
                result.as_ref().err().map(|e| {
                    (
                        name.clone(),
                        json!({ "code": e.code(), "message": e.to_string() }),
                    )
                })
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Result<StoredReading, EngineError>> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Parts produced inside the blocking engine task.
struct ComputedParts {
    raw: Value,
    formatted: FormattedOutput,
    recommendations: Vec<String>,
    reality_patches: Vec<String>,
    archetypal_themes: Vec<String>,
    confidence: f64,
}

pub struct Orchestrator {
    registry: Arc<EngineRegistry>,
    cache: Option<Arc<CacheManager>>,
    store: Option<Arc<ReadingStore>>,
    policy: RetentionPolicy,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            registry,
            cache: None,
            store: None,
            policy: RetentionPolicy::default(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_store(mut self, store: Arc<ReadingStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_policy(mut self, policy: RetentionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    // -- Validation ---------------------------------------------------------

    /// Split a raw request object into envelope + payload and validate the
    /// payload against the engine's declared schema.
    pub fn validate_request(
        engine: &dyn DivinationEngine,
        raw_input: Value,
    ) -> Result<ValidatedInput, EngineError> {
        let object = match raw_input {
            Value::Object(map) => map,
            _ => {
                return Err(EngineError::invalid_input(
                    "input",
                    "request input must be a JSON object",
                ))
            }
        };

        let mut envelope_fields = Map::new();
        let mut payload = Map::new();
        for (key, value) in object {
            if ENVELOPE_FIELDS.contains(&key.as_str()) {
                envelope_fields.insert(key, value);
            } else {
                payload.insert(key, value);
            }
        }

        let envelope: RequestEnvelope = serde_json::from_value(Value::Object(envelope_fields))
            .map_err(|e| EngineError::invalid_input("envelope", e.to_string()))?;

        engine.input_schema().validate(&payload)?;

        Ok(ValidatedInput::new(envelope, payload))
    }

    // -- Single-engine execution -------------------------------------------

    /// Run one engine end-to-end: route, validate, consent-gate, consult
    /// the cache, compute under deadline, assemble the storage envelope,
    /// and enqueue decoupled writes.
    #[instrument(skip(self, raw_input), fields(engine = %engine_name))]
    pub async fn run(
        &self,
        engine_name: &str,
        raw_input: Value,
    ) -> Result<StoredReading, EngineError> {
        let engine = self
            .registry
            .get(engine_name)
            .ok_or_else(|| EngineError::UnknownEngine(engine_name.to_string()))?;

        let input = Self::validate_request(engine.as_ref(), raw_input)?;

        // Consent gating happens before any computation.
        if engine.requires_consent() && !input.envelope.data_processing_consent {
            return Err(EngineError::ConsentRequired(engine_name.to_string()));
        }

        let cache_key = input.cache_key(engine_name);

        if input.envelope.cache_result {
            if let Some(cache) = &self.cache {
                if let Some(value) = cache.get(&cache_key).await {
                    // Any deserialisation failure is a miss.
                    if let Ok(mut reading) = serde_json::from_value::<StoredReading>(value) {
                        reading
                            .storage_metadata
                            .insert("cache_hit".to_string(), json!(true));
                        info!(engine = engine_name, key = %cache_key, "Cache hit");
                        return Ok(reading);
                    }
                }
            }
        }

        // The timer covers calculation through output assembly.
        let started = Instant::now();
        let parts = self.compute(engine.clone(), input.clone(), engine_name).await?;
        let calculation_time_seconds = started.elapsed().as_secs_f64();

        let reading = self.assemble(engine_name, &input, parts, calculation_time_seconds);

        self.enqueue_writes(engine_name, &input, &cache_key, &reading);

        Ok(reading)
    }

    /// Run the pure engine computation on the blocking pool, bounded by the
    /// engine deadline. A deadline hit cancels the request-side wait and
    /// discards the partial result.
    async fn compute(
        &self,
        engine: Arc<dyn DivinationEngine>,
        input: ValidatedInput,
        engine_name: &str,
    ) -> Result<ComputedParts, EngineError> {
        let task = tokio::task::spawn_blocking(move || -> Result<ComputedParts, EngineError> {
            let raw = engine.calculate(&input)?;
            let formatted = engine.interpret(&raw, &input);
            Ok(ComputedParts {
                recommendations: engine.recommendations(&raw, &input),
                reality_patches: engine.reality_patches(&raw, &input),
                archetypal_themes: engine.archetypal_themes(&raw, &input),
                confidence: engine.confidence(&raw, &input).clamp(0.0, 1.0),
                raw,
                formatted,
            })
        });

        match tokio::time::timeout(self.config.engine_deadline, task).await {
            Err(_) => Err(EngineError::Timeout {
                engine: engine_name.to_string(),
                deadline_secs: self.config.engine_deadline.as_secs(),
            }),
            Ok(Err(join_error)) => Err(EngineError::internal(
                engine_name,
                format!("engine task aborted: {}", join_error),
            )),
            Ok(Ok(Err(e))) => Err(Self::wrap_engine_error(engine_name, e)),
            Ok(Ok(Ok(parts))) => Ok(parts),
        }
    }

    /// Caller-fixable and dependency errors pass through; anything else an
    /// engine produces is wrapped as an internal error with a correlation
    /// id so the service never leaks engine guts.
    fn wrap_engine_error(engine_name: &str, error: EngineError) -> EngineError {
        match error {
            e @ EngineError::InvalidInput { .. }
            | e @ EngineError::ConsentRequired(_)
            | e @ EngineError::DependencyUnavailable(_)
            | e @ EngineError::InternalError { .. } => e,
            other => EngineError::internal(engine_name, other.to_string()),
        }
    }

    fn assemble(
        &self,
        engine_name: &str,
        input: &ValidatedInput,
        parts: ComputedParts,
        calculation_time_seconds: f64,
    ) -> StoredReading {
        let now = Utc::now();
        let envelope = &input.envelope;

        let reading_id = envelope
            .reading_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let expires_at = envelope
            .store_reading
            .then(|| {
                self.policy
                    .expires_at(now, envelope.retention_days, envelope.privacy_level)
            })
            .flatten()
            .or_else(|| {
                // Biometric data expires whether or not it is persisted.
                (envelope.privacy_level == PrivacyLevel::Biometric).then(|| {
                    self.policy
                        .expires_at(now, envelope.retention_days, envelope.privacy_level)
                })
                .flatten()
            });

        let cache_enabled = self.cache.is_some() && envelope.cache_result;
        let persistence_enqueued = self.store.is_some() && envelope.store_reading;

        // Only keys that will actually be written are reported.
        let mut kv_cache_keys = Vec::new();
        if cache_enabled {
            kv_cache_keys.push(input.cache_key(engine_name));
        }
        if persistence_enqueued {
            if let Some(user_key) = input.user_key(engine_name, "reading", &reading_id) {
                kv_cache_keys.push(user_key);
            }
        }

        let d1_table_refs = if persistence_enqueued {
            vec![StoredReading::table_name(engine_name)]
        } else {
            Vec::new()
        };

        let mut storage_metadata = Map::new();
        storage_metadata.insert("cache_hit".to_string(), json!(false));
        storage_metadata.insert("cache_enabled".to_string(), json!(cache_enabled));
        storage_metadata.insert(
            "persistence_enqueued".to_string(),
            json!(persistence_enqueued),
        );
        let mut warnings = Vec::new();
        if envelope.cache_result && self.cache.is_none() {
            warnings.push("cache_unavailable");
        }
        if envelope.store_reading && self.store.is_none() {
            warnings.push("persistence_unavailable");
        }
        if !warnings.is_empty() {
            storage_metadata.insert("warnings".to_string(), json!(warnings));
        }

        StoredReading {
            output: EngineOutput {
                engine_name: engine_name.to_string(),
                calculation_time_seconds,
                confidence_score: parts.confidence,
                timestamp: now,
                raw_data: parts.raw,
                formatted_output: parts.formatted,
                recommendations: parts.recommendations,
                field_signature: None,
                reality_patches: parts.reality_patches,
                archetypal_themes: parts.archetypal_themes,
            },
            reading_id,
            user_id: envelope.user_id.clone(),
            created_at: now,
            updated_at: now,
            expires_at,
            storage_metadata,
            kv_cache_keys,
            d1_table_refs,
            privacy_level: envelope.privacy_level,
        }
    }

    /// Fire-and-forget cache and persistence writes. Decoupled from the
    /// request deadline; each write gets the shorter write deadline and is
    /// dropped (with a log line) on failure or timeout.
    fn enqueue_writes(
        &self,
        engine_name: &str,
        input: &ValidatedInput,
        cache_key: &str,
        reading: &StoredReading,
    ) {
        let write_deadline = self.config.write_deadline;

        if input.envelope.cache_result {
            if let Some(cache) = self.cache.clone() {
                let key = cache_key.to_string();
                let engine = engine_name.to_string();
                let ttl = self.config.cache_ttl;
                match serde_json::to_value(reading) {
                    Ok(value) => {
                        tokio::spawn(async move {
                            if tokio::time::timeout(
                                write_deadline,
                                cache.put(&key, &engine, &value, Some(ttl)),
                            )
                            .await
                            .is_err()
                            {
                                warn!(engine = %engine, key = %key, "Cache write timed out; dropped");
                            }
                        });
                    }
                    Err(e) => warn!(engine = %engine, error = %e, "Reading not cacheable"),
                }
            }
        }

        if input.envelope.store_reading {
            if let Some(store) = self.store.clone() {
                match ReadingRecord::from_reading(reading) {
                    Ok(record) => {
                        let engine = engine_name.to_string();
                        tokio::spawn(async move {
                            if tokio::time::timeout(write_deadline, store.insert_silent(&record))
                                .await
                                .is_err()
                            {
                                warn!(engine = %engine, "Persistence write timed out; dropped");
                            }
                        });
                    }
                    Err(e) => warn!(engine = engine_name, error = %e, "Reading not persistable"),
                }
            }
        }
    }

    // -- Batch execution ----------------------------------------------------

    /// Run several engines against one request. Parallel mode fans out one
    /// task per engine; sequential mode preserves submission order. Either
    /// way, one engine's failure is recorded in its own entry and never
    /// aborts the others.
    pub async fn run_many(&self, requests: Vec<(String, Value)>, mode: BatchMode) -> BatchOutcome {
        match mode {
            BatchMode::Parallel => {
                let futures: Vec<_> = requests
                    .into_iter()
                    .map(|(name, input)| async move {
                        let result = self.run(&name, input).await;
                        (name, result)
                    })
                    .collect();
                BatchOutcome {
                    results: join_all(futures).await,
                }
            }
            BatchMode::Sequential => {
                let mut results = Vec::new();
                for (name, input) in requests {
                    let result = self.run(&name, input).await;
                    results.push((name, result));
                }
                BatchOutcome { results }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use arcana_core::{FieldKind, FieldSpec, InputSchema, OutputSchema};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Configurable mock engine used across the orchestrator tests.
    pub struct MockEngine {
        name: &'static str,
        consent: bool,
        fail: bool,
        slow: Option<Duration>,
        calculate_calls: Arc<AtomicUsize>,
    }

    impl MockEngine {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                consent: false,
                fail: false,
                slow: None,
                calculate_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::named(name)
            }
        }

        fn consent_gated(name: &'static str) -> Self {
            Self {
                consent: true,
                ..Self::named(name)
            }
        }

        fn slow(name: &'static str, delay: Duration) -> Self {
            Self {
                slow: Some(delay),
                ..Self::named(name)
            }
        }

        fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calculate_calls.clone()
        }
    }

    impl DivinationEngine for MockEngine {
        fn name(&self) -> &'static str {
            self.name
        }
        fn description(&self) -> &'static str {
            "Mock engine"
        }
        fn requires_consent(&self) -> bool {
            self.consent
        }
        fn input_schema(&self) -> InputSchema {
            InputSchema::new(vec![FieldSpec::optional(
                "value",
                FieldKind::Integer,
                "Echo value",
            )])
        }
        fn output_schema(&self) -> OutputSchema {
            OutputSchema::default()
        }
        fn calculate(&self, input: &ValidatedInput) -> Result<Value, EngineError> {
            self.calculate_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.slow {
                std::thread::sleep(delay);
            }
            if self.fail {
                return Err(EngineError::DataError("mock blew up".into()));
            }
            Ok(json!({ "echo": input.payload.get("value").cloned().unwrap_or(json!(null)) }))
        }
        fn interpret(&self, raw: &Value, _input: &ValidatedInput) -> FormattedOutput {
            FormattedOutput::Text(format!("mock says {}", raw["echo"]))
        }
    }

    fn orchestrator(engines: Vec<Arc<dyn DivinationEngine>>) -> Orchestrator {
        let mut registry = EngineRegistry::new();
        for engine in engines {
            registry.register(engine).unwrap();
        }
        Orchestrator::new(Arc::new(registry)).with_cache(Arc::new(CacheManager::in_memory()))
    }

    #[tokio::test]
    async fn run_returns_matching_engine_name() {
        let orch = orchestrator(vec![Arc::new(MockEngine::named("mock"))]);
        let reading = orch.run("mock", json!({ "value": 7 })).await.unwrap();
        assert_eq!(reading.output.engine_name, "mock");
        assert!(reading.output.calculation_time_seconds >= 0.0);
        assert_eq!(reading.output.confidence_score, 1.0);
        assert!(!reading.reading_id.is_empty());
    }

    #[tokio::test]
    async fn unknown_engine_is_routing_failure() {
        let orch = orchestrator(vec![]);
        let err = orch.run("nonexistent", json!({})).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownEngine(_)));
    }

    #[tokio::test]
    async fn unknown_payload_field_rejected() {
        let orch = orchestrator(vec![Arc::new(MockEngine::named("mock"))]);
        let err = orch
            .run("mock", json!({ "value": 1, "surprise": true }))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { field, .. } if field == "surprise"));
    }

    #[tokio::test]
    async fn envelope_fields_are_not_payload() {
        let orch = orchestrator(vec![Arc::new(MockEngine::named("mock"))]);
        // user_id is an envelope field and must not hit the schema.
        let reading = orch
            .run("mock", json!({ "value": 1, "user_id": "u1", "store_reading": false }))
            .await
            .unwrap();
        assert_eq!(reading.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn consent_gate_blocks_before_calculate() {
        let engine = MockEngine::consent_gated("biometric_mock");
        let calls = engine.call_counter();
        let orch = orchestrator(vec![Arc::new(engine)]);

        let err = orch.run("biometric_mock", json!({})).await.unwrap_err();
        assert!(matches!(err, EngineError::ConsentRequired(_)));
        // Calculate was never entered.
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let ok = orch
            .run("biometric_mock", json!({ "data_processing_consent": true }))
            .await;
        assert!(ok.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn engine_failure_becomes_internal_error() {
        let orch = orchestrator(vec![Arc::new(MockEngine::failing("broken"))]);
        let err = orch.run("broken", json!({})).await.unwrap_err();
        match err {
            EngineError::InternalError { engine, correlation_id, .. } => {
                assert_eq!(engine, "broken");
                assert!(!correlation_id.is_empty());
            }
            other => panic!("expected InternalError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn deadline_elapsed_returns_timeout() {
        let orch = orchestrator(vec![Arc::new(MockEngine::slow(
            "sluggish",
            Duration::from_millis(250),
        ))])
        .with_config(OrchestratorConfig {
            engine_deadline: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        });
        let err = orch.run("sluggish", json!({})).await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn cache_round_trip_marks_hit() {
        let orch = orchestrator(vec![Arc::new(MockEngine::named("mock"))]);
        let first = orch.run("mock", json!({ "value": 42 })).await.unwrap();
        assert_eq!(first.storage_metadata["cache_hit"], json!(false));

        // The cache write is decoupled; give it a beat.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = orch.run("mock", json!({ "value": 42 })).await.unwrap();
        assert_eq!(second.storage_metadata["cache_hit"], json!(true));
        assert_eq!(second.reading_id, first.reading_id);
    }

    #[tokio::test]
    async fn cache_disabled_per_request() {
        let orch = orchestrator(vec![Arc::new(MockEngine::named("mock"))]);
        let first = orch
            .run("mock", json!({ "value": 9, "cache_result": false }))
            .await
            .unwrap();
        assert!(first.kv_cache_keys.is_empty());
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = orch
            .run("mock", json!({ "value": 9, "cache_result": false }))
            .await
            .unwrap();
        assert_eq!(second.storage_metadata["cache_hit"], json!(false));
    }

    #[tokio::test]
    async fn biometric_readings_carry_capped_expiry() {
        let orch = orchestrator(vec![Arc::new(MockEngine::consent_gated("bio"))]);
        let reading = orch
            .run(
                "bio",
                json!({
                    "data_processing_consent": true,
                    "privacy_level": "biometric",
                    "retention_days": 365
                }),
            )
            .await
            .unwrap();
        let expires = reading.expires_at.expect("biometric readings must expire");
        let lifetime = expires - reading.created_at;
        assert!(lifetime <= chrono::Duration::days(30));
    }

    #[tokio::test]
    async fn batch_isolates_failures() {
        let orch = orchestrator(vec![
            Arc::new(MockEngine::named("alpha")),
            Arc::new(MockEngine::failing("beta")),
        ]);
        let outcome = orch
            .run_many(
                vec![
                    ("alpha".to_string(), json!({ "value": 1 })),
                    ("beta".to_string(), json!({})),
                    ("nonexistent".to_string(), json!({})),
                ],
                BatchMode::Parallel,
            )
            .await;

        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.get("alpha").unwrap().is_ok());
        assert!(outcome.get("beta").unwrap().is_err());
        assert!(matches!(
            outcome.get("nonexistent").unwrap(),
            Err(EngineError::UnknownEngine(_))
        ));
        assert_eq!(outcome.outputs().len(), 1);
        assert_eq!(outcome.errors().len(), 2);
    }

    #[tokio::test]
    async fn sequential_batch_preserves_order() {
        let orch = orchestrator(vec![
            Arc::new(MockEngine::named("alpha")),
            Arc::new(MockEngine::named("beta")),
        ]);
        let outcome = orch
            .run_many(
                vec![
                    ("beta".to_string(), json!({})),
                    ("alpha".to_string(), json!({})),
                ],
                BatchMode::Sequential,
            )
            .await;
        let order: Vec<&str> = outcome.results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["beta", "alpha"]);
    }

    #[test]
    fn duplicate_registration_fails_fast() {
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(MockEngine::named("mock"))).unwrap();
        let err = registry.register(Arc::new(MockEngine::named("mock")));
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn explicit_reading_id_is_kept() {
        let orch = orchestrator(vec![Arc::new(MockEngine::named("mock"))]);
        let reading = orch
            .run("mock", json!({ "reading_id": "custom-id-1" }))
            .await
            .unwrap();
        assert_eq!(reading.reading_id, "custom-id-1");
    }
}
