//! Workflow manager -- named multi-engine recipes
//!
//! A workflow maps a name to an engine list, a batch mode and a synthesis
//! pass. The manager projects the shared workflow input onto each engine's
//! declared schema (so one flat input object can feed engines with
//! different shapes), applies per-engine overrides, runs the batch through
//! the orchestrator, synthesises the outputs and attaches
//! workflow-specific insights.

use std::collections::BTreeMap;
use std::sync::Arc;

use arcana_core::{EngineError, StoredReading, ENVELOPE_FIELDS};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{info, instrument};

use crate::{BatchMode, Orchestrator};

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Batch mode a workflow runs its engines in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowMode {
    Parallel,
    Sequential,
}

impl From<WorkflowMode> for BatchMode {
    fn from(mode: WorkflowMode) -> Self {
        match mode {
            WorkflowMode::Parallel => BatchMode::Parallel,
            WorkflowMode::Sequential => BatchMode::Sequential,
        }
    }
}

/// A named multi-engine recipe.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub engines: &'static [&'static str],
    pub mode: WorkflowMode,
}

/// The eight canonical workflows.
pub const WORKFLOWS: [WorkflowDefinition; 8] = [
    WorkflowDefinition {
        name: "complete_natal",
        description: "Comprehensive natal analysis across all birth-data engines",
        engines: &["numerology", "biorhythm", "human_design", "vimshottari", "gene_keys"],
        mode: WorkflowMode::Parallel,
    },
    WorkflowDefinition {
        name: "relationship_compatibility",
        description: "Two-person compatibility analysis",
        engines: &["numerology", "biorhythm", "human_design", "gene_keys"],
        mode: WorkflowMode::Parallel,
    },
    WorkflowDefinition {
        name: "career_guidance",
        description: "Career and life purpose guidance",
        engines: &["numerology", "human_design", "gene_keys", "vimshottari"],
        mode: WorkflowMode::Parallel,
    },
    WorkflowDefinition {
        name: "spiritual_development",
        description: "Spiritual evolution and consciousness development",
        engines: &["gene_keys", "human_design", "iching", "vimshottari"],
        mode: WorkflowMode::Parallel,
    },
    WorkflowDefinition {
        name: "life_transition",
        description: "Guidance for major life transitions",
        engines: &["biorhythm", "vimshottari", "tarot", "iching"],
        mode: WorkflowMode::Parallel,
    },
    WorkflowDefinition {
        name: "daily_guidance",
        description: "Daily energy optimization and guidance",
        engines: &["biorhythm", "numerology"],
        mode: WorkflowMode::Sequential,
    },
    WorkflowDefinition {
        name: "shadow_work",
        description: "Shadow integration and healing work",
        engines: &["gene_keys", "human_design", "enneagram"],
        mode: WorkflowMode::Parallel,
    },
    WorkflowDefinition {
        name: "manifestation_timing",
        description: "Optimal timing for manifestation and goal achievement",
        engines: &["biorhythm", "vimshottari", "numerology"],
        mode: WorkflowMode::Sequential,
    },
];

pub fn workflow_definition(name: &str) -> Option<&'static WorkflowDefinition> {
    WORKFLOWS.iter().find(|w| w.name == name)
}

pub fn workflow_names() -> Vec<&'static str> {
    WORKFLOWS.iter().map(|w| w.name).collect()
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct WorkflowManager {
    orchestrator: Arc<Orchestrator>,
}

impl WorkflowManager {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Project the shared workflow input onto one engine's schema: keep the
    /// envelope fields, keep payload fields the engine declares, drop the
    /// rest, then fold in defaults and per-engine overrides.
    fn project_input(&self, engine_name: &str, input: &Map<String, Value>, options: &Value) -> Value {
        let mut projected = Map::new();

        for (key, value) in input {
            if ENVELOPE_FIELDS.contains(&key.as_str()) {
                projected.insert(key.clone(), value.clone());
            }
        }
        if let Some(engine) = self.orchestrator.registry().get(engine_name) {
            for field in engine.input_schema().fields {
                if let Some(value) = input.get(&field.name) {
                    projected.insert(field.name, value.clone());
                }
            }
        }

        // Question/intention engines receive a workflow-derived default.
        if !projected.contains_key("question")
            && matches!(engine_name, "tarot" | "iching")
        {
            if let Some(question) = input.get("question").or_else(|| input.get("intention")) {
                projected.insert("question".into(), question.clone());
            } else {
                projected.insert("question".into(), json!("What guidance serves this reading?"));
            }
        }

        if let Some(overrides) = options["overrides"][engine_name].as_object() {
            for (key, value) in overrides {
                projected.insert(key.clone(), value.clone());
            }
        }

        Value::Object(projected)
    }

    /// Run a named workflow against a shared input object.
    #[instrument(skip(self, input, options), fields(workflow = %workflow_name))]
    pub async fn run_workflow(
        &self,
        workflow_name: &str,
        input: Value,
        options: Value,
    ) -> Result<Value, EngineError> {
        let definition = workflow_definition(workflow_name)
            .ok_or_else(|| EngineError::UnknownWorkflow(workflow_name.to_string()))?;

        let input_map = match &input {
            Value::Object(map) => map.clone(),
            _ => {
                return Err(EngineError::invalid_input(
                    "input",
                    "workflow input must be a JSON object",
                ))
            }
        };

        info!(workflow = workflow_name, engines = definition.engines.len(), "Starting workflow");

        if workflow_name == "relationship_compatibility" {
            return self.run_compatibility(definition, &input_map, &options).await;
        }

        let mut engines: Vec<&str> = definition.engines.to_vec();
        if workflow_name == "complete_natal"
            && options["include_divination"].as_bool().unwrap_or(true)
        {
            engines.push("tarot");
            engines.push("iching");
        }

        let requests: Vec<(String, Value)> = engines
            .iter()
            .map(|name| (name.to_string(), self.project_input(name, &input_map, &options)))
            .collect();

        let outcome = self
            .orchestrator
            .run_many(requests, definition.mode.into())
            .await;

        let outputs = outcome.outputs();
        let synthesis = arcana_synthesis::synthesize(&outputs);
        let insights = workflow_insights(workflow_name, &outputs);
        let recommendations = collect_recommendations(&outputs);

        Ok(json!({
            "workflow_name": workflow_name,
            "timestamp": Utc::now().to_rfc3339(),
            "input": input,
            "options": options,
            "engine_results": outputs,
            "engine_errors": outcome.errors(),
            "synthesis": synthesis,
            "workflow_insights": insights,
            "recommendations": recommendations,
        }))
    }

    /// Relationship compatibility runs the engine set once per person and
    /// scores the pairing.
    async fn run_compatibility(
        &self,
        definition: &WorkflowDefinition,
        input: &Map<String, Value>,
        options: &Value,
    ) -> Result<Value, EngineError> {
        let person1 = input
            .get("person1")
            .and_then(|v| v.as_object())
            .ok_or_else(|| EngineError::invalid_input("person1", "required object"))?
            .clone();
        let person2 = input
            .get("person2")
            .and_then(|v| v.as_object())
            .ok_or_else(|| EngineError::invalid_input("person2", "required object"))?
            .clone();

        let build = |person: &Map<String, Value>| -> Vec<(String, Value)> {
            definition
                .engines
                .iter()
                .map(|name| (name.to_string(), self.project_input(name, person, options)))
                .collect()
        };

        let outcome1 = self
            .orchestrator
            .run_many(build(&person1), definition.mode.into())
            .await;
        let outcome2 = self
            .orchestrator
            .run_many(build(&person2), definition.mode.into())
            .await;

        let outputs1 = outcome1.outputs();
        let outputs2 = outcome2.outputs();
        let compatibility = compatibility_insights(&outputs1, &outputs2);

        let mut combined = outputs1.clone();
        for (name, reading) in &outputs2 {
            combined.insert(format!("{}_partner", name), reading.clone());
        }
        let synthesis = arcana_synthesis::synthesize(&combined);

        Ok(json!({
            "workflow_name": "relationship_compatibility",
            "timestamp": Utc::now().to_rfc3339(),
            "input": { "person1": person1, "person2": person2 },
            "options": options,
            "engine_results": { "person1": outputs1, "person2": outputs2 },
            "engine_errors": { "person1": outcome1.errors(), "person2": outcome2.errors() },
            "synthesis": synthesis,
            "workflow_insights": compatibility,
            "recommendations": [
                "Compare strategies and authorities before making shared decisions",
                "Revisit the compatibility snapshot on significant dates for both charts",
            ],
        }))
    }
}

// ---------------------------------------------------------------------------
// Insights
// ---------------------------------------------------------------------------

fn collect_recommendations(outputs: &BTreeMap<String, StoredReading>) -> Vec<String> {
    let mut recs: Vec<String> = outputs
        .values()
        .flat_map(|r| r.output.recommendations.iter().cloned())
        .collect();
    recs.dedup();
    recs.truncate(12);
    recs
}

fn workflow_insights(workflow_name: &str, outputs: &BTreeMap<String, StoredReading>) -> Value {
    let themes: Vec<String> = outputs
        .values()
        .flat_map(|r| r.output.archetypal_themes.iter().cloned())
        .collect();

    match workflow_name {
        "complete_natal" => {
            let life_path = outputs
                .get("numerology")
                .and_then(|r| r.output.raw_data["life_path"].as_u64());
            let hd_type = outputs
                .get("human_design")
                .and_then(|r| r.output.raw_data["type"].as_str().map(String::from));
            json!({
                "natal_themes": themes,
                "life_purpose_synthesis": match (life_path, &hd_type) {
                    (Some(lp), Some(t)) => format!(
                        "A Life Path {} walking the {} strategy",
                        lp, t
                    ),
                    _ => "Purpose synthesis pending complete chart data".to_string(),
                },
                "personality_integration": {
                    "systems_contributing": outputs.len(),
                },
            })
        }
        "career_guidance" => json!({
            "career_indicators": themes,
            "vocational_keys": outputs
                .get("gene_keys")
                .map(|r| r.output.raw_data["pearl_sequence"].clone()),
        }),
        "spiritual_development" => json!({
            "development_themes": themes,
            "current_spiritual_period": outputs
                .get("vimshottari")
                .map(|r| r.output.raw_data["current_periods"]["mahadasha"].clone()),
        }),
        "life_transition" => json!({
            "transition_themes": themes,
            "energy_trend": outputs
                .get("biorhythm")
                .map(|r| r.output.raw_data["trend"].clone()),
        }),
        "daily_guidance" => json!({
            "daily_energy": outputs
                .get("biorhythm")
                .map(|r| r.output.raw_data["overall_energy"].clone()),
            "personal_day": outputs
                .get("numerology")
                .map(|r| r.output.raw_data["personal_day"].clone()),
        }),
        "shadow_work" => json!({
            "shadow_themes": themes,
            "primary_shadows": outputs.get("gene_keys").map(|r| {
                let seq = &r.output.raw_data["activation_sequence"];
                json!([seq["lifes_work"]["shadow"], seq["evolution"]["shadow"]])
            }),
        }),
        "manifestation_timing" => json!({
            "timing_themes": themes,
            "favourable_days": outputs
                .get("biorhythm")
                .map(|r| r.output.raw_data["best_days_ahead"].clone()),
        }),
        _ => json!({ "themes": themes }),
    }
}

fn compatibility_insights(
    person1: &BTreeMap<String, StoredReading>,
    person2: &BTreeMap<String, StoredReading>,
) -> Value {
    let mut factors = Vec::new();
    let mut scores = Vec::new();

    let life_paths = (
        person1
            .get("numerology")
            .and_then(|r| r.output.raw_data["life_path"].as_u64()),
        person2
            .get("numerology")
            .and_then(|r| r.output.raw_data["life_path"].as_u64()),
    );
    if let (Some(a), Some(b)) = life_paths {
        let score = 1.0 - (a.abs_diff(b) as f64 / 9.0).min(1.0);
        scores.push(score);
        factors.push(json!({
            "factor": "life_path_resonance",
            "person1": a,
            "person2": b,
            "score": score,
        }));
    }

    let types = (
        person1
            .get("human_design")
            .and_then(|r| r.output.raw_data["type"].as_str().map(String::from)),
        person2
            .get("human_design")
            .and_then(|r| r.output.raw_data["type"].as_str().map(String::from)),
    );
    if let (Some(a), Some(b)) = &types {
        // Identical types share strategy; Generator/Projector pairs read well.
        let score = if a == b {
            0.8
        } else if (a == "Generator") != (b == "Generator") {
            0.7
        } else {
            0.5
        };
        scores.push(score);
        factors.push(json!({
            "factor": "type_dynamic",
            "person1": a,
            "person2": b,
            "score": score,
        }));
    }

    let energies = (
        person1
            .get("biorhythm")
            .and_then(|r| r.output.raw_data["overall_energy"].as_f64()),
        person2
            .get("biorhythm")
            .and_then(|r| r.output.raw_data["overall_energy"].as_f64()),
    );
    if let (Some(a), Some(b)) = energies {
        let score = 1.0 - ((a - b).abs() / 200.0);
        scores.push(score);
        factors.push(json!({
            "factor": "energy_synchrony",
            "score": score,
        }));
    }

    let overall = if scores.is_empty() {
        0.5
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    json!({
        "compatibility_score": overall,
        "factors": factors,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
