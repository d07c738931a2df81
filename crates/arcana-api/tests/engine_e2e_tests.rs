//! End-to-end engine runs through the orchestrator with the full registry.

use std::sync::Arc;

use arcana_api::build_registry;
use arcana_astro::NativeEphemeris;
use arcana_cache::CacheManager;
use arcana_core::EngineError;
use arcana_orchestrator::{BatchMode, Orchestrator};
use serde_json::json;

fn orchestrator() -> Orchestrator {
    let registry = build_registry(Arc::new(NativeEphemeris::new())).unwrap();
    Orchestrator::new(Arc::new(registry)).with_cache(Arc::new(CacheManager::in_memory()))
}

#[tokio::test]
async fn numerology_reference_reading() {
    let orch = orchestrator();
    let reading = orch
        .run(
            "numerology",
            json!({
                "full_name": "John Smith",
                "birth_date": "1990-05-15",
                "system": "pythagorean"
            }),
        )
        .await
        .unwrap();

    assert_eq!(reading.output.engine_name, "numerology");
    assert_eq!(reading.output.raw_data["life_path"], 3);
    assert!(reading.output.calculation_time_seconds >= 0.0);
    assert!((0.0..=1.0).contains(&reading.output.confidence_score));
    assert!(!reading.reading_id.is_empty());
    // store_reading defaults true, so a reading id must be assigned.
    assert!(reading.created_at <= reading.updated_at);
}

#[tokio::test]
async fn biorhythm_reference_reading() {
    let orch = orchestrator();
    let reading = orch
        .run(
            "biorhythm",
            json!({
                "birth_date": "1990-05-15",
                "target_date": "2024-01-15"
            }),
        )
        .await
        .unwrap();

    assert_eq!(reading.output.raw_data["days_alive"], 12298);
    for key in [
        "physical_percentage",
        "emotional_percentage",
        "intellectual_percentage",
    ] {
        let v = reading.output.raw_data[key].as_f64().unwrap();
        assert!((-100.0..=100.0).contains(&v), "{} out of range", key);
    }
    assert!(reading.output.raw_data["critical_day"].is_boolean());
}

#[tokio::test]
async fn human_design_reference_reading() {
    let orch = orchestrator();
    let reading = orch
        .run(
            "human_design",
            json!({
                "birth_date": "1991-08-13",
                "birth_time": "13:31",
                "birth_location": [12.9716, 77.5946],
                "timezone": "Asia/Kolkata"
            }),
        )
        .await
        .unwrap();

    let raw = &reading.output.raw_data;
    let p_sun = raw["personality_gates"]["sun"]["number"].as_u64().unwrap();
    let d_sun = raw["design_gates"]["sun"]["number"].as_u64().unwrap();
    assert!((1..=64).contains(&p_sun));
    assert!((1..=64).contains(&d_sun));

    // Profile pattern: "<1-6>/<1-6> <word>/<word>"
    let profile = raw["profile"].as_str().unwrap();
    let (lines, names) = profile.split_once(' ').unwrap();
    let (p, d) = lines.split_once('/').unwrap();
    assert!((1..=6).contains(&p.parse::<u8>().unwrap()));
    assert!((1..=6).contains(&d.parse::<u8>().unwrap()));
    assert_eq!(names.split('/').count(), 2);
}

#[tokio::test]
async fn cache_key_stability_under_irrelevant_fields() {
    let orch = orchestrator();
    let base = json!({
        "full_name": "A",
        "birth_date": "2000-01-01",
        "reading_id": "abc",
        "store_reading": false
    });
    let mut other = base.clone();
    other["reading_id"] = json!("xyz");

    let first = orch.run("numerology", base).await.unwrap();
    let second = orch.run("numerology", other).await.unwrap();

    let key_a = &first.kv_cache_keys[0];
    let key_b = &second.kv_cache_keys[0];
    assert_eq!(key_a, key_b);
    assert!(key_a.starts_with("calc:numerology:"));
}

#[tokio::test]
async fn batch_with_unknown_engine_isolates_error() {
    let orch = orchestrator();
    let outcome = orch
        .run_many(
            vec![
                (
                    "numerology".to_string(),
                    json!({ "full_name": "John Smith", "birth_date": "1990-05-15" }),
                ),
                ("nonexistent".to_string(), json!({})),
            ],
            BatchMode::Parallel,
        )
        .await;

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.get("numerology").unwrap().is_ok());
    assert!(matches!(
        outcome.get("nonexistent").unwrap(),
        Err(EngineError::UnknownEngine(_))
    ));
}

#[tokio::test]
async fn consent_gating_for_biometric_engines() {
    let orch = orchestrator();
    for engine in ["face_reading", "biofield"] {
        let err = orch
            .run(
                engine,
                json!({
                    "image_data": "Zm9v",
                    "data_processing_consent": false
                }),
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, EngineError::ConsentRequired(_)),
            "{} did not gate on consent",
            engine
        );
    }

    // With consent the biofield engine runs and carries the biometric cap.
    let reading = orch
        .run(
            "biofield",
            json!({
                "image_data": "Zm9v",
                "data_processing_consent": true,
                "privacy_level": "biometric"
            }),
        )
        .await
        .unwrap();
    let expires = reading.expires_at.expect("biometric readings must expire");
    assert!(expires - reading.created_at <= chrono::Duration::days(30));
}

#[tokio::test]
async fn every_engine_echoes_its_name() {
    let orch = orchestrator();
    let inputs = vec![
        ("numerology", json!({ "full_name": "Jane Doe", "birth_date": "1985-11-22" })),
        ("biorhythm", json!({ "birth_date": "1985-11-22" })),
        (
            "human_design",
            json!({
                "birth_date": "1985-11-22", "birth_time": "06:45",
                "birth_location": [51.5074, -0.1278], "timezone": "Europe/London"
            }),
        ),
        (
            "vimshottari",
            json!({
                "birth_date": "1985-11-22", "birth_time": "06:45",
                "birth_location": [51.5074, -0.1278], "timezone": "Europe/London"
            }),
        ),
        (
            "gene_keys",
            json!({
                "birth_date": "1985-11-22", "birth_time": "06:45",
                "birth_location": [51.5074, -0.1278], "timezone": "Europe/London"
            }),
        ),
        ("tarot", json!({ "question": "What matters now?" })),
        ("iching", json!({ "question": "What matters now?" })),
        ("enneagram", json!({ "identification_method": "self_select", "selected_type": 9 })),
        ("sacred_geometry", json!({ "intention": "balance" })),
        ("sigil_forge", json!({ "intention": "clarity" })),
        (
            "face_reading",
            json!({ "birth_date": "1985-11-22", "data_processing_consent": true }),
        ),
        (
            "biofield",
            json!({ "image_data": "Zm8=", "data_processing_consent": true }),
        ),
        ("vedicclock_tcm", json!({ "birth_date": "1985-11-22" })),
    ];

    for (engine, input) in inputs {
        let reading = orch
            .run(engine, input)
            .await
            .unwrap_or_else(|e| panic!("{} failed: {}", engine, e));
        assert_eq!(reading.output.engine_name, engine);
        assert!((0.0..=1.0).contains(&reading.output.confidence_score));
    }
}
