//! HTTP surface tests: routes, envelope shape, error status mapping.

use arcana_api::{build_app_state, create_router, ServiceConfig};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> axum::Router {
    let config = ServiceConfig::default();
    let state = build_app_state(&config).await;
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_lists_engines() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["engines_available"].as_array().unwrap().len(), 13);
    assert_eq!(body["workflows_available"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn engine_listing_has_descriptions() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/engines").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["count"], 13);
    let first = &body["engines"][0];
    assert!(first["name"].is_string());
    assert!(first["description"].is_string());
}

#[tokio::test]
async fn calculate_returns_success_envelope() {
    let response = app()
        .await
        .oneshot(post_json(
            "/engines/numerology/calculate",
            json!({
                "input": {
                    "full_name": "John Smith",
                    "birth_date": "1990-05-15",
                    "store_reading": false
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["engine"], "numerology");
    assert!(body["processing_time_seconds"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].is_string());
    assert_eq!(body["data"]["raw_data"]["life_path"], 3);
    assert_eq!(body["data"]["engine_name"], "numerology");
}

#[tokio::test]
async fn unknown_engine_is_404_with_error_envelope() {
    let response = app()
        .await
        .oneshot(post_json(
            "/engines/crystal_ball/calculate",
            json!({ "input": {} }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNKNOWN_ENGINE");
}

#[tokio::test]
async fn invalid_input_is_422() {
    let response = app()
        .await
        .oneshot(post_json(
            "/engines/numerology/calculate",
            json!({ "input": { "full_name": "A" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(body["error"]["message"].as_str().unwrap().contains("birth_date"));
}

#[tokio::test]
async fn unknown_field_is_rejected() {
    let response = app()
        .await
        .oneshot(post_json(
            "/engines/numerology/calculate",
            json!({
                "input": {
                    "full_name": "A",
                    "birth_date": "1990-05-15",
                    "unexpected": 1
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn consent_violation_is_403() {
    let response = app()
        .await
        .oneshot(post_json(
            "/engines/biofield/calculate",
            json!({ "input": { "image_data": "Zm9v" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONSENT_REQUIRED");
}

#[tokio::test]
async fn unknown_workflow_is_404() {
    let response = app()
        .await
        .oneshot(post_json("/workflows/fortune_cookie/run", json!({ "input": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNKNOWN_WORKFLOW");
}

#[tokio::test]
async fn workflow_run_returns_synthesis() {
    let response = app()
        .await
        .oneshot(post_json(
            "/workflows/daily_guidance/run",
            json!({
                "input": {
                    "full_name": "Jane Smith",
                    "birth_date": "1985-11-22",
                    "store_reading": false
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["workflow_name"], "daily_guidance");
    assert!(body["data"]["synthesis"]["field_signature"]["field_coherence"].is_f64());
}

#[tokio::test]
async fn ephemeris_wrapper_returns_positions() {
    let response = app()
        .await
        .oneshot(post_json(
            "/swiss_ephemeris/calculate",
            json!({
                "input": {
                    "birth_date": "1991-08-13",
                    "birth_time": "13:31",
                    "birth_location": [12.9716, 77.5946],
                    "timezone": "Asia/Kolkata"
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["engine"], "swiss_ephemeris");
    assert_eq!(body["data"]["positions"].as_object().unwrap().len(), 13);
}
