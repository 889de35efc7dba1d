use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use solar_quote_engine::{api, config::Config, controller::AppState};
use tower::ServiceExt;

fn app() -> Router {
    let cfg = Config::default();
    let state = AppState::new(cfg.clone()).unwrap();
    api::router(state, &cfg)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn residential_quote_returns_envelope() {
    let (status, body) = get(
        "/api/v1/quote?region=mainland&client_mode=residential\
         &roof_surface_m2=40&yearly_consumption_kwh=5000&yearly_utility_payment=1500",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_string());

    let scenario = &body["data"]["scenario"];
    assert_eq!(scenario["region"], "mainland");
    assert_eq!(scenario["mode"], "residential");
    assert_eq!(scenario["schedule_with_subsidy"].as_array().unwrap().len(), 10);
    assert!(scenario.get("tier_quotes").is_none());
    assert_eq!(body["data"]["monthly_production_kwh"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn professional_quote_includes_every_tier() {
    let (status, body) = get(
        "/api/v1/quote?region=island&client_mode=professional&price_level=max-discount\
         &roof_surface_m2=150&yearly_consumption_kwh=40000&yearly_utility_payment=9000\
         &discount_amount=1000&latitude=14.6&longitude=-61.0",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let scenario = &body["data"]["scenario"];
    assert_eq!(scenario["kit"]["price_level"], "max-discount");
    assert_eq!(scenario["tier_quotes"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn manual_kit_outside_catalog_is_rejected() {
    let (status, body) = get(
        "/api/v1/quote?region=mainland&client_mode=residential&manual_kit_power_w=1234\
         &roof_surface_m2=40&yearly_consumption_kwh=5000&yearly_utility_payment=1500",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn negative_amounts_fail_validation() {
    let (status, body) = get(
        "/api/v1/quote?region=mainland&client_mode=residential&discount_amount=-50\
         &roof_surface_m2=40&yearly_consumption_kwh=5000&yearly_utility_payment=1500",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn infinite_measurements_fail_validation() {
    let (status, body) = get(
        "/api/v1/quote?region=mainland&client_mode=residential\
         &roof_surface_m2=inf&yearly_consumption_kwh=5000&yearly_utility_payment=1500",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn unknown_region_is_a_bad_request() {
    let (status, _) = get(
        "/api/v1/quote?region=atlantis&client_mode=residential\
         &roof_surface_m2=40&yearly_consumption_kwh=5000&yearly_utility_payment=1500",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regions_lists_builtin_tables() {
    let (status, body) = get("/api/v1/regions").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["regions"].as_array().unwrap().len(), 2);
    assert_eq!(body["metadata"]["total_count"], 2);
    assert_eq!(body["data"]["tariffs"]["retail_rate_per_kwh"], 0.2516);
}

#[tokio::test]
async fn healthz_reports_loaded_regions() {
    let (status, body) = get("/api/v1/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["regions_loaded"], 2);
}
