//! API route definitions

use crate::handlers;
use crate::state::AppState;

use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::time::{Duration, Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors_permissive {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:8080"))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health & Metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Cameras & Home
        .route("/api/v1/cameras", get(handlers::list_cameras))
        .route(
            "/api/v1/home",
            get(handlers::get_home).put(handlers::set_home),
        )
        .route("/api/v1/home/center", post(handlers::home_to_center))
        // Planning
        .route("/api/v1/plan", post(handlers::create_plan))
        .route("/api/v1/mission", post(handlers::export_mission))
        .route(
            "/api/v1/mission/segments",
            post(handlers::export_segment_missions),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Count and time every routed request
async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let response = next.run(req).await;

    state.metrics.record_api_request(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, StatusCode, header},
    };
    use serde_json::{Value, json};
    use survey_core::GeoPoint;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::new(ApiConfig::default()).unwrap())
    }

    /// 300 m square around central Zurich
    fn square_aoi() -> Value {
        let c = GeoPoint::new(47.3769, 8.5417);
        let north = c.destination(150.0, 0.0).latitude;
        let south = c.destination(150.0, 180.0).latitude;
        let east = c.destination(150.0, 90.0).longitude;
        let west = c.destination(150.0, 270.0).longitude;
        json!([
            {"latitude": north, "longitude": west},
            {"latitude": north, "longitude": east},
            {"latitude": south, "longitude": east},
            {"latitude": south, "longitude": west},
        ])
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send_json(&app(), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_list_cameras() {
        let (status, body) = send_json(&app(), Method::GET, "/api/v1/cameras", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default"], "DJI Mavic 3 Enterprise");
        assert_eq!(body["cameras"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_home_roundtrip() {
        let app = app();

        let (status, _) = send(&app, Method::GET, "/api/v1/home", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let home = json!({"latitude": 47.37, "longitude": 8.54});
        let (status, _) = send(&app, Method::PUT, "/api/v1/home", Some(home)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&app, Method::GET, "/api/v1/home", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["home"]["latitude"], 47.37);
    }

    #[tokio::test]
    async fn test_invalid_home_rejected() {
        let home = json!({"latitude": 123.0, "longitude": 8.54});
        let (status, body) = send_json(&app(), Method::PUT, "/api/v1/home", Some(home)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_home_to_center() {
        let app = app();
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/v1/home/center",
            Some(json!({"aoi": square_aoi()})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!((body["home"]["latitude"].as_f64().unwrap() - 47.3769).abs() < 1e-6);
        assert!((body["home"]["longitude"].as_f64().unwrap() - 8.5417).abs() < 1e-6);

        let degenerate = json!({"aoi": [{"latitude": 1.0, "longitude": 1.0}]});
        let (status, _) = send(&app, Method::POST, "/api/v1/home/center", Some(degenerate)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plan_square() {
        let request = json!({
            "aoi": square_aoi(),
            "home": {"latitude": 47.3750, "longitude": 8.5400},
            "camera": "Generic 1/2.3in",
            "parameters": {"height_m": 100.0}
        });
        let (status, body) = send_json(&app(), Method::POST, "/api/v1/plan", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["plan_id"].is_string());
        assert_eq!(body["camera"], "Generic 1/2.3in");
        assert!(!body["legs"].as_array().unwrap().is_empty());
        assert!(body["entry"].is_array());
        assert!(body["metrics"]["photo_count"].as_u64().unwrap() > 0);
        assert_eq!(body["warnings"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_plan_degenerate_area_is_empty() {
        let request = json!({
            "aoi": [{"latitude": 47.0, "longitude": 8.0}, {"latitude": 47.001, "longitude": 8.0}]
        });
        let (status, body) = send_json(&app(), Method::POST, "/api/v1/plan", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["legs"].as_array().unwrap().is_empty());
        assert_eq!(body["metrics"]["total_distance_m"], 0.0);
        assert_eq!(body["metrics"]["photo_count"], 0);
        assert!(!body["warnings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plan_above_leg_limit_is_refused() {
        let app = app();
        // 10 cm lines over a 300 m square would need thousands of legs
        let request = json!({
            "aoi": square_aoi(),
            "camera": "Generic 1/2.3in",
            "parameters": {"height_m": 0.2}
        });
        let (status, body) = send_json(&app, Method::POST, "/api/v1/plan", Some(request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("limit is 2000"));

        let (_, bytes) = send(&app, Method::GET, "/metrics", None).await;
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("survey_plans_total 0"));
    }

    #[tokio::test]
    async fn test_plan_unknown_camera() {
        let request = json!({"aoi": square_aoi(), "camera": "Pinhole 9000"});
        let (status, body) = send_json(&app(), Method::POST, "/api/v1/plan", Some(request)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_plan_custom_camera() {
        let request = json!({
            "aoi": square_aoi(),
            "camera": {
                "name": "Survey cam",
                "sensor_width_mm": 6.3,
                "sensor_height_mm": 4.7,
                "focal_length_mm": 4.5,
                "image_width_px": 4000,
                "image_height_px": 3000
            }
        });
        let (status, body) = send_json(&app(), Method::POST, "/api/v1/plan", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["camera"], "Survey cam");
        assert!((body["spacing"]["across_track_m"].as_f64().unwrap() - 49.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_mission_download() {
        let request = json!({"aoi": square_aoi(), "parameters": {"height_m": 80.0}});
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/mission")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(request.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"survey-"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let plan: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(plan["fileType"], "Plan");
        assert_eq!(plan["mission"]["items"][0]["command"], 206);
        assert_eq!(plan["mission"]["items"][1]["params"][6], 80.0);
    }

    #[tokio::test]
    async fn test_segment_missions() {
        let request = json!({
            "aoi": square_aoi(),
            "camera": "Generic 1/2.3in",
            "parameters": {"battery_minutes": 1.5}
        });
        let (status, body) =
            send_json(&app(), Method::POST, "/api/v1/mission/segments", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        let missions = body.as_array().unwrap();
        assert!(missions.len() > 1);
        for mission in missions {
            assert_eq!(mission["plan"]["mission"]["items"][0]["doJumpId"], 1);
            assert!(mission["filename"].as_str().unwrap().ends_with(".plan"));
        }
    }

    #[tokio::test]
    async fn test_metrics_after_plan() {
        let app = app();
        let request = json!({"aoi": square_aoi()});
        send(&app, Method::POST, "/api/v1/plan", Some(request)).await;

        let (status, bytes) = send(&app, Method::GET, "/metrics", None).await;
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(text.contains("survey_plans_total 1"));
        assert!(text.contains("path=\"/api/v1/plan\""));
    }
}
