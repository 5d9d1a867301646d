//! API request handlers

use crate::error::ApiError;
use crate::state::AppState;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use survey_core::{
    Camera, GeoPoint, Leg, PlanFile, Spacing, SurveyArea, SurveyMetrics, SurveyParameters,
    SurveyPlan, compute_spacing, plan,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct CamerasResponse {
    pub default: String,
    pub cameras: Vec<Camera>,
}

#[derive(Serialize)]
pub struct HomeResponse {
    pub home: GeoPoint,
}

#[derive(Deserialize)]
pub struct CenterRequest {
    pub aoi: Vec<GeoPoint>,
}

/// A preset name or a full custom camera
#[derive(Deserialize)]
#[serde(untagged)]
pub enum CameraChoice {
    Preset(String),
    Custom(Camera),
}

#[derive(Deserialize)]
pub struct PlanRequest {
    /// Area of interest ring; absent when nothing has been drawn
    #[serde(default)]
    pub aoi: Option<Vec<GeoPoint>>,
    /// Overrides the stored home for this request only
    #[serde(default)]
    pub home: Option<GeoPoint>,
    #[serde(default)]
    pub camera: Option<CameraChoice>,
    #[serde(default)]
    pub parameters: SurveyParameters,
}

#[derive(Serialize)]
pub struct SegmentResponse {
    pub index: usize,
    pub leg_count: usize,
    pub distance_m: f64,
    pub time_s: f64,
    pub over_budget: bool,
    pub path: Vec<GeoPoint>,
}

#[derive(Serialize)]
pub struct PlanResponse {
    pub plan_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub home: GeoPoint,
    pub camera: String,
    pub spacing: Spacing,
    pub legs: Vec<Vec<GeoPoint>>,
    pub path: Vec<GeoPoint>,
    pub entry: Option<[GeoPoint; 2]>,
    pub return_leg: Option<[GeoPoint; 2]>,
    pub segment_budget_s: f64,
    pub segments: Vec<SegmentResponse>,
    pub metrics: SurveyMetrics,
    pub fallback_count: usize,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct SegmentMission {
    pub index: usize,
    pub filename: String,
    pub plan: PlanFile,
}

// ============================================================================
// HEALTH & METRICS HANDLERS
// ============================================================================

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.export()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

// ============================================================================
// CAMERA & HOME HANDLERS
// ============================================================================

pub async fn list_cameras(State(state): State<AppState>) -> impl IntoResponse {
    Json(CamerasResponse {
        default: state.default_camera.name.clone(),
        cameras: Camera::presets(),
    })
}

pub async fn get_home(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state
        .home()
        .map(|home| Json(HomeResponse { home }))
        .ok_or_else(|| ApiError::not_found("Home position has not been set"))
}

pub async fn set_home(
    State(state): State<AppState>,
    Json(home): Json<GeoPoint>,
) -> Result<impl IntoResponse, ApiError> {
    if !home.is_valid() {
        return Err(ApiError::bad_request(format!(
            "Invalid home position {}, {}",
            home.latitude, home.longitude
        )));
    }

    state.set_home(home);
    Ok(Json(HomeResponse { home }))
}

/// Move home to the center of the area's bounding box
pub async fn home_to_center(
    State(state): State<AppState>,
    Json(req): Json<CenterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let home = SurveyArea::from_ring(req.aoi)
        .and_then(|area| area.center())
        .ok_or_else(|| ApiError::bad_request("Area needs at least three distinct vertices"))?;

    state.set_home(home);
    Ok(Json(HomeResponse { home }))
}

// ============================================================================
// PLANNING HANDLERS
// ============================================================================

pub async fn create_plan(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let planned = run_plan(&state, req).await?;
    let plan = planned.plan;

    let segments: Vec<SegmentResponse> = plan
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| SegmentResponse {
            index,
            leg_count: segment.legs.len(),
            distance_m: segment.distance_m,
            time_s: segment.time_s,
            over_budget: plan.over_budget_segments.contains(&index),
            path: segment.path.clone(),
        })
        .collect();

    Ok(Json(PlanResponse {
        plan_id: planned.id,
        generated_at: Utc::now(),
        home: planned.home,
        camera: planned.camera,
        spacing: plan.spacing,
        legs: leg_points(&plan.legs),
        path: plan.path,
        entry: plan.entry,
        return_leg: plan.return_leg,
        segment_budget_s: plan.segment_budget_s,
        segments,
        metrics: plan.metrics,
        fallback_count: plan.fallback_count,
        warnings: plan.warnings,
    }))
}

/// Whole-survey mission file as a download
pub async fn export_mission(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let planned = run_plan(&state, req).await?;
    let body = planned.plan.mission.to_json()?;
    state.metrics.record_mission_export("full", 1);

    let disposition = format!("attachment; filename=\"survey-{}.plan\"", planned.id);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// One mission file per battery segment
pub async fn export_segment_missions(
    State(state): State<AppState>,
    Json(req): Json<PlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let planned = run_plan(&state, req).await?;

    let missions: Vec<SegmentMission> = planned
        .plan
        .segment_missions()
        .into_iter()
        .enumerate()
        .map(|(index, plan)| SegmentMission {
            index,
            filename: format!("survey-{}-segment-{:02}.plan", planned.id, index + 1),
            plan,
        })
        .collect();

    state.metrics.record_mission_export("segments", missions.len());
    Ok(Json(missions))
}

// ============================================================================
// HELPERS
// ============================================================================

struct PlannedSurvey {
    id: Uuid,
    home: GeoPoint,
    camera: String,
    plan: SurveyPlan,
}

async fn run_plan(state: &AppState, req: PlanRequest) -> Result<PlannedSurvey, ApiError> {
    let camera = match req.camera {
        None => state.default_camera.clone(),
        Some(CameraChoice::Preset(name)) => Camera::preset(&name)?,
        Some(CameraChoice::Custom(camera)) => camera,
    };

    if let Some(home) = req.home.filter(|h| !h.is_valid()) {
        return Err(ApiError::bad_request(format!(
            "Invalid home position {}, {}",
            home.latitude, home.longitude
        )));
    }

    let area = req.aoi.map(SurveyArea::new);
    let home = resolve_home(req.home, state.home(), area.as_ref());
    let params = req.parameters;

    let max_legs = state.config.max_legs;
    if let Some(estimate) = area.as_ref().and_then(|a| estimated_legs(a, &camera, &params)) {
        if estimate > max_legs {
            warn!(estimate, max_legs, "refusing plan above leg limit");
            return Err(ApiError::bad_request(format!(
                "About {} legs needed, limit is {}; fly higher or lower the sidelap",
                estimate, max_legs
            )));
        }
    }

    let camera_name = camera.name.clone();
    let (mut plan, elapsed) = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let plan = plan(area.as_ref(), &home, &camera, &params);
        (plan, started.elapsed())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("planning task failed: {}", e)))?;
    state.metrics.record_plan(&plan, elapsed);

    // Concave areas can cut one offset line into several legs
    if plan.legs.len() > max_legs {
        warn!(legs = plan.legs.len(), max_legs, "plan exceeds leg limit");
        plan.warnings.push(format!(
            "{} legs exceeds the configured limit of {}",
            plan.legs.len(),
            max_legs
        ));
    }

    let id = Uuid::new_v4();
    info!(
        plan_id = %id,
        legs = plan.legs.len(),
        segments = plan.segments.len(),
        "plan computed"
    );

    Ok(PlannedSurvey {
        id,
        home,
        camera: camera_name,
        plan,
    })
}

/// Offset lines a grid over `area` would need, from the bounding-box diagonal
///
/// `None` when the spacing is unusable; the planner reports that itself.
fn estimated_legs(area: &SurveyArea, camera: &Camera, params: &SurveyParameters) -> Option<usize> {
    let spacing = compute_spacing(params.height_m, camera, params.overlap, params.sidelap);
    if !area.is_valid() || !spacing.is_valid() {
        return None;
    }
    let passes = if params.crosshatch { 2.0 } else { 1.0 };
    let diagonal = area.bounds()?.diagonal_m();
    Some((passes * diagonal / spacing.across_track_m).ceil() as usize)
}

/// Request home, then stored home, then the area's center
fn resolve_home(
    requested: Option<GeoPoint>,
    stored: Option<GeoPoint>,
    area: Option<&SurveyArea>,
) -> GeoPoint {
    requested
        .or(stored)
        .or_else(|| area.and_then(SurveyArea::center))
        .unwrap_or_else(|| {
            debug!("no home or area, planning from the origin");
            GeoPoint::default()
        })
}

fn leg_points(legs: &[Leg]) -> Vec<Vec<GeoPoint>> {
    legs.iter().map(|l| l.points().to_vec()).collect()
}
