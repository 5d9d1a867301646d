//! # Survey Telemetry - Planning Metrics
//!
//! Prometheus metrics for the survey planning service:
//! - Plans computed, with the legs and segments they produced
//! - Planning latency
//! - Degenerate-geometry fallbacks and unusable configurations
//! - Mission exports and HTTP requests

use std::time::Duration;

use prometheus::{
    Gauge, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry,
};
use survey_core::SurveyPlan;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metric registration failed: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Metrics collector for the survey planner
pub struct MetricsCollector {
    registry: Registry,

    // Planning metrics
    plans_total: IntCounter,
    empty_plans_total: IntCounter,
    invalid_config_total: IntCounter,
    clip_fallbacks_total: IntCounter,
    legs_total: IntCounter,
    segments_total: IntCounter,
    over_budget_segments_total: IntCounter,
    plan_duration: Histogram,

    // Last plan
    last_plan_distance: Gauge,
    last_plan_minutes: Gauge,
    last_plan_photos: IntGauge,

    // Missions
    mission_exports_total: IntCounterVec,
    home_updates_total: IntCounter,

    // API metrics
    api_requests_total: IntCounterVec,
    api_request_duration: HistogramVec,
}

impl MetricsCollector {
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let plans_total = IntCounter::new("survey_plans_total", "Survey plans computed")?;
        registry.register(Box::new(plans_total.clone()))?;

        let empty_plans_total = IntCounter::new(
            "survey_empty_plans_total",
            "Plans that produced no legs",
        )?;
        registry.register(Box::new(empty_plans_total.clone()))?;

        let invalid_config_total = IntCounter::new(
            "survey_invalid_configuration_total",
            "Plans whose camera configuration gave non-finite spacing",
        )?;
        registry.register(Box::new(invalid_config_total.clone()))?;

        let clip_fallbacks_total = IntCounter::new(
            "survey_clip_fallbacks_total",
            "Grid lines kept unclipped after a degenerate split",
        )?;
        registry.register(Box::new(clip_fallbacks_total.clone()))?;

        let legs_total = IntCounter::new("survey_legs_total", "Coverage legs produced")?;
        registry.register(Box::new(legs_total.clone()))?;

        let segments_total =
            IntCounter::new("survey_segments_total", "Battery segments produced")?;
        registry.register(Box::new(segments_total.clone()))?;

        let over_budget_segments_total = IntCounter::new(
            "survey_over_budget_segments_total",
            "Segments exceeding the battery budget",
        )?;
        registry.register(Box::new(over_budget_segments_total.clone()))?;

        let plan_duration = Histogram::with_opts(
            HistogramOpts::new("survey_plan_duration_seconds", "Time to compute one plan")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;
        registry.register(Box::new(plan_duration.clone()))?;

        let last_plan_distance = Gauge::new(
            "survey_last_plan_distance_meters",
            "Total distance of the most recent plan",
        )?;
        registry.register(Box::new(last_plan_distance.clone()))?;

        let last_plan_minutes = Gauge::new(
            "survey_last_plan_minutes",
            "Estimated flight time of the most recent plan",
        )?;
        registry.register(Box::new(last_plan_minutes.clone()))?;

        let last_plan_photos = IntGauge::new(
            "survey_last_plan_photos",
            "Photo count of the most recent plan",
        )?;
        registry.register(Box::new(last_plan_photos.clone()))?;

        let mission_exports_total = IntCounterVec::new(
            Opts::new("survey_mission_exports_total", "Mission files rendered"),
            &["kind"],
        )?;
        registry.register(Box::new(mission_exports_total.clone()))?;

        let home_updates_total =
            IntCounter::new("survey_home_updates_total", "Home position changes")?;
        registry.register(Box::new(home_updates_total.clone()))?;

        let api_requests_total = IntCounterVec::new(
            Opts::new("survey_api_requests_total", "API requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(api_requests_total.clone()))?;

        let api_request_duration = HistogramVec::new(
            HistogramOpts::new("survey_api_request_duration_seconds", "API request duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method", "path"],
        )?;
        registry.register(Box::new(api_request_duration.clone()))?;

        info!("Metrics collector initialized");

        Ok(Self {
            registry,
            plans_total,
            empty_plans_total,
            invalid_config_total,
            clip_fallbacks_total,
            legs_total,
            segments_total,
            over_budget_segments_total,
            plan_duration,
            last_plan_distance,
            last_plan_minutes,
            last_plan_photos,
            mission_exports_total,
            home_updates_total,
            api_requests_total,
            api_request_duration,
        })
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> TelemetryResult<String> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    // ========================================================================
    // PLANNING METRICS
    // ========================================================================

    /// Record one completed plan and how long it took
    pub fn record_plan(&self, plan: &SurveyPlan, elapsed: Duration) {
        self.plans_total.inc();
        self.plan_duration.observe(elapsed.as_secs_f64());

        if plan.is_empty() {
            self.empty_plans_total.inc();
        }
        if plan.spacing.validate().is_err() {
            self.invalid_config_total.inc();
        }

        self.clip_fallbacks_total.inc_by(plan.fallback_count as u64);
        self.legs_total.inc_by(plan.legs.len() as u64);
        self.segments_total.inc_by(plan.segments.len() as u64);
        self.over_budget_segments_total
            .inc_by(plan.over_budget_segments.len() as u64);

        self.last_plan_distance.set(plan.metrics.total_distance_m);
        self.last_plan_minutes.set(plan.metrics.estimated_minutes);
        self.last_plan_photos
            .set(i64::try_from(plan.metrics.photo_count).unwrap_or(i64::MAX));

        debug!(
            legs = plan.legs.len(),
            segments = plan.segments.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "plan recorded"
        );
    }

    /// Record a rendered mission file (`full` or `segments`)
    pub fn record_mission_export(&self, kind: &str, files: usize) {
        self.mission_exports_total
            .with_label_values(&[kind])
            .inc_by(files as u64);
    }

    pub fn record_home_update(&self) {
        self.home_updates_total.inc();
    }

    // ========================================================================
    // API METRICS
    // ========================================================================

    pub fn record_api_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        self.api_requests_total
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        self.api_request_duration
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::{Camera, GeoPoint, SurveyArea, SurveyParameters, plan};

    fn field() -> SurveyArea {
        let c = GeoPoint::new(47.3769, 8.5417);
        SurveyArea::new(vec![
            c.destination(200.0, 315.0),
            c.destination(200.0, 45.0),
            c.destination(200.0, 135.0),
            c.destination(200.0, 225.0),
        ])
    }

    #[test]
    fn test_metrics_creation() {
        assert!(MetricsCollector::new().is_ok());
    }

    #[test]
    fn test_record_plan() {
        let metrics = MetricsCollector::new().unwrap();
        let area = field();
        let plan = plan(
            Some(&area),
            &GeoPoint::new(47.376, 8.540),
            &Camera::default(),
            &SurveyParameters::default(),
        );

        metrics.record_plan(&plan, Duration::from_millis(3));

        assert_eq!(metrics.plans_total.get(), 1);
        assert_eq!(metrics.legs_total.get(), plan.legs.len() as u64);
        assert_eq!(metrics.empty_plans_total.get(), 0);
        assert_eq!(metrics.last_plan_photos.get(), plan.metrics.photo_count as i64);
    }

    #[test]
    fn test_empty_and_invalid_plans_counted() {
        let metrics = MetricsCollector::new().unwrap();
        let camera = Camera {
            focal_length_mm: 0.0,
            ..Camera::default()
        };
        let area = field();
        let plan = plan(
            Some(&area),
            &GeoPoint::new(47.376, 8.540),
            &camera,
            &SurveyParameters::default(),
        );

        metrics.record_plan(&plan, Duration::from_micros(50));

        assert_eq!(metrics.empty_plans_total.get(), 1);
        assert_eq!(metrics.invalid_config_total.get(), 1);
    }

    #[test]
    fn test_metrics_export() {
        let metrics = MetricsCollector::new().unwrap();

        metrics.record_home_update();
        metrics.record_mission_export("segments", 3);
        metrics.record_api_request("POST", "/api/v1/plan", 200, 0.004);

        let export = metrics.export().unwrap();
        assert!(export.contains("survey_home_updates_total 1"));
        assert!(export.contains("survey_mission_exports_total{kind=\"segments\"} 3"));
        assert!(export.contains("survey_api_requests_total"));
    }
}
