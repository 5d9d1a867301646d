//! End-to-end planning pipeline
//!
//! `Spacing -> Grid -> Path -> {Segmenter, Metrics} -> Mission`. Each stage
//! depends only on its declared inputs, so [`plan`] is deterministic and may be
//! called again whenever the area, home, camera or parameters change.

use serde::Serialize;
use tracing::debug;

use crate::camera::{Camera, Spacing, compute_spacing};
use crate::error::CoreError;
use crate::geo::{GeoPoint, SurveyArea};
use crate::grid::build_coverage;
use crate::metrics::{MetricsInput, SurveyMetrics, compute_metrics};
use crate::mission::{MissionOptions, PlanFile};
use crate::path::compose_path;
use crate::segment::{Segment, effective_budget_s, segment_legs};
use crate::{Leg, SurveyParameters};

/// Everything produced for one set of planning inputs
#[derive(Debug, Clone, Serialize)]
pub struct SurveyPlan {
    pub spacing: Spacing,
    pub legs: Vec<Leg>,
    /// Stitched route oriented toward home
    pub path: Vec<GeoPoint>,
    pub entry: Option<[GeoPoint; 2]>,
    pub return_leg: Option<[GeoPoint; 2]>,
    pub segments: Vec<Segment>,
    /// Usable flight time per battery in seconds
    pub segment_budget_s: f64,
    /// Indices of segments whose time exceeds the budget
    pub over_budget_segments: Vec<usize>,
    pub metrics: SurveyMetrics,
    pub mission: PlanFile,
    /// Candidate lines kept unclipped after a degenerate split
    pub fallback_count: usize,
    /// Problems with the inputs that left the plan empty or approximate
    pub warnings: Vec<String>,
    #[serde(skip)]
    mission_options: MissionOptions,
}

impl SurveyPlan {
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// One mission file per battery segment, each numbered from 1
    pub fn segment_missions(&self) -> Vec<PlanFile> {
        self.segments
            .iter()
            .map(|segment| PlanFile::from_legs(&segment.legs, &self.mission_options))
            .collect()
    }
}

/// Run the full pipeline
///
/// Never fails: an absent or degenerate area, a non-positive height or speed,
/// or a camera with unusable optics yields an empty (but well-formed) plan and
/// a warning describing why.
pub fn plan(
    aoi: Option<&SurveyArea>,
    home: &GeoPoint,
    camera: &Camera,
    params: &SurveyParameters,
) -> SurveyPlan {
    let mut warnings: Vec<String> = input_problems(aoi, camera, params)
        .iter()
        .map(ToString::to_string)
        .collect();

    let spacing = compute_spacing(params.height_m, camera, params.overlap, params.sidelap);
    if let Err(e) = spacing.validate() {
        warnings.push(e.to_string());
    }

    let grid = build_coverage(
        aoi,
        params.heading(),
        spacing.across_track_m,
        params.crosshatch,
    );
    if grid.fallback_count > 0 {
        warnings.push(
            CoreError::geometry_degenerate(format!(
                "{} line(s) could not be clipped and may extend past the area",
                grid.fallback_count
            ))
            .to_string(),
        );
    }

    let route = compose_path(&grid.legs, home);
    let segments = segment_legs(&grid.legs, params);

    let segment_budget_s = effective_budget_s(params.battery_minutes);
    let over_budget_segments: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_over_budget(segment_budget_s))
        .map(|(i, _)| i)
        .collect();
    if !over_budget_segments.is_empty() {
        warnings.push(format!(
            "{} segment(s) exceed the battery budget of {:.0} s",
            over_budget_segments.len(),
            segment_budget_s
        ));
    }

    let area_m2 = aoi.filter(|a| a.is_valid()).map_or(0.0, SurveyArea::area_m2);
    let metrics = compute_metrics(
        &route,
        &MetricsInput {
            spacing,
            gsd_cm_per_px: camera.gsd_cm_per_px(params.height_m),
            speed_mps: params.speed_mps,
            turn_time_s: params.turn_time_s,
            leg_count: grid.legs.len(),
            segment_count: segments.len(),
            area_m2,
        },
    );

    let mission_options = MissionOptions {
        home: *home,
        relative_altitude_m: params.height_m,
        speed_mps: params.speed_mps,
        trigger_distance_m: spacing.along_track_m,
        firmware_type: None,
        vehicle_type: None,
    };
    let mission = PlanFile::from_legs(&grid.legs, &mission_options);

    debug!(
        legs = grid.legs.len(),
        segments = segments.len(),
        total_distance_m = metrics.total_distance_m,
        warnings = warnings.len(),
        "survey planned"
    );

    SurveyPlan {
        spacing,
        legs: grid.legs,
        path: route.path,
        entry: route.entry,
        return_leg: route.return_leg,
        segments,
        segment_budget_s,
        over_budget_segments,
        metrics,
        mission,
        fallback_count: grid.fallback_count,
        warnings,
        mission_options,
    }
}

fn input_problems(
    aoi: Option<&SurveyArea>,
    camera: &Camera,
    params: &SurveyParameters,
) -> Vec<CoreError> {
    let mut problems = Vec::new();

    match aoi {
        None => problems.push(CoreError::invalid_input("no area of interest")),
        Some(area) if !area.is_valid() => problems.push(CoreError::invalid_input(format!(
            "area of interest has {} distinct vertices, at least 3 required",
            area.distinct_vertex_count()
        ))),
        Some(_) => {}
    }
    if !(params.height_m > 0.0) {
        problems.push(CoreError::invalid_input("height must be positive"));
    }
    if !(params.speed_mps > 0.0) {
        problems.push(CoreError::invalid_input("speed must be positive"));
    }
    if let Err(e) = camera.validate() {
        problems.push(e);
    }

    problems
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> GeoPoint {
        GeoPoint::new(47.3760, 8.5400)
    }

    fn square(center: GeoPoint, half_side_m: f64) -> SurveyArea {
        let north = center.destination(half_side_m, 0.0).latitude;
        let south = center.destination(half_side_m, 180.0).latitude;
        let east = center.destination(half_side_m, 90.0).longitude;
        let west = center.destination(half_side_m, 270.0).longitude;
        SurveyArea::new(vec![
            GeoPoint::new(north, west),
            GeoPoint::new(north, east),
            GeoPoint::new(south, east),
            GeoPoint::new(south, west),
        ])
    }

    fn generic() -> Camera {
        Camera::preset("Generic 1/2.3in").unwrap()
    }

    #[test]
    fn test_square_plan() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 150.0);
        let params = SurveyParameters::default();
        let plan = plan(Some(&area), &home(), &generic(), &params);

        assert!(!plan.is_empty());
        assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);
        assert_eq!(plan.metrics.leg_count, plan.legs.len());
        assert_eq!(plan.metrics.segment_count, plan.segments.len());
        assert!(plan.entry.is_some());
        assert!(plan.return_leg.is_some());
        assert!(plan.metrics.total_distance_m > plan.metrics.main_distance_m);
        assert!(plan.metrics.photo_count > 0);
        assert!((plan.metrics.area_hectares - 9.0).abs() < 0.1);

        let waypoints: usize = plan.legs.iter().map(|l| l.points().len()).sum();
        assert_eq!(plan.mission.mission.items.len(), waypoints + 1);
        assert_eq!(plan.mission.mission.items[0].params[0], plan.spacing.along_track_m);
    }

    #[test]
    fn test_path_starts_near_home() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 150.0);
        let plan = plan(Some(&area), &home(), &generic(), &SurveyParameters::default());

        let first = plan.path.first().unwrap();
        let last = plan.path.last().unwrap();
        assert!(home().distance_to(first) <= home().distance_to(last));
        assert_eq!(plan.entry, Some([home(), *first]));
    }

    #[test]
    fn test_invalid_area_gives_zero_metrics() {
        let area = SurveyArea::new(vec![GeoPoint::new(47.0, 8.0), GeoPoint::new(47.001, 8.0)]);
        let plan = plan(Some(&area), &home(), &generic(), &SurveyParameters::default());

        assert!(plan.is_empty());
        assert!(plan.path.is_empty());
        assert!(plan.segments.is_empty());
        assert_eq!(plan.metrics.main_distance_m, 0.0);
        assert_eq!(plan.metrics.transit_distance_m, 0.0);
        assert_eq!(plan.metrics.estimated_minutes, 0.0);
        assert_eq!(plan.metrics.photo_count, 0);
        assert_eq!(plan.metrics.area_m2, 0.0);
        assert_eq!(plan.mission.mission.items.len(), 1);
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_missing_area_is_reported() {
        let plan = plan(None, &home(), &generic(), &SurveyParameters::default());

        assert!(plan.is_empty());
        assert!(plan.warnings[0].contains("no area of interest"));
    }

    #[test]
    fn test_zero_focal_length_surfaces_configuration_error() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 150.0);
        let camera = Camera {
            focal_length_mm: 0.0,
            ..generic()
        };
        let plan = plan(Some(&area), &home(), &camera, &SurveyParameters::default());

        assert!(plan.is_empty());
        assert!(!plan.spacing.along_track_m.is_finite());
        assert!(plan.warnings.iter().any(|w| w.contains("focal length")));
        assert!(plan.warnings.iter().any(|w| w.contains("not finite")));
    }

    #[test]
    fn test_below_ground_height_reports_zero_spacing() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 150.0);
        let params = SurveyParameters {
            height_m: -100.0,
            ..Default::default()
        };
        let plan = plan(Some(&area), &home(), &generic(), &params);

        assert!(plan.is_empty());
        assert!(plan.warnings.iter().any(|w| w.contains("height must be positive")));
        assert_eq!(plan.spacing.along_track_m, 0.0);
        assert_eq!(plan.spacing.across_track_m, 0.0);
        assert_eq!(plan.metrics.trigger_distance_m, 0.0);
        assert_eq!(plan.metrics.line_spacing_m, 0.0);
        assert_eq!(plan.metrics.gsd_cm_per_px, 0.0);
        assert_eq!(plan.metrics.photo_count, 0);
        assert_eq!(plan.mission.mission.items[0].params[0], 0.0);
    }

    #[test]
    fn test_small_battery_flags_segments() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 500.0);
        let params = SurveyParameters {
            battery_minutes: 1.0,
            ..Default::default()
        };
        let plan = plan(Some(&area), &home(), &generic(), &params);

        assert_eq!(plan.segment_budget_s, 60.0);
        assert!(plan.segments.len() > 1);
        // Every 1 km leg takes 100 s plus the turn, so every segment is over
        assert_eq!(plan.over_budget_segments.len(), plan.segments.len());
        assert!(plan.warnings.iter().any(|w| w.contains("battery budget")));
    }

    #[test]
    fn test_segment_missions_number_from_one() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 500.0);
        let params = SurveyParameters {
            battery_minutes: 5.0,
            ..Default::default()
        };
        let plan = plan(Some(&area), &home(), &generic(), &params);
        let missions = plan.segment_missions();

        assert_eq!(missions.len(), plan.segments.len());
        for (file, segment) in missions.iter().zip(&plan.segments) {
            let waypoints: usize = segment.legs.iter().map(|l| l.points().len()).sum();
            assert_eq!(file.mission.items.len(), waypoints + 1);
            assert_eq!(file.mission.items[0].do_jump_id, 1);
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 150.0);
        let params = SurveyParameters {
            heading_deg: 33.0,
            crosshatch: true,
            ..Default::default()
        };

        let a = plan(Some(&area), &home(), &generic(), &params);
        let b = plan(Some(&area), &home(), &generic(), &params);
        assert_eq!(a.legs, b.legs);
        assert_eq!(a.mission, b.mission);
        assert_eq!(a.metrics, b.metrics);
    }
}
