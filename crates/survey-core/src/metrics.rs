//! Survey summary figures: spacing, distances, time and photo count

use serde::{Deserialize, Serialize};

use crate::camera::Spacing;
use crate::path::ComposedPath;

/// Summary figures reported alongside a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyMetrics {
    /// Along-track spacing (photo trigger distance) in meters
    pub trigger_distance_m: f64,
    /// Across-track spacing between legs in meters
    pub line_spacing_m: f64,
    /// Ground sample distance in cm/px
    pub gsd_cm_per_px: f64,
    /// Length of the coverage route in meters
    pub main_distance_m: f64,
    /// Entry plus return transit in meters
    pub transit_distance_m: f64,
    /// Main plus transit distance in meters
    pub total_distance_m: f64,
    pub estimated_minutes: f64,
    pub photo_count: u64,
    pub leg_count: usize,
    pub segment_count: usize,
    pub area_m2: f64,
    pub area_hectares: f64,
}

/// Flight time estimate in minutes
///
/// Distance over speed plus one turn between each pair of legs. Zero when the
/// speed or the distance is not positive.
pub fn estimated_minutes(total_distance_m: f64, speed_mps: f64, leg_count: usize, turn_time_s: f64) -> f64 {
    if !(speed_mps > 0.0) || !(total_distance_m > 0.0) {
        return 0.0;
    }
    let turns = leg_count.saturating_sub(1) as f64 * turn_time_s.max(0.0);
    (total_distance_m / speed_mps + turns) / 60.0
}

/// Photos needed to cover `main_distance_m` at one trigger per `along_track_m`
pub fn photo_count(main_distance_m: f64, along_track_m: f64) -> u64 {
    if !(main_distance_m > 0.0) || !(along_track_m > 0.0) {
        return 0;
    }
    (main_distance_m / along_track_m).ceil() as u64
}

/// Inputs to [`compute_metrics`] that do not come from the composed route
#[derive(Debug, Clone, Copy)]
pub struct MetricsInput {
    pub spacing: Spacing,
    pub gsd_cm_per_px: f64,
    pub speed_mps: f64,
    pub turn_time_s: f64,
    pub leg_count: usize,
    pub segment_count: usize,
    pub area_m2: f64,
}

pub fn compute_metrics(route: &ComposedPath, input: &MetricsInput) -> SurveyMetrics {
    let main_distance_m = route.main_distance_m();
    let transit_distance_m = route.transit_distance_m();
    let total_distance_m = main_distance_m + transit_distance_m;

    SurveyMetrics {
        trigger_distance_m: input.spacing.along_track_m,
        line_spacing_m: input.spacing.across_track_m,
        gsd_cm_per_px: input.gsd_cm_per_px,
        main_distance_m,
        transit_distance_m,
        total_distance_m,
        estimated_minutes: estimated_minutes(
            total_distance_m,
            input.speed_mps,
            input.leg_count,
            input.turn_time_s,
        ),
        photo_count: photo_count(main_distance_m, input.spacing.along_track_m),
        leg_count: input.leg_count,
        segment_count: input.segment_count,
        area_m2: input.area_m2,
        area_hectares: input.area_m2 / 10_000.0,
    }
}

// ============================================================================
// TESTS
// ============================================================================
