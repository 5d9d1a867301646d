//! # Survey Core
//!
//! Flight-path planning engine for aerial survey missions. Given an area of
//! interest, a camera and flight parameters it produces a lawnmower coverage
//! pattern, a single route from and back to home, battery-sized segments,
//! summary metrics and a mission file for the flight controller.
//!
//! Every stage is a pure function of its inputs; [`planner::plan`] runs the
//! whole pipeline and should simply be called again whenever an input changes.

use serde::{Deserialize, Serialize};

pub mod camera;
pub mod error;
pub mod geo;
pub mod geometry;
pub mod grid;
pub mod metrics;
pub mod mission;
pub mod path;
pub mod planner;
pub mod segment;

pub use crate::geo::{GeoBounds, GeoPoint, SurveyArea};
pub use camera::{Camera, Spacing, compute_spacing};
pub use error::{CoreError, CoreResult};
pub use grid::{Grid, build_coverage, build_grid};
pub use metrics::SurveyMetrics;
pub use mission::{MissionItem, MissionOptions, MissionPlan, PlanFile};
pub use path::{ComposedPath, compose_path};
pub use planner::{SurveyPlan, plan};
pub use segment::{Segment, segment_legs};

// ============================================================================
// SURVEY PARAMETERS
// ============================================================================

/// Flight parameters supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyParameters {
    /// Height above ground level in meters
    pub height_m: f64,
    /// Leg heading in degrees (0-359)
    pub heading_deg: f64,
    /// Forward overlap fraction (0-0.95)
    pub overlap: f64,
    /// Side overlap fraction (0-0.95)
    pub sidelap: f64,
    /// Groundspeed in m/s
    pub speed_mps: f64,
    /// Time spent turning at the end of each leg, in seconds
    pub turn_time_s: f64,
    /// Battery endurance in minutes
    pub battery_minutes: f64,
    /// Fly a second grid at heading + 90
    pub crosshatch: bool,
}

impl Default for SurveyParameters {
    fn default() -> Self {
        Self {
            height_m: 100.0,
            heading_deg: 0.0,
            overlap: 0.75,
            sidelap: 0.65,
            speed_mps: 10.0,
            turn_time_s: 10.0,
            battery_minutes: 20.0,
            crosshatch: false,
        }
    }
}

impl SurveyParameters {
    /// Heading normalized into [0, 360)
    pub fn heading(&self) -> f64 {
        self.heading_deg.rem_euclid(360.0)
    }
}

// ============================================================================
// LEG MODEL
// ============================================================================

/// One coverage pass across the area; point order is the direction of flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    points: Vec<GeoPoint>,
}

impl Leg {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn start(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    /// Great-circle length in meters
    pub fn length_m(&self) -> f64 {
        geometry::path_length(&self.points)
    }

    /// The same pass flown in the opposite direction
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }
}

// ============================================================================
// TESTS
// ============================================================================
