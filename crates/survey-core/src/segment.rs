//! Battery-aware partition of the leg sequence into sub-missions
//!
//! Greedy and order-preserving: legs are appended to the running segment until
//! the next one would push it past the battery budget. A leg that alone exceeds
//! the budget still gets a segment of its own, so every leg is flown.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::GeoPoint;
use crate::geometry::path_length;
use crate::path::stitch_legs;
use crate::{Leg, SurveyParameters};

/// Reserve kept back from every battery, in seconds
pub const BATTERY_RESERVE_S: f64 = 60.0;

/// Smallest usable flight time per segment, in seconds
pub const MIN_SEGMENT_BUDGET_S: f64 = 60.0;

/// A contiguous run of legs flown on one battery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub legs: Vec<Leg>,
    /// Stitched route of this segment's legs
    pub path: Vec<GeoPoint>,
    /// Length of the stitched route in meters
    pub distance_m: f64,
    /// Summed leg flight and turn time in seconds
    pub time_s: f64,
}

impl Segment {
    fn close(legs: Vec<Leg>, time_s: f64) -> Self {
        let path = stitch_legs(&legs);
        let distance_m = path_length(&path);
        Self {
            legs,
            path,
            distance_m,
            time_s,
        }
    }

    /// True when the segment needs more than `budget_s` seconds
    pub fn is_over_budget(&self, budget_s: f64) -> bool {
        self.time_s > budget_s
    }
}

/// Usable seconds per battery: capacity less the reserve, never below the floor
pub fn effective_budget_s(battery_minutes: f64) -> f64 {
    (battery_minutes * 60.0 - BATTERY_RESERVE_S).max(MIN_SEGMENT_BUDGET_S)
}

/// Flight time of one leg plus the fixed turn overhead
pub fn leg_time_s(leg: &Leg, speed_mps: f64, turn_time_s: f64) -> f64 {
    let flight = if speed_mps > 0.0 {
        leg.length_m() / speed_mps
    } else {
        0.0
    };
    flight + turn_time_s.max(0.0)
}

/// Split `legs` into battery-feasible segments, preserving order
pub fn segment_legs(legs: &[Leg], params: &SurveyParameters) -> Vec<Segment> {
    let budget = effective_budget_s(params.battery_minutes);

    let mut segments = Vec::new();
    let mut running: Vec<Leg> = Vec::new();
    let mut running_time = 0.0;

    for leg in legs {
        let time = leg_time_s(leg, params.speed_mps, params.turn_time_s);

        if !running.is_empty() && running_time + time > budget {
            segments.push(Segment::close(std::mem::take(&mut running), running_time));
            running_time = 0.0;
        }

        running.push(leg.clone());
        running_time += time;
    }

    if !running.is_empty() {
        segments.push(Segment::close(running, running_time));
    }

    debug!(
        legs = legs.len(),
        segments = segments.len(),
        budget_s = budget,
        "legs segmented"
    );
    segments
}

// ============================================================================
// TESTS
// ============================================================================
