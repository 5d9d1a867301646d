//! Lawnmower grid generation
//!
//! A baseline through the area's center is laid along the heading, copied at
//! regular offsets along the orthogonal bearing, and each copy is clipped to
//! the area. Surviving pieces become legs, every second one reversed so the
//! pattern zig-zags.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Leg;
use crate::geo::{GeoPoint, SurveyArea};
use crate::geometry::{
    bounding_box, destination_point, path_midpoint, point_in_polygon, split_line_by_polygon,
    translate_along_bearing,
};

/// Shortest baseline laid through the area, in meters
const MIN_BASELINE_M: f64 = 500.0;

/// Extra offsets added on each side beyond the area's half-diagonal
const MARGIN_STEPS: f64 = 2.0;

/// Legs covering an area, plus how many candidates needed the unclipped fallback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub legs: Vec<Leg>,
    pub fallback_count: usize,
}

impl Grid {
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    fn append(&mut self, other: Grid) {
        self.legs.extend(other.legs);
        self.fallback_count += other.fallback_count;
    }
}

/// Build the coverage legs for `area`, running a second pass at heading + 90
/// when `crosshatch` is set
///
/// The passes are independent: each zig-zags from its own first leg and the
/// second pass's legs follow the first pass's.
pub fn build_coverage(
    area: Option<&SurveyArea>,
    heading_deg: f64,
    spacing_m: f64,
    crosshatch: bool,
) -> Grid {
    let Some(area) = area else {
        return Grid::default();
    };

    let mut grid = build_grid(area, heading_deg, spacing_m);
    if crosshatch {
        grid.append(build_grid(area, heading_deg + 90.0, spacing_m));
    }
    grid
}

/// Build one pass of parallel legs at `heading_deg`, `spacing_m` apart
pub fn build_grid(area: &SurveyArea, heading_deg: f64, spacing_m: f64) -> Grid {
    if !area.is_valid() {
        debug!("area has fewer than three vertices, no grid");
        return Grid::default();
    }
    if !(spacing_m.is_finite() && spacing_m > 0.0) {
        debug!(spacing_m, "non-positive or non-finite spacing, no grid");
        return Grid::default();
    }
    let Some(bounds) = bounding_box(area.ring()) else {
        return Grid::default();
    };

    let heading = heading_deg.rem_euclid(360.0);
    let across = (heading + 90.0).rem_euclid(360.0);
    let center = bounds.center();
    let diagonal = bounds.diagonal_m();

    let baseline_len = (2.0 * diagonal).max(MIN_BASELINE_M);
    let baseline = [
        destination_point(center, baseline_len / 2.0, (heading + 180.0).rem_euclid(360.0)),
        destination_point(center, baseline_len / 2.0, heading),
    ];

    let half_steps = ((diagonal / 2.0) / spacing_m + MARGIN_STEPS).ceil() as i64;

    let mut grid = Grid::default();
    for step in -half_steps..=half_steps {
        let offset = step as f64 * spacing_m;
        let candidate = if offset < 0.0 {
            translate_along_bearing(&baseline, -offset, (across + 180.0).rem_euclid(360.0))
        } else {
            translate_along_bearing(&baseline, offset, across)
        };
        for piece in clip_to_area(&candidate, area, &mut grid.fallback_count) {
            let leg = Leg::new(piece);
            if grid.legs.len() % 2 == 1 {
                grid.legs.push(leg.reversed());
            } else {
                grid.legs.push(leg);
            }
        }
    }

    debug!(
        heading,
        spacing_m,
        legs = grid.legs.len(),
        offsets = 2 * half_steps + 1,
        "grid pass built"
    );
    grid
}

/// Pieces of `candidate` lying inside `area`, or the whole candidate when the
/// split fails
fn clip_to_area(
    candidate: &[GeoPoint],
    area: &SurveyArea,
    fallback_count: &mut usize,
) -> Vec<Vec<GeoPoint>> {
    match split_line_by_polygon(candidate, area) {
        Ok(pieces) => pieces
            .into_iter()
            .filter(|piece| {
                piece.len() >= 2
                    && path_midpoint(piece).is_some_and(|mid| point_in_polygon(&mid, area))
            })
            .collect(),
        Err(e) => {
            // The unclipped line may extend past the area
            warn!("clipping failed, keeping unclipped line: {}", e);
            *fallback_count += 1;
            vec![candidate.to_vec()]
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
