//! Geometry utilities used by the grid builder and path composer
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`bounding_box`] | Bounding box of a point set |
//! | [`destination_point`] | Great-circle destination from a point |
//! | [`translate_along_bearing`] | Shift every point of a line by the same distance/bearing |
//! | [`split_line_by_polygon`] | Cut a line at every crossing with a polygon boundary |
//! | [`point_in_polygon`] | Containment test |
//! | [`path_length`] | Cumulative great-circle length |
//! | [`path_midpoint`] | Point halfway along a path |
//!
//! Splitting is done in degree space on the polygon's edges, the same planar
//! approximation map-side geometry libraries use for small survey areas.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Coord, Line};

use crate::error::{CoreError, CoreResult};
use crate::geo::{GeoBounds, GeoPoint, SurveyArea};

/// Bounding box of a set of points
pub fn bounding_box(points: &[GeoPoint]) -> Option<GeoBounds> {
    GeoBounds::from_points(points)
}

/// Great-circle destination `distance_m` meters from `point` along `bearing_deg`
pub fn destination_point(point: GeoPoint, distance_m: f64, bearing_deg: f64) -> GeoPoint {
    point.destination(distance_m, bearing_deg)
}

/// Translate every point of `line` by `distance_m` along `bearing_deg`
pub fn translate_along_bearing(line: &[GeoPoint], distance_m: f64, bearing_deg: f64) -> Vec<GeoPoint> {
    line.iter()
        .map(|p| destination_point(*p, distance_m, bearing_deg))
        .collect()
}

/// Point-in-polygon test
pub fn point_in_polygon(point: &GeoPoint, area: &SurveyArea) -> bool {
    area.contains(point)
}

/// Total great-circle length of a path in meters
pub fn path_length(points: &[GeoPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| w[0].distance_to(&w[1]))
        .sum()
}

/// Point halfway along a path by length, `None` for an empty path
pub fn path_midpoint(points: &[GeoPoint]) -> Option<GeoPoint> {
    let first = *points.first()?;
    let half = path_length(points) / 2.0;
    if half <= 0.0 {
        return Some(first);
    }

    let mut travelled = 0.0;
    for w in points.windows(2) {
        let step = w[0].distance_to(&w[1]);
        if step > 0.0 && travelled + step >= half {
            return Some(w[0].interpolate(&w[1], (half - travelled) / step));
        }
        travelled += step;
    }

    points.last().copied()
}

/// Split a line at every crossing with the polygon boundary
///
/// Returns the pieces in line order; each piece lies entirely on one side of
/// the boundary. Callers decide which pieces to keep, typically by testing
/// each piece's midpoint with [`point_in_polygon`].
///
/// Where the line runs along a polygon edge it is cut at both ends of the
/// overlap, leaving the shared stretch as a piece of its own.
///
/// Fails with [`CoreError::GeometryDegenerate`] when the polygon is unusable
/// or the line has non-finite coordinates.
pub fn split_line_by_polygon(line: &[GeoPoint], area: &SurveyArea) -> CoreResult<Vec<Vec<GeoPoint>>> {
    if line.len() < 2 {
        return Err(CoreError::invalid_input("line needs at least two points"));
    }
    if !area.is_valid() {
        return Err(CoreError::geometry_degenerate(
            "polygon needs at least three distinct finite vertices",
        ));
    }
    if !line.iter().all(GeoPoint::is_finite) {
        return Err(CoreError::geometry_degenerate("line has non-finite coordinates"));
    }

    let edges: Vec<Line<f64>> = area
        .ring()
        .windows(2)
        .filter(|w| !w[0].same_position(&w[1]))
        .map(|w| Line::new(w[0].to_coord(), w[1].to_coord()))
        .collect();

    let mut pieces = Vec::new();
    let mut current = vec![line[0]];

    for pair in line.windows(2) {
        if pair[0].same_position(&pair[1]) {
            continue;
        }
        let segment = Line::new(pair[0].to_coord(), pair[1].to_coord());

        let mut cuts: Vec<(f64, GeoPoint)> = Vec::new();
        for edge in &edges {
            match line_intersection(segment, *edge) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    cuts.push((
                        segment_fraction(&segment, intersection),
                        GeoPoint::from_coord(intersection),
                    ));
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    // Cut at both ends of the shared stretch
                    for end in [intersection.start, intersection.end] {
                        cuts.push((segment_fraction(&segment, end), GeoPoint::from_coord(end)));
                    }
                }
                None => {}
            }
        }
        cuts.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, cut) in cuts {
            // A crossing through a vertex is reported once per adjoining edge
            if current.last().is_some_and(|last| last.same_position(&cut)) {
                continue;
            }
            current.push(cut);
            pieces.push(std::mem::replace(&mut current, vec![cut]));
        }

        if current.last().is_none_or(|last| !last.same_position(&pair[1])) {
            current.push(pair[1]);
        }
    }

    if current.len() >= 2 {
        pieces.push(current);
    }

    Ok(pieces)
}

/// Position of `point` along `segment` as a fraction of its length
fn segment_fraction(segment: &Line<f64>, point: Coord<f64>) -> f64 {
    let delta = segment.delta();
    let length_sq = delta.x * delta.x + delta.y * delta.y;
    if length_sq == 0.0 {
        return 0.0;
    }
    let offset = point - segment.start;
    (offset.x * delta.x + offset.y * delta.y) / length_sq
}

// ============================================================================
// TESTS
// ============================================================================
