//! Route composition: stitch legs into one polyline and connect it to home

use serde::{Deserialize, Serialize};

use crate::Leg;
use crate::geo::GeoPoint;
use crate::geometry::path_length;

/// Stitched route with its transit lines to and from home
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposedPath {
    /// Coverage route, starting at the end nearer to home
    pub path: Vec<GeoPoint>,
    /// Home to route start
    pub entry: Option<[GeoPoint; 2]>,
    /// Route end back to home
    pub return_leg: Option<[GeoPoint; 2]>,
}

impl ComposedPath {
    /// Length of the coverage route in meters
    pub fn main_distance_m(&self) -> f64 {
        path_length(&self.path)
    }

    /// Combined length of the entry and return lines in meters
    pub fn transit_distance_m(&self) -> f64 {
        [self.entry, self.return_leg]
            .iter()
            .flatten()
            .map(|[a, b]| a.distance_to(b))
            .sum()
    }
}

/// Concatenate legs into one polyline
///
/// A leg whose first point differs from the running end is joined by that
/// first point acting as the connector; a shared point is not repeated.
pub fn stitch_legs(legs: &[Leg]) -> Vec<GeoPoint> {
    let mut path: Vec<GeoPoint> = Vec::with_capacity(legs.iter().map(|l| l.points().len()).sum());

    for leg in legs {
        let Some((first, rest)) = leg.points().split_first() else {
            continue;
        };
        if path.last() != Some(first) {
            path.push(*first);
        }
        path.extend_from_slice(rest);
    }

    path
}

/// Reverse the path when its last point is closer to home than its first
pub fn orient_toward_home(mut path: Vec<GeoPoint>, home: &GeoPoint) -> Vec<GeoPoint> {
    if let (Some(first), Some(last)) = (path.first(), path.last()) {
        if home.distance_to(last) < home.distance_to(first) {
            path.reverse();
        }
    }
    path
}

/// Stitch, orient toward home and derive the entry/return transit lines
pub fn compose_path(legs: &[Leg], home: &GeoPoint) -> ComposedPath {
    let path = orient_toward_home(stitch_legs(legs), home);

    let (entry, return_leg) = match (path.first(), path.last()) {
        (Some(start), Some(end)) if path.len() >= 2 => {
            (Some([*home, *start]), Some([*end, *home]))
        }
        _ => (None, None),
    };

    ComposedPath {
        path,
        entry,
        return_leg,
    }
}

// ============================================================================
// TESTS
// ============================================================================
