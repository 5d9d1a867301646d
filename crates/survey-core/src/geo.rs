//! Geographic types for survey planning
//!
//! Points are stored as (latitude, longitude) in degrees. The `geo` crate works
//! in (x = longitude, y = latitude); the conversion happens only in the
//! `to_point`/`to_coord`/`from_coord` helpers below.

use geo::{
    Bearing, BoundingRect, Contains, Coord, Destination, Distance, GeodesicArea, Haversine,
    LineString, Point, Polygon,
};
use serde::{Deserialize, Serialize};

/// Tolerance in degrees under which two points are treated as the same position
const SAME_POSITION_EPSILON_DEG: f64 = 1e-12;

/// Square meters per hectare
const M2_PER_HECTARE: f64 = 10_000.0;

/// Geographic point with latitude and longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if this point lies within the valid latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Great-circle distance to another point in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }

    /// Initial bearing to another point in degrees (0-360)
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        Haversine
            .bearing(self.to_point(), other.to_point())
            .rem_euclid(360.0)
    }

    /// Point reached by travelling `distance_m` meters along `bearing_deg`
    pub fn destination(&self, distance_m: f64, bearing_deg: f64) -> GeoPoint {
        let point = Haversine.destination(self.to_point(), bearing_deg, distance_m);
        GeoPoint::from_coord(point.0)
    }

    /// Linear interpolation in degree space
    /// fraction: 0.0 = self, 1.0 = other
    pub fn interpolate(&self, other: &GeoPoint, fraction: f64) -> GeoPoint {
        let fraction = fraction.clamp(0.0, 1.0);

        GeoPoint::new(
            self.latitude + (other.latitude - self.latitude) * fraction,
            self.longitude + (other.longitude - self.longitude) * fraction,
        )
    }

    /// True when both coordinates agree within floating-point noise
    pub fn same_position(&self, other: &GeoPoint) -> bool {
        (self.latitude - other.latitude).abs() < SAME_POSITION_EPSILON_DEG
            && (self.longitude - other.longitude).abs() < SAME_POSITION_EPSILON_DEG
    }

    pub(crate) fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    pub(crate) fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    pub(crate) fn from_coord(coord: Coord<f64>) -> Self {
        Self::new(coord.y, coord.x)
    }
}

/// Geographic bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Bounding box of a set of points, `None` when empty
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let line: LineString<f64> = points.iter().map(|p| p.to_coord()).collect();
        let rect = line.bounding_rect()?;

        Some(Self::new(rect.min().y, rect.max().y, rect.min().x, rect.max().x))
    }

    /// Check if a point is within these bounds
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    /// Get the center of these bounds
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// East-west extent in meters, measured across the center latitude
    pub fn width_m(&self) -> f64 {
        let lat = self.center().latitude;
        GeoPoint::new(lat, self.min_lng).distance_to(&GeoPoint::new(lat, self.max_lng))
    }

    /// North-south extent in meters
    pub fn height_m(&self) -> f64 {
        let lng = self.center().longitude;
        GeoPoint::new(self.min_lat, lng).distance_to(&GeoPoint::new(self.max_lat, lng))
    }

    /// Corner-to-corner distance in meters
    pub fn diagonal_m(&self) -> f64 {
        GeoPoint::new(self.min_lat, self.min_lng)
            .distance_to(&GeoPoint::new(self.max_lat, self.max_lng))
    }
}

/// Area of interest: a closed ring of points bounding the survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyArea {
    ring: Vec<GeoPoint>,
}

impl SurveyArea {
    /// Build an area from a ring of points, closing it when the caller left it open
    pub fn new(mut ring: Vec<GeoPoint>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if !first.same_position(&last) {
                ring.push(first);
            }
        }
        Self { ring }
    }

    /// Build an area only if the ring describes a usable polygon
    pub fn from_ring(ring: Vec<GeoPoint>) -> Option<Self> {
        let area = Self::new(ring);
        area.is_valid().then_some(area)
    }

    /// The closed ring, first point repeated at the end
    pub fn ring(&self) -> &[GeoPoint] {
        &self.ring
    }

    /// Number of distinct vertices (closing point excluded)
    pub fn distinct_vertex_count(&self) -> usize {
        let open = &self.ring[..self.ring.len().saturating_sub(1)];
        let mut distinct: Vec<GeoPoint> = Vec::with_capacity(open.len());
        for point in open {
            if !distinct.iter().any(|seen| seen.same_position(point)) {
                distinct.push(*point);
            }
        }
        distinct.len()
    }

    /// At least four ring entries and three distinct, finite vertices
    pub fn is_valid(&self) -> bool {
        self.ring.len() >= 4
            && self.ring.iter().all(GeoPoint::is_finite)
            && self.distinct_vertex_count() >= 3
    }

    /// Get the bounding box of this area
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(&self.ring)
    }

    /// Bounding box center, used for "set home to center"
    pub fn center(&self) -> Option<GeoPoint> {
        self.bounds().map(|b| b.center())
    }

    /// Point-in-polygon test
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if !self.is_valid() {
            return false;
        }
        self.to_polygon().contains(&point.to_point())
    }

    /// Geodesic area in square meters
    pub fn area_m2(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.to_polygon().geodesic_area_unsigned()
    }

    pub fn area_hectares(&self) -> f64 {
        self.area_m2() / M2_PER_HECTARE
    }

    pub(crate) fn to_polygon(&self) -> Polygon<f64> {
        let exterior: LineString<f64> = self.ring.iter().map(|p| p.to_coord()).collect();
        Polygon::new(exterior, vec![])
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square(center: GeoPoint, half_side_m: f64) -> SurveyArea {
        let north = center.destination(half_side_m, 0.0);
        let south = center.destination(half_side_m, 180.0);
        let east = center.destination(half_side_m, 90.0);
        let west = center.destination(half_side_m, 270.0);
        SurveyArea::new(vec![
            GeoPoint::new(north.latitude, west.longitude),
            GeoPoint::new(north.latitude, east.longitude),
            GeoPoint::new(south.latitude, east.longitude),
            GeoPoint::new(south.latitude, west.longitude),
        ])
    }

    #[test]
    fn test_distance_calculation() {
        // One degree of latitude is roughly 111 km
        let a = GeoPoint::new(47.0, 8.0);
        let b = GeoPoint::new(48.0, 8.0);

        let distance = a.distance_to(&b);
        assert!(distance > 110_000.0 && distance < 112_500.0);
    }

    #[test]
    fn test_bearing_calculation() {
        let origin = GeoPoint::new(0.0, 0.0);
        let north = GeoPoint::new(1.0, 0.0);
        let east = GeoPoint::new(0.0, 1.0);
        let west = GeoPoint::new(0.0, -1.0);

        assert!((origin.bearing_to(&north) - 0.0).abs() < 1.0);
        assert!((origin.bearing_to(&east) - 90.0).abs() < 1.0);
        assert!((origin.bearing_to(&west) - 270.0).abs() < 1.0);
    }

    #[test]
    fn test_destination_round_trip_distance() {
        let origin = GeoPoint::new(46.5, 7.5);
        let target = origin.destination(250.0, 33.0);

        assert!((origin.distance_to(&target) - 250.0).abs() < 0.01);
        assert!((origin.bearing_to(&target) - 33.0).abs() < 0.01);
    }

    #[test]
    fn test_area_closes_open_ring() {
        let area = SurveyArea::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.001, 0.001),
        ]);

        assert_eq!(area.ring().len(), 4);
        assert_eq!(area.ring()[0], area.ring()[3]);
        assert!(area.is_valid());
    }

    #[test]
    fn test_two_vertex_area_is_invalid() {
        let area = SurveyArea::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001)]);

        assert!(!area.is_valid());
        assert!(SurveyArea::from_ring(area.ring().to_vec()).is_none());
        assert_eq!(area.area_m2(), 0.0);
    }

    #[test]
    fn test_area_contains() {
        let center = GeoPoint::new(47.3769, 8.5417);
        let area = square(center, 50.0);

        assert!(area.contains(&center));
        assert!(!area.contains(&center.destination(80.0, 45.0)));
    }

    #[test]
    fn test_bounds_dimensions() {
        let center = GeoPoint::new(47.3769, 8.5417);
        let bounds = square(center, 50.0).bounds().unwrap();

        assert!((bounds.width_m() - 100.0).abs() < 0.5);
        assert!((bounds.height_m() - 100.0).abs() < 0.5);
        assert!((bounds.diagonal_m() - 141.42).abs() < 1.0);
        assert!(bounds.contains(&center));
    }

    #[test]
    fn test_area_hectares() {
        let area = square(GeoPoint::new(47.3769, 8.5417), 50.0);

        // 100m x 100m = 1 ha
        assert!((area.area_hectares() - 1.0).abs() < 0.01);
    }
}
