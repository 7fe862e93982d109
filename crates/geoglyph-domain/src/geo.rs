//! Coordinates, bounding boxes and great-circle distance

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Kilometres per degree of latitude (and of longitude at the equator)
pub const KM_PER_DEGREE: f64 = 111.32;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A point on the Earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude [-90, 90]
    pub lat: f64,
    /// Longitude [-180, 180]
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate without validation
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that both components are finite and inside their ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine distance to another coordinate in metres
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        let to_rad = |deg: f64| deg * PI / 180.0;

        let dlat = to_rad(other.lat - self.lat);
        let dlon = to_rad(other.lon - self.lon);

        let a = (dlat / 2.0).sin().powi(2)
            + to_rad(self.lat).cos() * to_rad(other.lat).cos() * (dlon / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_METERS * c
    }

    /// Move the coordinate by the given distances (flat-earth approximation)
    pub fn offset_km(&self, north_km: f64, east_km: f64) -> Coordinate {
        let lat = self.lat + north_km / KM_PER_DEGREE;
        let lon = self.lon + east_km / (KM_PER_DEGREE * lat_cos(self.lat));
        Coordinate { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

/// Axis-aligned box in latitude/longitude space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge
    pub min_lat: f64,
    /// Western edge
    pub min_lon: f64,
    /// Northern edge
    pub max_lat: f64,
    /// Eastern edge
    pub max_lon: f64,
}

impl BoundingBox {
    /// Square box of `span_km` per side centered on `center`
    pub fn around(center: Coordinate, span_km: f64) -> Self {
        let half = span_km / 2.0;
        let dlat = half / KM_PER_DEGREE;
        let dlon = half / (KM_PER_DEGREE * lat_cos(center.lat));

        Self {
            min_lat: center.lat - dlat,
            min_lon: center.lon - dlon,
            max_lat: center.lat + dlat,
            max_lon: center.lon + dlon,
        }
    }

    /// Midpoint of the box
    pub fn center(&self) -> Coordinate {
        Coordinate {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lon: (self.min_lon + self.max_lon) / 2.0,
        }
    }

    /// Whether the point lies inside the box (edges inclusive)
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
            && other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
    }

    /// Whether the two boxes share any area or edge
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    /// East-west extent in kilometres, measured at the box center
    pub fn width_km(&self) -> f64 {
        (self.max_lon - self.min_lon) * KM_PER_DEGREE * lat_cos(self.center().lat)
    }

    /// North-south extent in kilometres
    pub fn height_km(&self) -> f64 {
        (self.max_lat - self.min_lat) * KM_PER_DEGREE
    }

    /// Approximate area in square kilometres
    pub fn area_km2(&self) -> f64 {
        self.width_km() * self.height_km()
    }

    /// Coordinate of the center of pixel (`row`, `col`) on a `width` x `height` grid.
    ///
    /// Row 0 is the northern edge and column 0 the western edge.
    pub fn pixel_center(&self, row: u32, col: u32, width: u32, height: u32) -> Coordinate {
        let lat_step = (self.max_lat - self.min_lat) / f64::from(height.max(1));
        let lon_step = (self.max_lon - self.min_lon) / f64::from(width.max(1));

        Coordinate {
            lat: self.max_lat - (f64::from(row) + 0.5) * lat_step,
            lon: self.min_lon + (f64::from(col) + 0.5) * lon_step,
        }
    }
}

fn lat_cos(lat: f64) -> f64 {
    // Keep the longitude span finite near the poles
    (lat * PI / 180.0).cos().max(1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(-12.5, -53.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let d = a.distance_meters(&b);
        assert!((d - 111_195.0).abs() < 100.0, "Expected ~111km, got {d}m");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinate::new(-12.450779, -53.114006);
        let b = Coordinate::new(-12.6, -65.3);
        assert!((a.distance_meters(&b) - b.distance_meters(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_box_around_spans_requested_size() {
        let bbox = BoundingBox::around(Coordinate::new(-12.5, -53.0), 50.0);
        assert!((bbox.height_km() - 50.0).abs() < 1e-6);
        assert!((bbox.width_km() - 50.0).abs() < 0.01);

        let center = bbox.center();
        assert!((center.lat + 12.5).abs() < 1e-9);
        assert!((center.lon + 53.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_km() {
        let origin = Coordinate::new(-12.5, -53.0);
        let moved = origin.offset_km(1.0, 0.0);
        let d = origin.distance_meters(&moved);
        assert!((d - 1000.0).abs() < 5.0, "Expected ~1000m, got {d}m");
    }

    #[test]
    fn test_intersects_and_contains() {
        let big = BoundingBox::around(Coordinate::new(0.0, 0.0), 10.0);
        let small = BoundingBox::around(Coordinate::new(0.0, 0.0), 2.0);
        let far = BoundingBox::around(Coordinate::new(5.0, 5.0), 2.0);

        assert!(big.contains_box(&small));
        assert!(!small.contains_box(&big));
        assert!(big.intersects(&small));
        assert!(!big.intersects(&far));
    }

    #[test]
    fn test_pixel_center_corners() {
        let bbox = BoundingBox {
            min_lat: 0.0,
            min_lon: 0.0,
            max_lat: 1.0,
            max_lon: 1.0,
        };
        let nw = bbox.pixel_center(0, 0, 10, 10);
        assert!((nw.lat - 0.95).abs() < 1e-9);
        assert!((nw.lon - 0.05).abs() < 1e-9);

        let se = bbox.pixel_center(9, 9, 10, 10);
        assert!((se.lat - 0.05).abs() < 1e-9);
        assert!((se.lon - 0.95).abs() < 1e-9);
    }
}
