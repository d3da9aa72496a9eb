//! Geodesy helpers: great-circle distance, geofence containment, bearings and
//! city-bounds clamping.
//!
//! All functions are total. Non-finite coordinates collapse to a neutral zero
//! result instead of propagating NaN into vehicle state.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 coordinate in degrees. Serialized as a `[lat, lng]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Linear interpolation in degree space.
    pub fn lerp(self, target: LatLng, t: f64) -> LatLng {
        LatLng::new(
            self.lat + (target.lat - self.lat) * t,
            self.lng + (target.lng - self.lng) * t,
        )
    }

    /// Planar distance in degree space. Only meaningful for nearby points.
    pub fn planar_distance(self, other: LatLng) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(pair: [f64; 2]) -> Self {
        LatLng::new(pair[0], pair[1])
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(point: LatLng) -> Self {
        [point.lat, point.lng]
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    pub fn clamp(&self, point: LatLng) -> LatLng {
        LatLng::new(
            point.lat.clamp(self.south_west.lat, self.north_east.lat),
            point.lng.clamp(self.south_west.lng, self.north_east.lng),
        )
    }

    pub fn is_ordered(&self) -> bool {
        self.south_west.lat <= self.north_east.lat && self.south_west.lng <= self.north_east.lng
    }
}

/// Haversine great-circle distance in meters.
pub fn distance_meters(from: LatLng, to: LatLng) -> f64 {
    if !from.is_finite() || !to.is_finite() {
        return 0.0;
    }
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlng = (dlng * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// True when `position` lies within `radius_meters` of `center` (boundary inclusive).
pub fn inside_geofence(position: LatLng, center: LatLng, radius_meters: f64) -> bool {
    distance_meters(position, center) <= radius_meters
}

/// Bearing from `prev` to `next` in `[0, 360)`, measured as `atan2(Δlng, Δlat)`.
///
/// Returns 0 when the points coincide or either one is not finite.
pub fn heading_degrees(prev: LatLng, next: LatLng) -> f64 {
    if !prev.is_finite() || !next.is_finite() {
        return 0.0;
    }
    let dlat = next.lat - prev.lat;
    let dlng = next.lng - prev.lng;
    if dlat == 0.0 && dlng == 0.0 {
        return 0.0;
    }
    let degrees = dlng.atan2(dlat).to_degrees();
    let normalized = (degrees + 360.0) % 360.0;
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}
