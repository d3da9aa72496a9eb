//! Planned routes: deterministic per-vehicle waypoint paths to the office,
//! the pickup sub-geofences along them, and nearest-waypoint snapping.
//!
//! Routes are generated once per vehicle when the scenario is built and are
//! immutable afterwards; systems look them up by vehicle id.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::fleet::VehicleId;
use crate::geo::{GeoBounds, LatLng};
use crate::scenario::{OfficeConfig, VehicleSeed};

pub const MIN_ROUTE_POINTS: usize = 6;
pub const MAX_ROUTE_POINTS: usize = 10;
pub const PICKUP_RADIUS_METERS: f64 = 180.0;

/// Wobble amplitude at the start of the route, in degrees.
const MAX_WOBBLE_DEGREES: f64 = 0.006;
/// Route fractions at which pickups are placed, with their minimum indices.
const PICKUP_FRACTIONS: [(f64, usize); 3] = [(0.3, 1), (0.55, 2), (0.8, 3)];

/// A named passenger stop on a planned route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pickup {
    pub name: String,
    pub position: LatLng,
    pub radius_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRoute {
    /// Starts at the vehicle's roster position and ends exactly on the office.
    pub route: Vec<LatLng>,
    pub pickups: Vec<Pickup>,
}

impl PlannedRoute {
    pub fn last_index(&self) -> Option<usize> {
        self.route.len().checked_sub(1)
    }
}

/// Planned routes keyed by vehicle id.
#[derive(Debug, Clone, Default, Resource)]
pub struct PlannedRoutes(pub HashMap<VehicleId, PlannedRoute>);

impl PlannedRoutes {
    pub fn get(&self, id: &VehicleId) -> Option<&PlannedRoute> {
        self.0.get(id)
    }

    /// Waypoints for `id`; empty when the vehicle has no plan.
    pub fn waypoints(&self, id: &VehicleId) -> &[LatLng] {
        self.0.get(id).map(|plan| plan.route.as_slice()).unwrap_or(&[])
    }
}

/// Sum of UTF-16 code units of the id plus a per-roster-slot offset.
pub fn route_seed(id: &VehicleId, roster_index: usize) -> u64 {
    let base: u64 = id.as_str().encode_utf16().map(u64::from).sum();
    base + roster_index as u64 * 31
}

/// Builds the route for the vehicle at `roster_index`.
///
/// The path interpolates linearly from the vehicle to the office with a
/// sinusoidal wobble that decays to zero at the office. Every point is
/// clamped into `bounds`, then both endpoints are forced to their exact
/// coordinates.
pub fn generate_planned_route(
    vehicle: &VehicleSeed,
    roster_index: usize,
    office: &OfficeConfig,
    bounds: &GeoBounds,
) -> PlannedRoute {
    let start = vehicle.position;
    let end = office.coordinates;
    let seed = route_seed(&vehicle.id, roster_index);
    let point_count = MIN_ROUTE_POINTS + (seed % 5) as usize;
    let seed = seed as f64;

    let mut route: Vec<LatLng> = (0..point_count)
        .map(|index| {
            let k = index as f64;
            let progress = k / (point_count - 1) as f64;
            let wobble = (1.0 - progress) * MAX_WOBBLE_DEGREES;
            let lat_wave = (seed * 0.11 + k * 0.8).sin() * wobble;
            let lng_wave = (seed * 0.09 + k * 0.7).cos() * wobble;
            let base = start.lerp(end, progress);
            bounds.clamp(LatLng::new(base.lat + lat_wave, base.lng + lng_wave))
        })
        .collect();

    route[0] = start;
    route[point_count - 1] = end;

    let mut steps: Vec<usize> = Vec::with_capacity(PICKUP_FRACTIONS.len());
    for (fraction, floor) in PICKUP_FRACTIONS {
        let step = (((point_count - 1) as f64 * fraction).floor() as usize).max(floor);
        if !steps.contains(&step) {
            steps.push(step);
        }
    }

    let pickups = steps
        .into_iter()
        .filter(|step| *step > 0 && *step < route.len() - 1)
        .enumerate()
        .map(|(ordinal, step)| Pickup {
            name: format!("{} Pickup {}", vehicle.driver_name, ordinal + 1),
            position: route[step],
            radius_meters: PICKUP_RADIUS_METERS,
        })
        .collect();

    PlannedRoute { route, pickups }
}

pub fn generate_planned_routes(
    roster: &[VehicleSeed],
    office: &OfficeConfig,
    bounds: &GeoBounds,
) -> HashMap<VehicleId, PlannedRoute> {
    roster
        .iter()
        .enumerate()
        .map(|(index, vehicle)| {
            (
                vehicle.id.clone(),
                generate_planned_route(vehicle, index, office, bounds),
            )
        })
        .collect()
}

/// Index of the waypoint closest to `position`, using planar distance in
/// degree space. Ties keep the lowest index; an empty route yields 0.
pub fn nearest_route_index(position: LatLng, route: &[LatLng]) -> usize {
    if !position.is_finite() {
        return 0;
    }
    let mut closest_index = 0;
    let mut closest_distance = f64::INFINITY;
    for (index, point) in route.iter().enumerate() {
        let distance = position.planar_distance(*point);
        if distance < closest_distance {
            closest_distance = distance;
            closest_index = index;
        }
    }
    closest_index
}
