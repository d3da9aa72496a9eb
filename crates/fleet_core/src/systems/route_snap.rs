//! Selection-triggered route snap.
//!
//! Focusing a vehicle puts it on its planned route at the nearest waypoint;
//! the vehicle that lost focus goes back to free movement on its next tick.

use crate::fleet::{FleetState, Vehicle, VehicleId};
use crate::geo::{heading_degrees, LatLng};
use crate::routing::{nearest_route_index, PlannedRoutes};

/// Moves `vehicle` onto the nearest waypoint of `route` and starts route
/// following. Returns `false` (vehicle untouched) for an empty route.
pub fn snap_vehicle(vehicle: &mut Vehicle, route: &[LatLng]) -> bool {
    if route.is_empty() {
        return false;
    }
    let index = nearest_route_index(vehicle.position, route);
    let snapped = route[index];
    if snapped != vehicle.position {
        vehicle.heading = heading_degrees(vehicle.position, snapped);
    }
    vehicle.position = snapped;
    vehicle.route_index = index;
    vehicle.is_following_route = true;
    true
}

/// Applies a selection change from `previous` to `next`. Passing the same id
/// twice re-snaps it. Arrived vehicles are left alone on both sides.
///
/// Returns whether any vehicle changed.
pub fn apply_selection(
    state: &mut FleetState,
    routes: &PlannedRoutes,
    previous: Option<&VehicleId>,
    next: Option<&VehicleId>,
) -> bool {
    let mut changed = false;
    for vehicle in state.vehicles.iter_mut() {
        if vehicle.is_arrived() {
            continue;
        }
        let is_next = next == Some(&vehicle.id);
        if previous == Some(&vehicle.id) && !is_next && vehicle.is_following_route {
            vehicle.is_following_route = false;
            changed = true;
        }
        if is_next {
            changed |= snap_vehicle(vehicle, routes.waypoints(&vehicle.id));
        }
    }
    changed
}
