#![allow(dead_code)]

use fleet_core::feed::FleetFeed;
use fleet_core::fleet::{Vehicle, VehicleId, VehicleStatus};
use fleet_core::scenario::VehicleSeed;
use fleet_core::test_helpers::{point_north_of_office, vehicle_seed};

/// In-progress seed `meters_north` of the office.
pub fn seed_north(id: &str, meters_north: f64) -> VehicleSeed {
    vehicle_seed(id, point_north_of_office(meters_north), VehicleStatus::InProgress)
}

pub fn vehicle<'a>(feed: &'a FleetFeed, id: &str) -> &'a Vehicle {
    feed.fleet()
        .vehicle(&VehicleId::from(id))
        .unwrap_or_else(|| panic!("vehicle {id} should exist"))
}

pub fn positions(feed: &FleetFeed) -> Vec<(VehicleId, fleet_core::geo::LatLng)> {
    feed.fleet()
        .vehicles
        .iter()
        .map(|vehicle| (vehicle.id.clone(), vehicle.position))
        .collect()
}
