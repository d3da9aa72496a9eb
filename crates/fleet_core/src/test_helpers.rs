//! Test helpers for common fleet fixtures.
//!
//! Shared by unit tests, the integration suites under `tests/` and the
//! benchmarks.

use bevy_ecs::prelude::World;

use crate::chance::{ChanceResource, ScriptedChance};
use crate::fleet::{VehicleId, VehicleStatus};
use crate::geo::LatLng;
use crate::scenario::{build_scenario, default_roster, FleetScenario, OfficeConfig, VehicleSeed};

/// Fixed wall-clock epoch for reproducible alert timestamps.
pub const TEST_EPOCH_MS: u64 = 1_700_000_000_000;

/// The built-in office.
pub fn test_office() -> OfficeConfig {
    OfficeConfig::default()
}

/// A point `meters_north` due north of the office.
pub fn point_north_of_office(meters_north: f64) -> LatLng {
    let office = test_office().coordinates;
    LatLng::new(office.lat + meters_north / 111_195.0, office.lng)
}

pub fn vehicle_seed(id: &str, position: LatLng, status: VehicleStatus) -> VehicleSeed {
    VehicleSeed {
        id: VehicleId::from(id),
        label: format!("Van {id}"),
        vehicle_number: format!("KA01{}", id.replace('-', "")),
        driver_name: format!("Driver {id}"),
        phone: "+91 90000 00000".to_string(),
        position,
        status,
    }
}

/// Default scenario with a fixed seed and epoch.
pub fn seeded_scenario(seed: u64) -> FleetScenario {
    FleetScenario::default()
        .with_seed(seed)
        .with_epoch_ms(TEST_EPOCH_MS)
}

/// Single-vehicle scenario: `id` starts `meters_north` of the office and may
/// arrive after `arrival_delay_ms`.
pub fn single_vehicle_scenario(id: &str, meters_north: f64, arrival_delay_ms: u64) -> FleetScenario {
    FleetScenario::default()
        .with_roster(vec![vehicle_seed(
            id,
            point_north_of_office(meters_north),
            VehicleStatus::InProgress,
        )])
        .with_arrival_delay(id, arrival_delay_ms)
        .with_seed(1)
        .with_epoch_ms(TEST_EPOCH_MS)
}

/// `n` in-progress vehicles spread on a ring around the office.
pub fn synthetic_roster(n: usize) -> Vec<VehicleSeed> {
    let office = test_office().coordinates;
    (0..n)
        .map(|index| {
            let angle = index as f64 / n.max(1) as f64 * std::f64::consts::TAU;
            let radius = 0.05 + (index % 7) as f64 * 0.01;
            let position = LatLng::new(
                office.lat + radius * angle.sin(),
                office.lng + radius * angle.cos(),
            );
            vehicle_seed(&format!("VH-{index:04}"), position, VehicleStatus::InProgress)
        })
        .collect()
}

/// World with the default scenario and a constant scripted chance source.
pub fn create_test_world(chance: f64) -> World {
    let mut world = World::new();
    build_scenario(&mut world, seeded_scenario(7));
    world.insert_resource(ChanceResource::new(ScriptedChance::constant(chance)));
    world
}

/// Ids of the built-in roster in order.
pub fn default_roster_ids() -> Vec<VehicleId> {
    default_roster().into_iter().map(|seed| seed.id).collect()
}
