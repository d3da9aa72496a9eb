//! Scenario setup: city, office and fleet roster, plus the engine timings.
//!
//! A [`FleetScenario`] is consumed read-only by [`build_scenario`], which
//! generates the planned routes and inserts every resource the schedule needs.
//! The default scenario is a six-vehicle Bengaluru roster.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy_ecs::prelude::{Resource, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::alerts::{AlertStore, AlertsState};
use crate::chance::{ChanceResource, SeededChance};
use crate::clock::SimulationClock;
use crate::commands::PendingCommands;
use crate::dashboard::{DashboardState, DashboardStore};
use crate::engine::{EngineState, SimulationMode};
use crate::fleet::{FleetState, FleetStore, VehicleId, VehicleStatus};
use crate::geo::{inside_geofence, GeoBounds, LatLng};
use crate::history::TripHistory;
use crate::playback::{PlaybackState, PlaybackStore};
use crate::routing::{generate_planned_routes, PlannedRoutes};

/// Arrival delay applied to vehicles without an explicit entry.
pub const DEFAULT_ARRIVAL_DELAY_MS: u64 = 15_000;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid scenario: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CityConfig {
    pub name: String,
    pub center: LatLng,
    pub default_zoom: u8,
    pub focus_zoom: u8,
    pub bounds: GeoBounds,
    pub zoom_limits: ZoomLimits,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            name: "Bengaluru".to_string(),
            center: LatLng::new(12.9716, 77.5946),
            default_zoom: 12,
            focus_zoom: 14,
            bounds: GeoBounds::new(LatLng::new(12.734, 77.379), LatLng::new(13.173, 77.836)),
            zoom_limits: ZoomLimits { min: 11, max: 17 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeConfig {
    pub name: String,
    pub coordinates: LatLng,
    pub geofence_radius_meters: f64,
}

impl OfficeConfig {
    pub fn contains(&self, position: LatLng) -> bool {
        inside_geofence(position, self.coordinates, self.geofence_radius_meters)
    }
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            name: "Bengaluru Operations Hub".to_string(),
            coordinates: LatLng::new(12.9698, 77.6380),
            geofence_radius_meters: 350.0,
        }
    }
}

/// Static roster entry. Speed and ETA are re-seeded on every (re)connect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSeed {
    pub id: VehicleId,
    pub label: String,
    pub vehicle_number: String,
    pub driver_name: String,
    pub phone: String,
    pub position: LatLng,
    pub status: VehicleStatus,
}

/// Periods and thresholds of the tick engine, all in simulation milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineTimings {
    pub tick_interval_ms: u64,
    pub move_ratio: f64,
    pub entry_highlight_ms: u64,
    pub alert_debounce_ms: u64,
    pub pickup_notification_ms: u64,
    pub pickup_pulse_ms: u64,
    pub playback_interval_ms: u64,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 4_000,
            move_ratio: 0.05,
            entry_highlight_ms: 2_800,
            alert_debounce_ms: 5_000,
            pickup_notification_ms: 30_000,
            pickup_pulse_ms: 2_000,
            playback_interval_ms: 3_000,
        }
    }
}

/// Everything the engine reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FleetScenario {
    pub city: CityConfig,
    pub office: OfficeConfig,
    pub vehicles: Vec<VehicleSeed>,
    /// Minimum simulation time before a free-moving vehicle may arrive.
    pub arrival_delays_ms: HashMap<VehicleId, u64>,
    pub default_arrival_delay_ms: u64,
    /// Optional recorded tracks used for playback instead of the live recording.
    pub trip_history: HashMap<VehicleId, Vec<LatLng>>,
    pub timings: EngineTimings,
    /// Seed for the default chance source; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Wall-clock milliseconds at simulation time 0. `None` uses the time the
    /// world is built.
    pub epoch_ms: Option<u64>,
}

impl Default for FleetScenario {
    fn default() -> Self {
        let arrival_delays_ms = [
            ("VH-003", 12_000),
            ("VH-004", 18_000),
            ("VH-005", 24_000),
            ("VH-006", 32_000),
        ]
        .into_iter()
        .map(|(id, delay)| (VehicleId::from(id), delay))
        .collect();

        Self {
            city: CityConfig::default(),
            office: OfficeConfig::default(),
            vehicles: default_roster(),
            arrival_delays_ms,
            default_arrival_delay_ms: DEFAULT_ARRIVAL_DELAY_MS,
            trip_history: HashMap::new(),
            timings: EngineTimings::default(),
            seed: None,
            epoch_ms: None,
        }
    }
}

impl FleetScenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        let scenario: FleetScenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_epoch_ms(mut self, epoch_ms: u64) -> Self {
        self.epoch_ms = Some(epoch_ms);
        self
    }

    pub fn with_roster(mut self, vehicles: Vec<VehicleSeed>) -> Self {
        self.vehicles = vehicles;
        self
    }

    pub fn with_arrival_delay(mut self, id: impl Into<VehicleId>, delay_ms: u64) -> Self {
        self.arrival_delays_ms.insert(id.into(), delay_ms);
        self
    }

    pub fn with_timings(mut self, timings: EngineTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_trip_history(mut self, id: impl Into<VehicleId>, track: Vec<LatLng>) -> Self {
        self.trip_history.insert(id.into(), track);
        self
    }

    pub fn arrival_delay_ms(&self, id: &VehicleId) -> u64 {
        self.arrival_delays_ms
            .get(id)
            .copied()
            .unwrap_or(self.default_arrival_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.vehicles.is_empty() {
            return Err(ScenarioError::Invalid("roster is empty".to_string()));
        }
        if !self.city.bounds.is_ordered() {
            return Err(ScenarioError::Invalid(
                "city bounds south-west corner must not exceed north-east corner".to_string(),
            ));
        }
        if !self.office.coordinates.is_finite() || !self.city.bounds.contains(self.office.coordinates)
        {
            return Err(ScenarioError::Invalid(format!(
                "office {} lies outside the city bounds",
                self.office.name
            )));
        }
        let move_ratio = self.timings.move_ratio;
        if !(move_ratio > 0.0 && move_ratio <= 1.0) {
            return Err(ScenarioError::Invalid(format!(
                "move ratio {move_ratio} must lie in (0, 1]"
            )));
        }
        let radius = self.office.geofence_radius_meters;
        if radius.is_nan() || radius <= 0.0 {
            return Err(ScenarioError::Invalid(
                "office geofence radius must be positive".to_string(),
            ));
        }
        if self.timings.tick_interval_ms == 0 || self.timings.playback_interval_ms == 0 {
            return Err(ScenarioError::Invalid(
                "tick and playback intervals must be non-zero".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for vehicle in &self.vehicles {
            if !seen.insert(&vehicle.id) {
                return Err(ScenarioError::Invalid(format!(
                    "duplicate vehicle id {}",
                    vehicle.id
                )));
            }
            if !vehicle.position.is_finite() {
                return Err(ScenarioError::Invalid(format!(
                    "vehicle {} has a non-finite position",
                    vehicle.id
                )));
            }
        }
        Ok(())
    }
}

/// Scenario data held by the world for systems that need it after startup.
#[derive(Debug, Clone, Resource)]
pub struct ScenarioConfig(pub FleetScenario);

/// Inserts every resource the fleet schedule reads. Routes are generated once
/// here and never change afterwards.
pub fn build_scenario(world: &mut World, scenario: FleetScenario) {
    let routes = generate_planned_routes(&scenario.vehicles, &scenario.office, &scenario.city.bounds);
    let chance = match scenario.seed {
        Some(seed) => SeededChance::from_seed(seed),
        None => SeededChance::from_entropy(),
    };
    let mut history = TripHistory::default();
    for (id, track) in &scenario.trip_history {
        history.replace_track(id.clone(), track.clone());
    }

    info!(
        city = %scenario.city.name,
        office = %scenario.office.name,
        vehicles = scenario.vehicles.len(),
        "fleet scenario built"
    );

    let epoch_ms = scenario.epoch_ms.unwrap_or_else(wall_clock_ms);
    world.insert_resource(SimulationClock::with_epoch(epoch_ms));
    world.insert_resource(PendingCommands::default());
    world.insert_resource(PlannedRoutes(routes));
    world.insert_resource(ChanceResource::new(chance));
    world.insert_resource(EngineState::default());
    world.insert_resource(SimulationMode::Live);
    world.insert_resource(FleetStore::new(FleetState::default()));
    world.insert_resource(AlertStore::new(AlertsState::default()));
    world.insert_resource(PlaybackStore::new(PlaybackState::default()));
    world.insert_resource(DashboardStore::new(DashboardState::default()));
    world.insert_resource(history);
    world.insert_resource(ScenarioConfig(scenario));
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

fn seed(
    id: &str,
    label: &str,
    vehicle_number: &str,
    driver_name: &str,
    phone: &str,
    position: (f64, f64),
    status: VehicleStatus,
) -> VehicleSeed {
    VehicleSeed {
        id: VehicleId::from(id),
        label: label.to_string(),
        vehicle_number: vehicle_number.to_string(),
        driver_name: driver_name.to_string(),
        phone: phone.to_string(),
        position: LatLng::new(position.0, position.1),
        status,
    }
}

/// Built-in roster.
pub fn default_roster() -> Vec<VehicleSeed> {
    vec![
        seed(
            "VH-001",
            "Van 001",
            "KA-01-TR-1101",
            "Ravi Kumar",
            "+91 98765 11001",
            (12.9703, 77.6352),
            VehicleStatus::Arrived,
        ),
        seed(
            "VH-002",
            "Truck 002",
            "KA-03-TR-2202",
            "Naveen R",
            "+91 98765 22002",
            (12.9588, 77.6461),
            VehicleStatus::Arrived,
        ),
        seed(
            "VH-003",
            "Bike 003",
            "KA-05-BK-3303",
            "Farah A",
            "+91 98765 33003",
            (12.9279, 77.5835),
            VehicleStatus::Delayed,
        ),
        seed(
            "VH-004",
            "Car 004",
            "KA-02-CR-4404",
            "Sanjay M",
            "+91 98765 44004",
            (13.0121, 77.6512),
            VehicleStatus::Delayed,
        ),
        seed(
            "VH-005",
            "Van 005",
            "KA-04-TR-5505",
            "Neha P",
            "+91 98765 55005",
            (12.8926, 77.6112),
            VehicleStatus::InProgress,
        ),
        seed(
            "VH-006",
            "Truck 006",
            "KA-06-TR-6606",
            "Arun V",
            "+91 98765 66006",
            (13.0618, 77.5797),
            VehicleStatus::InProgress,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_validates() {
        FleetScenario::default().validate().expect("default scenario is valid");
    }

    #[test]
    fn arrival_delay_falls_back_to_default() {
        let scenario = FleetScenario::default();
        assert_eq!(scenario.arrival_delay_ms(&VehicleId::from("VH-004")), 18_000);
        assert_eq!(
            scenario.arrival_delay_ms(&VehicleId::from("VH-001")),
            DEFAULT_ARRIVAL_DELAY_MS
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut roster = default_roster();
        roster[1].id = roster[0].id.clone();
        let err = FleetScenario::default()
            .with_roster(roster)
            .validate()
            .expect_err("duplicate id must fail");
        assert!(matches!(err, ScenarioError::Invalid(msg) if msg.contains("VH-001")));
    }

    #[test]
    fn office_outside_bounds_is_rejected() {
        let mut scenario = FleetScenario::default();
        scenario.office.coordinates = LatLng::new(0.0, 0.0);
        assert!(matches!(scenario.validate(), Err(ScenarioError::Invalid(_))));
    }

    #[test]
    fn json_round_trip_keeps_roster_and_fills_defaults() {
        let json = r#"{
            "office": { "name": "HQ", "coordinates": [12.97, 77.64], "geofenceRadiusMeters": 200 },
            "vehicles": [{
                "id": "CAB-1", "label": "Cab 1", "vehicleNumber": "KA-01-1",
                "driverName": "Asha", "phone": "+91 1", "position": [12.93, 77.60],
                "status": "in_progress"
            }],
            "arrivalDelaysMs": { "CAB-1": 9000 }
        }"#;
        let scenario = FleetScenario::from_json_str(json).expect("parse");
        assert_eq!(scenario.vehicles.len(), 1);
        assert_eq!(scenario.vehicles[0].status, VehicleStatus::InProgress);
        assert_eq!(scenario.office.geofence_radius_meters, 200.0);
        assert_eq!(scenario.city.name, "Bengaluru");
        assert_eq!(scenario.timings.tick_interval_ms, 4_000);
        assert_eq!(scenario.arrival_delay_ms(&VehicleId::from("CAB-1")), 9_000);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            FleetScenario::from_json_str("{ not json"),
            Err(ScenarioError::Parse(_))
        ));
    }
}
