//! Fleet data model: vehicles, their status machine, and the fleet store.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geo::{distance_meters, LatLng};
use crate::routing::PlannedRoutes;
use crate::scenario::{OfficeConfig, VehicleSeed};
use crate::store::Store;

/// Distance under which a vehicle counts as approaching one of its pickups.
pub const APPROACHING_PICKUP_METERS: f64 = 350.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Idle,
    InProgress,
    Delayed,
    Alert,
    Arrived,
}

impl VehicleStatus {
    /// Transition table of the tick engine.
    ///
    /// `Arrived` is terminal except for the demotion to `InProgress` performed
    /// by [`normalize_arrived`]. `Idle` and `Delayed` are roster-only states:
    /// the engine never moves a vehicle into them.
    pub fn can_transition_to(self, next: VehicleStatus) -> bool {
        use VehicleStatus::*;
        match (self, next) {
            (current, next) if current == next => true,
            (Arrived, InProgress) => true,
            (Arrived, _) => false,
            (_, Idle | Delayed) => false,
            (_, InProgress | Alert | Arrived) => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VehicleStatus::Idle => "Idle",
            VehicleStatus::InProgress => "In Progress",
            VehicleStatus::Delayed => "Delayed",
            VehicleStatus::Alert => "Alert",
            VehicleStatus::Arrived => "Arrived",
        }
    }

    pub fn is_moving(self) -> bool {
        !matches!(self, VehicleStatus::Arrived)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fleet unit as seen by the presentation layer.
///
/// Status changes go through [`Vehicle::transition_to`] so the transition
/// table is enforced at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: VehicleId,
    pub label: String,
    pub vehicle_number: String,
    pub driver_name: String,
    pub phone: String,
    pub position: LatLng,
    /// Degrees in `[0, 360)`.
    pub heading: f64,
    pub speed_kmph: u32,
    pub eta_minutes: u32,
    status: VehicleStatus,
    pub is_following_route: bool,
    /// Only meaningful while `is_following_route` is set.
    pub route_index: usize,
}

impl Vehicle {
    /// Builds a stationary vehicle from its roster entry.
    pub fn from_seed(seed: &VehicleSeed) -> Self {
        Self {
            id: seed.id.clone(),
            label: seed.label.clone(),
            vehicle_number: seed.vehicle_number.clone(),
            driver_name: seed.driver_name.clone(),
            phone: seed.phone.clone(),
            position: seed.position,
            heading: 0.0,
            speed_kmph: 0,
            eta_minutes: 0,
            status: seed.status,
            is_following_route: false,
            route_index: 0,
        }
    }

    pub fn with_kinematics(mut self, speed_kmph: u32, eta_minutes: u32) -> Self {
        self.speed_kmph = speed_kmph;
        self.eta_minutes = eta_minutes;
        self
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn is_arrived(&self) -> bool {
        self.status == VehicleStatus::Arrived
    }

    /// Applies `next` when the transition table allows it. Refused transitions
    /// leave the vehicle untouched and return `false`.
    pub fn transition_to(&mut self, next: VehicleStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            warn!(
                vehicle = %self.id,
                from = ?self.status,
                to = ?next,
                "refused vehicle status transition"
            );
            false
        }
    }
}

/// Restores the arrived invariant: an arrived vehicle sits exactly on the
/// office coordinates with zero speed and ETA, or it is demoted back to
/// `InProgress` so the next tick moves it again.
///
/// Vehicles in any other status pass through unchanged. Idempotent.
pub fn normalize_arrived(vehicle: &Vehicle, office: &OfficeConfig) -> Vehicle {
    let mut normalized = vehicle.clone();
    if !vehicle.is_arrived() {
        return normalized;
    }

    normalized.speed_kmph = 0;
    normalized.eta_minutes = 0;
    if office.contains(vehicle.position) {
        normalized.position = office.coordinates;
    } else {
        normalized.transition_to(VehicleStatus::InProgress);
    }
    normalized
}

/// Single process-wide pickup banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupNotification {
    pub message: String,
    pub employee_name: String,
    pub vehicle_id: VehicleId,
    pub raised_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FleetState {
    /// Roster order.
    pub vehicles: Vec<Vehicle>,
    /// Vehicles that entered the office geofence within the highlight window.
    pub recently_entered: Vec<VehicleId>,
    pub geofence_highlighted: bool,
    pub is_connecting: bool,
    pub connection_attempt: u32,
    pub pickup_notification: Option<PickupNotification>,
    pub pickup_pulse_vehicle: Option<VehicleId>,
}

impl Default for FleetState {
    fn default() -> Self {
        Self {
            vehicles: Vec::new(),
            recently_entered: Vec::new(),
            geofence_highlighted: false,
            is_connecting: true,
            connection_attempt: 0,
            pickup_notification: None,
            pickup_pulse_vehicle: None,
        }
    }
}

impl FleetState {
    pub fn vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| &vehicle.id == id)
    }

    pub fn vehicle_mut(&mut self, id: &VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|vehicle| &vehicle.id == id)
    }

    pub fn add_recent_entry(&mut self, id: VehicleId) {
        if !self.recently_entered.contains(&id) {
            self.recently_entered.push(id);
        }
        self.geofence_highlighted = true;
    }

    pub fn clear_recent_entry(&mut self, id: &VehicleId) -> bool {
        let before = self.recently_entered.len();
        self.recently_entered.retain(|entry| entry != id);
        self.recently_entered.len() != before
    }

    pub fn stats(&self, office: &OfficeConfig, routes: &PlannedRoutes) -> FleetStats {
        let mut stats = FleetStats::default();
        for vehicle in &self.vehicles {
            match vehicle.status() {
                VehicleStatus::InProgress => stats.active_trips += 1,
                VehicleStatus::Delayed => stats.delayed_trips += 1,
                _ => {}
            }
            if office.contains(vehicle.position) {
                stats.inside_office += 1;
            }
            let approaching = routes.get(&vehicle.id).is_some_and(|route| {
                route.pickups.iter().any(|pickup| {
                    distance_meters(vehicle.position, pickup.position) <= APPROACHING_PICKUP_METERS
                })
            });
            if approaching {
                stats.approaching_pickup += 1;
            }
        }
        stats
    }
}

/// Headline counts for the trip summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub active_trips: usize,
    pub delayed_trips: usize,
    pub inside_office: usize,
    pub approaching_pickup: usize,
}

pub type FleetStore = Store<FleetState>;
