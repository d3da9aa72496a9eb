//! The live tick: advances every vehicle one step toward the office, detects
//! geofence and pickup entries, and raises debounced alerts.
//!
//! Per vehicle the state is effectively `(status, is_following_route)`:
//! arrived vehicles are only re-normalized, route followers hop to the next
//! waypoint, and everything else closes a fixed ratio of the remaining
//! distance to the office. The random draws happen in a fixed order
//! (escalation, de-escalation, speed jitter) so a scripted chance source can
//! steer every branch.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, info};

use crate::alerts::{AlertKind, AlertStore};
use crate::chance::ChanceResource;
use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::dashboard::DashboardStore;
use crate::engine::{EngineState, EngineTimers, SimulationMode};
use crate::fleet::{normalize_arrived, FleetState, FleetStore, PickupNotification, Vehicle, VehicleStatus};
use crate::geo::{heading_degrees, inside_geofence, GeoBounds, LatLng};
use crate::routing::{PlannedRoute, PlannedRoutes};
use crate::scenario::{EngineTimings, OfficeConfig, ScenarioConfig};

const ESCALATION_THRESHOLD: f64 = 0.92;
const DEESCALATION_THRESHOLD: f64 = 0.7;
const MIN_SPEED_KMPH: f64 = 12.0;
const MAX_SPEED_KMPH: f64 = 45.0;
/// Full width of the per-tick speed random walk.
const SPEED_JITTER_KMPH: f64 = 4.0;
const MIN_MOVING_ETA_MINUTES: u32 = 2;

/// Everything a single vehicle step reads besides the vehicle itself.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub office: &'a OfficeConfig,
    pub bounds: &'a GeoBounds,
    /// Planned waypoints for the vehicle; empty when it has none.
    pub route: &'a [LatLng],
    pub move_ratio: f64,
    /// Whether the vehicle's arrival delay has elapsed.
    pub can_arrive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleStep {
    pub vehicle: Vehicle,
    pub entered_geofence: bool,
    /// Moved into `Alert` from a non-alert status this step.
    pub escalated: bool,
}

/// Advances one vehicle by one tick. Does not touch alerts, timers or
/// pickups; the tick system applies those from the returned flags.
pub fn step_vehicle(vehicle: &Vehicle, input: &StepInput<'_>, chance: &mut ChanceResource) -> VehicleStep {
    if vehicle.is_arrived() {
        let mut normalized = normalize_arrived(vehicle, input.office);
        normalized.speed_kmph = 0;
        normalized.eta_minutes = 0;
        return VehicleStep {
            vehicle: normalized,
            entered_geofence: false,
            escalated: false,
        };
    }

    let mut next = vehicle.clone();
    let mut position = vehicle.position;
    let mut status = vehicle.status();
    let mut entered_geofence = false;
    let mut escalated = false;

    if vehicle.is_following_route {
        match input.route.len().checked_sub(1) {
            Some(last) => {
                let index = (vehicle.route_index.min(last) + 1).min(last);
                position = input.route[index];
                next.route_index = index;

                let reached_end = index >= last;
                entered_geofence = reached_end && input.office.contains(position);
                next.is_following_route = !reached_end && !entered_geofence;
                if entered_geofence {
                    status = VehicleStatus::Arrived;
                }
            }
            None => next.is_following_route = false,
        }
    } else {
        position = input
            .bounds
            .clamp(vehicle.position.lerp(input.office.coordinates, input.move_ratio));
        entered_geofence = input.office.contains(position) && input.can_arrive;

        let should_escalate = !matches!(status, VehicleStatus::Alert | VehicleStatus::Arrived)
            && chance.exceeds(ESCALATION_THRESHOLD);

        if entered_geofence {
            status = VehicleStatus::Arrived;
        } else if should_escalate {
            status = VehicleStatus::Alert;
            escalated = true;
        } else if status == VehicleStatus::Alert && chance.exceeds(DEESCALATION_THRESHOLD) {
            status = VehicleStatus::InProgress;
        }
    }

    let final_position = if entered_geofence {
        input.office.coordinates
    } else {
        position
    };
    if final_position != vehicle.position {
        next.heading = heading_degrees(vehicle.position, final_position);
    }
    next.position = final_position;

    let jitter = (chance.next_unit() - 0.5) * SPEED_JITTER_KMPH;
    let speed = (f64::from(vehicle.speed_kmph) + jitter).clamp(MIN_SPEED_KMPH, MAX_SPEED_KMPH);
    let eta = vehicle.eta_minutes.saturating_sub(1).max(MIN_MOVING_ETA_MINUTES);
    if entered_geofence {
        next.speed_kmph = 0;
        next.eta_minutes = 0;
    } else {
        next.speed_kmph = speed.round() as u32;
        next.eta_minutes = eta;
    }

    next.transition_to(status);

    VehicleStep {
        vehicle: next,
        entered_geofence,
        escalated,
    }
}

/// Tests the selected vehicle's final position against its untriggered
/// pickups. Each pickup fires once per vehicle per session.
fn detect_pickups(
    state: &mut FleetState,
    engine: &mut EngineState,
    clock: &mut SimulationClock,
    timings: &EngineTimings,
    plan: &PlannedRoute,
    vehicle: &Vehicle,
) {
    for (index, pickup) in plan.pickups.iter().enumerate() {
        if engine.pickup_triggered(&vehicle.id, index)
            || !inside_geofence(vehicle.position, pickup.position, pickup.radius_meters)
        {
            continue;
        }
        engine.trigger_pickup(&vehicle.id, index);
        info!(vehicle = %vehicle.id, pickup = %pickup.name, "pickup reached");

        state.pickup_notification = Some(PickupNotification {
            message: format!("Cab arrived for {}", pickup.name),
            employee_name: pickup.name.clone(),
            vehicle_id: vehicle.id.clone(),
            raised_at_ms: clock.real_now_ms(),
        });
        state.pickup_pulse_vehicle = Some(vehicle.id.clone());

        EngineTimers::rearm(
            &mut engine.timers.pickup_pulse,
            clock,
            timings.pickup_pulse_ms,
            EventKind::PickupPulseExpired,
            None,
        );
        EngineTimers::rearm(
            &mut engine.timers.pickup_notification,
            clock,
            timings.pickup_notification_ms,
            EventKind::PickupNotificationExpired,
            None,
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub fn fleet_tick_system(
    mut clock: ResMut<SimulationClock>,
    mut engine: ResMut<EngineState>,
    mode: Res<SimulationMode>,
    mut fleet: ResMut<FleetStore>,
    mut alerts: ResMut<AlertStore>,
    dashboard: Res<DashboardStore>,
    routes: Res<PlannedRoutes>,
    mut chance: ResMut<ChanceResource>,
    config: Res<ScenarioConfig>,
) {
    let scenario = &config.0;
    let timings = &scenario.timings;
    let clock = &mut *clock;
    let engine = &mut *engine;

    EngineTimers::rearm(
        &mut engine.timers.tick,
        clock,
        timings.tick_interval_ms,
        EventKind::FleetTick,
        None,
    );

    if !engine.has_connected {
        engine.has_connected = true;
        fleet.update(|state| state.is_connecting = false);
        info!("fleet feed connected");
    }

    if *mode == SimulationMode::Playback {
        debug!("playback active, live tick skipped");
        return;
    }

    let now = clock.now();
    let real_now = clock.real_now_ms();
    let elapsed = engine.elapsed_since_start(now);
    let selected = dashboard.get().selected_vehicle_id.clone();
    let alerts = &mut *alerts;
    let chance = &mut *chance;
    let mut emitted = 0_usize;

    fleet.update(|state| {
        for index in 0..state.vehicles.len() {
            let previous = &state.vehicles[index];
            let was_arrived = previous.is_arrived();
            let previous_status = previous.status();
            let input = StepInput {
                office: &scenario.office,
                bounds: &scenario.city.bounds,
                route: routes.waypoints(&previous.id),
                move_ratio: timings.move_ratio,
                can_arrive: elapsed >= scenario.arrival_delay_ms(&previous.id),
            };
            let step = step_vehicle(previous, &input, chance);
            let vehicle = step.vehicle;
            if vehicle.status() != previous_status {
                debug!(
                    vehicle = %vehicle.id,
                    from = ?previous_status,
                    to = ?vehicle.status(),
                    "vehicle status changed"
                );
            }

            let can_emit = engine.can_emit_alert(now, timings.alert_debounce_ms);

            if step.entered_geofence && engine.entered_vehicles.insert(vehicle.id.clone()) {
                state.add_recent_entry(vehicle.id.clone());
                info!(vehicle = %vehicle.id, "vehicle entered office geofence");
                if can_emit {
                    alerts.update(|log| {
                        log.add_alert(
                            AlertKind::Geofence,
                            format!("{} entered office geofence", vehicle.vehicle_number),
                            vehicle.id.clone(),
                            real_now,
                        )
                    });
                    engine.last_alert_at_ms = Some(now);
                    emitted += 1;
                }

                EngineTimers::rearm(
                    &mut engine.timers.geofence_pulse,
                    clock,
                    timings.entry_highlight_ms,
                    EventKind::GeofencePulseExpired,
                    None,
                );
                let clear = clock.schedule_in(
                    timings.entry_highlight_ms,
                    EventKind::EntryHighlightExpired,
                    Some(EventSubject::Vehicle(vehicle.id.clone())),
                );
                engine.timers.entry_clears.insert(clear);
            }

            if step.escalated && can_emit {
                alerts.update(|log| {
                    log.add_alert(
                        AlertKind::Delay,
                        format!("{} requires operator attention", vehicle.vehicle_number),
                        vehicle.id.clone(),
                        real_now,
                    )
                });
                engine.last_alert_at_ms = Some(now);
                emitted += 1;
                info!(vehicle = %vehicle.id, "vehicle escalated to alert");
            }

            if !was_arrived && selected.as_ref() == Some(&vehicle.id) {
                if let Some(plan) = routes.get(&vehicle.id) {
                    detect_pickups(state, engine, clock, timings, plan, &vehicle);
                }
            }

            state.vehicles[index] = vehicle;
        }
    });

    debug!(
        at_ms = now,
        vehicles = fleet.get().vehicles.len(),
        alerts = emitted,
        "fleet tick"
    );
}
