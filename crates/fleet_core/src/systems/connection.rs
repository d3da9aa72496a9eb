//! Connection lifecycle: seeding the fleet on start and reconnect, and
//! tearing the engine down.

use bevy_ecs::prelude::{Mut, Res, ResMut, World};
use tracing::info;

use crate::chance::ChanceResource;
use crate::clock::{EventKind, SimulationClock};
use crate::engine::{EngineState, EngineTimers, SimulationMode};
use crate::fleet::{normalize_arrived, FleetStore, Vehicle, VehicleStatus};
use crate::history::TripHistory;
use crate::playback::PlaybackStore;
use crate::scenario::{FleetScenario, ScenarioConfig};

/// Builds the initial vehicle list from the roster. Moving vehicles get a
/// random cruising speed and ETA; arrived ones are normalized in place.
pub fn seed_vehicles(scenario: &FleetScenario, chance: &mut ChanceResource) -> Vec<Vehicle> {
    scenario
        .vehicles
        .iter()
        .map(|seed| {
            let vehicle = Vehicle::from_seed(seed);
            let vehicle = if seed.status == VehicleStatus::Arrived {
                vehicle.with_kinematics(0, 0)
            } else {
                let speed = 28 + (chance.next_unit() * 18.0).floor() as u32;
                let eta = 18 + (chance.next_unit() * 12.0).floor() as u32;
                vehicle.with_kinematics(speed, eta)
            };
            normalize_arrived(&vehicle, &scenario.office)
        })
        .collect()
}

/// (Re)starts the live feed: cancels live timers, reseeds the fleet, resets
/// the simulation start time and schedules the first tick one period out.
///
/// Pickup triggers, the alert debounce and the current selection survive.
pub fn connect_fleet(
    clock: &mut SimulationClock,
    engine: &mut EngineState,
    fleet: &mut FleetStore,
    history: &mut TripHistory,
    chance: &mut ChanceResource,
    scenario: &FleetScenario,
) {
    engine.timers.cancel_live(clock);
    engine.running = true;
    engine.has_connected = false;
    engine.simulation_start_ms = clock.now();

    let vehicles = seed_vehicles(scenario, chance);
    engine.entered_vehicles = vehicles
        .iter()
        .filter(|vehicle| vehicle.is_arrived())
        .map(|vehicle| vehicle.id.clone())
        .collect();

    history.clear_recorded();
    for vehicle in &vehicles {
        history.record(&vehicle.id, vehicle.position);
    }

    let attempt = fleet.update(|state| {
        state.vehicles = vehicles;
        state.is_connecting = true;
        state.recently_entered.clear();
        state.geofence_highlighted = false;
        state.pickup_notification = None;
        state.pickup_pulse_vehicle = None;
        state.connection_attempt
    });

    EngineTimers::rearm(
        &mut engine.timers.tick,
        clock,
        scenario.timings.tick_interval_ms,
        EventKind::FleetTick,
        None,
    );

    info!(
        attempt,
        vehicles = scenario.vehicles.len(),
        already_arrived = engine.entered_vehicles.len(),
        "fleet feed connecting"
    );
}

pub fn simulation_started_system(
    mut clock: ResMut<SimulationClock>,
    mut engine: ResMut<EngineState>,
    mut fleet: ResMut<FleetStore>,
    mut history: ResMut<TripHistory>,
    mut chance: ResMut<ChanceResource>,
    config: Res<ScenarioConfig>,
) {
    connect_fleet(
        &mut clock,
        &mut engine,
        &mut fleet,
        &mut history,
        &mut chance,
        &config.0,
    );
}

/// Cancels the recurring tick, the playback interval and every pending
/// expiry timer. Any playback is stopped and the mode falls back to live;
/// the fleet and alert stores keep their last state.
pub fn stop_engine(world: &mut World) {
    world.resource_scope(|world, mut engine: Mut<EngineState>| {
        let mut clock = world.resource_mut::<SimulationClock>();
        engine.timers.cancel_all(&mut clock);
        engine.running = false;
    });
    world.resource_mut::<PlaybackStore>().try_update(|state| {
        let was_running = state.is_active || state.is_playing;
        state.stop();
        was_running
    });
    *world.resource_mut::<SimulationMode>() = SimulationMode::Live;
    info!("fleet feed stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chance::ScriptedChance;
    use crate::fleet::FleetState;

    #[test]
    fn seeding_draws_speed_then_eta() {
        let scenario = FleetScenario::default();
        let mut chance = ChanceResource::new(ScriptedChance::constant(0.5));
        let vehicles = seed_vehicles(&scenario, &mut chance);

        assert_eq!(vehicles.len(), scenario.vehicles.len());
        for vehicle in vehicles.iter().filter(|vehicle| !vehicle.is_arrived()) {
            if vehicle.speed_kmph == 0 {
                // Demoted from arrived: no kinematics were drawn.
                continue;
            }
            assert_eq!(vehicle.speed_kmph, 37);
            assert_eq!(vehicle.eta_minutes, 24);
        }
        for vehicle in vehicles.iter().filter(|vehicle| vehicle.is_arrived()) {
            assert_eq!(vehicle.position, scenario.office.coordinates);
            assert_eq!((vehicle.speed_kmph, vehicle.eta_minutes), (0, 0));
        }
    }

    #[test]
    fn connect_schedules_first_tick_and_marks_connecting() {
        let scenario = FleetScenario::default();
        let mut clock = SimulationClock::default();
        let mut engine = EngineState::default();
        let mut fleet = FleetStore::new(FleetState {
            is_connecting: false,
            ..FleetState::default()
        });
        let mut history = TripHistory::default();
        let mut chance = ChanceResource::new(ScriptedChance::constant(0.5));

        connect_fleet(
            &mut clock,
            &mut engine,
            &mut fleet,
            &mut history,
            &mut chance,
            &scenario,
        );

        assert!(fleet.get().is_connecting);
        assert!(engine.running);
        assert_eq!(clock.next_event_time(), Some(scenario.timings.tick_interval_ms));
        for vehicle in &fleet.get().vehicles {
            assert_eq!(history.track(&vehicle.id), &[vehicle.position]);
            assert_eq!(
                engine.entered_vehicles.contains(&vehicle.id),
                vehicle.is_arrived()
            );
        }
    }
}
