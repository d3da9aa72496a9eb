//! Fleet runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! then runs the schedule. Operator commands enter through
//! [enqueue_command], which schedules an `OperatorCommand` event at the
//! current instant.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::commands::{FleetCommand, PendingCommands};
use crate::systems::{
    connection::simulation_started_system, expiry::expiry_system,
    fleet_tick::fleet_tick_system, history::record_trip_history_system,
    operator_command::operator_command_system, playback_step::playback_step_system,
};

fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationStarted)
        .unwrap_or(false)
}

fn is_operator_command(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::OperatorCommand)
        .unwrap_or(false)
}

fn is_fleet_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::FleetTick)
        .unwrap_or(false)
}

fn is_playback_step(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::PlaybackStep)
        .unwrap_or(false)
}

fn is_expiry(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| {
            matches!(
                e.0.kind,
                EventKind::GeofencePulseExpired
                    | EventKind::EntryHighlightExpired
                    | EventKind::PickupNotificationExpired
                    | EventKind::PickupPulseExpired
            )
        })
        .unwrap_or(false)
}

/// Builds the fleet schedule. Systems are chained so the trip history always
/// sees the positions written by the tick of the same event.
pub fn fleet_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            // SimulationStarted
            simulation_started_system.run_if(is_simulation_started),
            // OperatorCommand
            operator_command_system.run_if(is_operator_command),
            // FleetTick
            fleet_tick_system.run_if(is_fleet_tick),
            record_trip_history_system.run_if(is_fleet_tick),
            // PlaybackStep
            playback_step_system.run_if(is_playback_step),
            // *Expired
            expiry_system.run_if(is_expiry),
        )
            .chain(),
    );
    schedule
}

/// Runs one simulation step. Returns `false` when no event is pending.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs one step and invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event.clone()));
    schedule.run(world);
    hook(world, &event);
    true
}

/// Runs every event due at or before `until_ms`, then moves the clock to
/// `until_ms`. Returns the number of steps executed.
pub fn run_until(world: &mut World, schedule: &mut Schedule, until_ms: u64) -> usize {
    let mut steps = 0;
    while world
        .resource::<SimulationClock>()
        .next_event_time()
        .is_some_and(|at| at <= until_ms)
    {
        run_next_event(world, schedule);
        steps += 1;
    }
    world.resource_mut::<SimulationClock>().advance_to(until_ms);
    steps
}

/// Runs the events due at the current instant (pending commands, start-up).
pub fn run_due_events(world: &mut World, schedule: &mut Schedule) -> usize {
    let now = world.resource::<SimulationClock>().now();
    run_until(world, schedule, now)
}

/// Runs steps until the queue is empty or `max_steps` is reached. The live
/// tick reschedules itself, so this only drains a stopped engine.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Schedules the SimulationStarted event at the current instant.
/// Call this after building the scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    let now = clock.now();
    clock.schedule_at(now, EventKind::SimulationStarted, None);
}

/// Queues an operator command to be applied at the current instant.
pub fn enqueue_command(world: &mut World, command: FleetCommand) {
    world.resource_mut::<PendingCommands>().0.push_back(command);
    let mut clock = world.resource_mut::<SimulationClock>();
    let now = clock.now();
    clock.schedule_at(now, EventKind::OperatorCommand, None);
}
