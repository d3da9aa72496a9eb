#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use fleet_core::commands::FleetCommand;
use fleet_core::runner::{
    enqueue_command, fleet_schedule, initialize_simulation, run_due_events, run_next_event,
    run_until, run_until_empty,
};

/// Helper that owns a reusable `Schedule` so tests can step a bare world.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self {
            schedule: fleet_schedule(),
        }
    }

    /// Schedule SimulationStarted and run it.
    pub fn start(&mut self, world: &mut World) {
        initialize_simulation(world);
        run_due_events(world, &mut self.schedule);
    }

    /// Run a single event (returns `true` if an event was processed).
    pub fn run_one(&mut self, world: &mut World) -> bool {
        run_next_event(world, &mut self.schedule)
    }

    pub fn run_until(&mut self, world: &mut World, until_ms: u64) -> usize {
        run_until(world, &mut self.schedule, until_ms)
    }

    pub fn run_until_empty(&mut self, world: &mut World, max_steps: usize) -> usize {
        run_until_empty(world, &mut self.schedule, max_steps)
    }

    pub fn command(&mut self, world: &mut World, command: FleetCommand) {
        enqueue_command(world, command);
        run_due_events(world, &mut self.schedule);
    }
}
