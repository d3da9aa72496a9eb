//! [`FleetFeed`]: an owned world plus schedule exposing the engine's command
//! interface and observable state to the presentation layer.

use bevy_ecs::prelude::{Schedule, World};

use crate::alerts::{AlertStore, AlertsState};
use crate::chance::{ChanceResource, ChanceSource};
use crate::clock::SimulationClock;
use crate::commands::FleetCommand;
use crate::dashboard::{DashboardState, DashboardStore};
use crate::engine::SimulationMode;
use crate::fleet::{FleetState, FleetStats, FleetStore};
use crate::history::TripHistory;
use crate::playback::{PlaybackState, PlaybackStore};
use crate::routing::PlannedRoutes;
use crate::runner::{
    enqueue_command, fleet_schedule, initialize_simulation, run_due_events, run_until,
};
use crate::scenario::{build_scenario, FleetScenario, ScenarioConfig, ScenarioError};
use crate::store::SubscriptionId;
use crate::systems::connection::stop_engine;

pub struct FleetFeed {
    world: World,
    schedule: Schedule,
}

impl FleetFeed {
    /// Validates `scenario` and builds the world. Nothing runs until
    /// [`FleetFeed::start`].
    pub fn new(scenario: FleetScenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let mut world = World::new();
        build_scenario(&mut world, scenario);
        Ok(Self {
            world,
            schedule: fleet_schedule(),
        })
    }

    /// Replaces the random source, e.g. with a scripted one in tests.
    pub fn with_chance(mut self, source: impl ChanceSource + 'static) -> Self {
        self.world.insert_resource(ChanceResource::new(source));
        self
    }

    /// Seeds the fleet and schedules the first tick one period out.
    pub fn start(&mut self) {
        initialize_simulation(&mut self.world);
        run_due_events(&mut self.world, &mut self.schedule);
    }

    /// Applies `command` immediately.
    pub fn dispatch(&mut self, command: FleetCommand) {
        enqueue_command(&mut self.world, command);
        run_due_events(&mut self.world, &mut self.schedule);
    }

    /// Runs every event due in the next `duration_ms` of simulation time.
    pub fn advance_by(&mut self, duration_ms: u64) -> usize {
        let until = self.now_ms().saturating_add(duration_ms);
        run_until(&mut self.world, &mut self.schedule, until)
    }

    /// Advances by `ticks` whole tick periods.
    pub fn advance_ticks(&mut self, ticks: u64) -> usize {
        let period = self.scenario().timings.tick_interval_ms;
        self.advance_by(period.saturating_mul(ticks))
    }

    pub fn stop(&mut self) {
        stop_engine(&mut self.world);
    }

    pub fn now_ms(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn mode(&self) -> SimulationMode {
        *self.world.resource::<SimulationMode>()
    }

    pub fn scenario(&self) -> &FleetScenario {
        &self.world.resource::<ScenarioConfig>().0
    }

    pub fn fleet(&self) -> &FleetState {
        self.world.resource::<FleetStore>().get()
    }

    pub fn alerts(&self) -> &AlertsState {
        self.world.resource::<AlertStore>().get()
    }

    pub fn playback(&self) -> &PlaybackState {
        self.world.resource::<PlaybackStore>().get()
    }

    pub fn dashboard(&self) -> &DashboardState {
        self.world.resource::<DashboardStore>().get()
    }

    pub fn routes(&self) -> &PlannedRoutes {
        self.world.resource::<PlannedRoutes>()
    }

    pub fn history(&self) -> &TripHistory {
        self.world.resource::<TripHistory>()
    }

    pub fn stats(&self) -> FleetStats {
        self.fleet().stats(&self.scenario().office, self.routes())
    }

    pub fn subscribe_fleet(
        &mut self,
        observer: impl Fn(&FleetState, u64) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.world.resource_mut::<FleetStore>().subscribe(observer)
    }

    pub fn subscribe_alerts(
        &mut self,
        observer: impl Fn(&AlertsState, u64) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.world.resource_mut::<AlertStore>().subscribe(observer)
    }

    pub fn subscribe_playback(
        &mut self,
        observer: impl Fn(&PlaybackState, u64) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.world.resource_mut::<PlaybackStore>().subscribe(observer)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
