#![allow(dead_code)]

use fleet_core::chance::ScriptedChance;
use fleet_core::feed::FleetFeed;
use fleet_core::geo::LatLng;
use fleet_core::scenario::{EngineTimings, FleetScenario, VehicleSeed};
use fleet_core::test_helpers::seeded_scenario;

/// Builder for reproducible feeds. Defaults to the built-in roster with a
/// constant 0.5 chance source, which never escalates.
pub struct TestFeedBuilder {
    scenario: FleetScenario,
    /// `None` keeps the scenario's seeded random source.
    chance: Option<ScriptedChance>,
}

impl Default for TestFeedBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFeedBuilder {
    pub fn new() -> Self {
        Self {
            scenario: seeded_scenario(42),
            chance: Some(ScriptedChance::constant(0.5)),
        }
    }

    pub fn with_roster(mut self, roster: Vec<VehicleSeed>) -> Self {
        self.scenario = self.scenario.with_roster(roster);
        self
    }

    pub fn with_arrival_delay(mut self, id: &str, delay_ms: u64) -> Self {
        self.scenario = self.scenario.with_arrival_delay(id, delay_ms);
        self
    }

    pub fn with_trip_history(mut self, id: &str, track: Vec<LatLng>) -> Self {
        self.scenario = self.scenario.with_trip_history(id, track);
        self
    }

    pub fn with_timings(mut self, timings: EngineTimings) -> Self {
        self.scenario = self.scenario.with_timings(timings);
        self
    }

    pub fn with_constant_chance(mut self, value: f64) -> Self {
        self.chance = Some(ScriptedChance::constant(value));
        self
    }

    /// Samples consumed in order: two per moving vehicle at seeding, then per
    /// tick and vehicle the escalation (or de-escalation) draw and the speed
    /// draw.
    pub fn with_chance_sequence(mut self, samples: Vec<f64>, fallback: f64) -> Self {
        self.chance = Some(ScriptedChance::sequence(samples, fallback));
        self
    }

    /// Uses a seeded pseudo-random source instead of a scripted one.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.scenario = self.scenario.with_seed(seed);
        self.chance = None;
        self
    }

    pub fn build(self) -> FleetFeed {
        let feed = FleetFeed::new(self.scenario).expect("test scenario should be valid");
        match self.chance {
            Some(chance) => feed.with_chance(chance),
            None => feed,
        }
    }

    pub fn start(self) -> FleetFeed {
        let mut feed = self.build();
        feed.start();
        feed
    }
}
