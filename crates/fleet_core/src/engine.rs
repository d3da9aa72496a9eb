//! Long-lived bookkeeping of the tick engine: mode gate, timer handles,
//! alert debounce and the per-session trigger sets.

use std::collections::{BTreeSet, HashMap, HashSet};

use bevy_ecs::prelude::Resource;

use crate::clock::{EventKind, EventSubject, SimulationClock, TimerId};
use crate::fleet::VehicleId;

/// Live simulation and playback never run together. Only operator commands
/// switch the mode; the live tick keeps firing during playback but leaves the
/// fleet untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Resource)]
pub enum SimulationMode {
    #[default]
    Live,
    Playback,
}

/// Handles of every pending timer owned by the engine.
#[derive(Debug, Default)]
pub struct EngineTimers {
    pub tick: Option<TimerId>,
    pub playback: Option<TimerId>,
    pub geofence_pulse: Option<TimerId>,
    pub pickup_notification: Option<TimerId>,
    pub pickup_pulse: Option<TimerId>,
    pub entry_clears: HashSet<TimerId>,
}

impl EngineTimers {
    /// Cancels whatever `slot` holds and schedules a replacement.
    pub fn rearm(
        slot: &mut Option<TimerId>,
        clock: &mut SimulationClock,
        delay_ms: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) {
        if let Some(previous) = slot.take() {
            clock.cancel(previous);
        }
        *slot = Some(clock.schedule_in(delay_ms, kind, subject));
    }

    pub fn disarm(slot: &mut Option<TimerId>, clock: &mut SimulationClock) {
        if let Some(previous) = slot.take() {
            clock.cancel(previous);
        }
    }

    /// Cancels the recurring tick and every one-shot expiry timer. The
    /// playback interval is left alone.
    pub fn cancel_live(&mut self, clock: &mut SimulationClock) {
        Self::disarm(&mut self.tick, clock);
        Self::disarm(&mut self.geofence_pulse, clock);
        Self::disarm(&mut self.pickup_notification, clock);
        Self::disarm(&mut self.pickup_pulse, clock);
        for id in self.entry_clears.drain() {
            clock.cancel(id);
        }
    }

    pub fn cancel_all(&mut self, clock: &mut SimulationClock) {
        self.cancel_live(clock);
        Self::disarm(&mut self.playback, clock);
    }
}

#[derive(Debug, Default, Resource)]
pub struct EngineState {
    pub running: bool,
    /// Set by the first tick after a (re)connect.
    pub has_connected: bool,
    pub simulation_start_ms: u64,
    /// Shared by every alert kind.
    pub last_alert_at_ms: Option<u64>,
    /// Vehicles that already produced their geofence entry this session.
    pub entered_vehicles: HashSet<VehicleId>,
    /// Pickup indices already announced, per vehicle. Survives reconnects.
    pub pickups_triggered: HashMap<VehicleId, BTreeSet<usize>>,
    /// Selection the route snap last acted on.
    pub previous_selection: Option<VehicleId>,
    pub timers: EngineTimers,
}

impl EngineState {
    pub fn can_emit_alert(&self, now_ms: u64, debounce_ms: u64) -> bool {
        self.last_alert_at_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= debounce_ms)
    }

    pub fn elapsed_since_start(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.simulation_start_ms)
    }

    /// Marks a pickup as announced. Returns `false` if it already was.
    pub fn trigger_pickup(&mut self, vehicle: &VehicleId, index: usize) -> bool {
        self.pickups_triggered
            .entry(vehicle.clone())
            .or_default()
            .insert(index)
    }

    pub fn pickup_triggered(&self, vehicle: &VehicleId, index: usize) -> bool {
        self.pickups_triggered
            .get(vehicle)
            .is_some_and(|indices| indices.contains(&index))
    }
}
