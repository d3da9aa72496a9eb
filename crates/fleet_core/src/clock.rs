//! Discrete-event clock: every timer of the fleet engine (the recurring tick,
//! playback advancement, highlight and notification expiry, operator
//! commands) is an [`Event`] in one min-heap keyed by simulation time.
//!
//! Each scheduled event gets a [`TimerId`] so it can be cancelled or
//! superseded. Events sharing a timestamp fire in scheduling order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

use crate::fleet::VehicleId;

pub const ONE_SEC_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    SimulationStarted,
    OperatorCommand,
    FleetTick,
    PlaybackStep,
    GeofencePulseExpired,
    EntryHighlightExpired,
    PickupNotificationExpired,
    PickupPulseExpired,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSubject {
    Vehicle(VehicleId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: TimerId,
    pub timestamp: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, id).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event being processed by the current schedule run.
#[derive(Debug, Clone, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    /// Wall-clock milliseconds corresponding to simulation time 0.
    epoch_ms: u64,
    next_id: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn with_epoch(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            ..Self::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn epoch_ms(&self) -> u64 {
        self.epoch_ms
    }

    pub fn sim_to_real_ms(&self, sim_ms: u64) -> u64 {
        self.epoch_ms.saturating_add(sim_ms)
    }

    /// Wall-clock time of the current simulation instant.
    pub fn real_now_ms(&self) -> u64 {
        self.sim_to_real_ms(self.now)
    }

    pub fn schedule_at(
        &mut self,
        timestamp: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> TimerId {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.events.push(Event {
            id,
            timestamp: timestamp.max(self.now),
            kind,
            subject,
        });
        id
    }

    pub fn schedule_in(
        &mut self,
        delay_ms: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> TimerId {
        self.schedule_at(self.now.saturating_add(delay_ms), kind, subject)
    }

    /// Removes a pending event. Returns `false` when it already fired or was
    /// never scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.events.iter().any(|event| event.id == id)
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|event| event.timestamp)
    }

    /// Moves the clock forward without firing anything. Never moves past a
    /// pending event.
    pub fn advance_to(&mut self, timestamp: u64) {
        let limit = self.next_event_time().unwrap_or(u64::MAX);
        self.now = self.now.max(timestamp.min(limit));
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
