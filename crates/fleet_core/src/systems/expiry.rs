//! One-shot expiry timers: geofence pulse, per-vehicle entry highlight,
//! pickup notification and pickup pulse.

use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::engine::EngineState;
use crate::fleet::FleetStore;

pub fn expiry_system(
    event: Res<CurrentEvent>,
    mut engine: ResMut<EngineState>,
    mut fleet: ResMut<FleetStore>,
) {
    let event = &event.0;
    match event.kind {
        EventKind::GeofencePulseExpired => {
            engine.timers.geofence_pulse = None;
            fleet.try_update(|state| std::mem::replace(&mut state.geofence_highlighted, false));
        }
        EventKind::EntryHighlightExpired => {
            engine.timers.entry_clears.remove(&event.id);
            if let Some(EventSubject::Vehicle(id)) = &event.subject {
                fleet.try_update(|state| state.clear_recent_entry(id));
            }
        }
        EventKind::PickupNotificationExpired => {
            engine.timers.pickup_notification = None;
            fleet.try_update(|state| state.pickup_notification.take().is_some());
        }
        EventKind::PickupPulseExpired => {
            engine.timers.pickup_pulse = None;
            fleet.try_update(|state| state.pickup_pulse_vehicle.take().is_some());
        }
        _ => {}
    }
}
