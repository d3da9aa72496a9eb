use bevy_ecs::prelude::{Res, ResMut};

use crate::engine::SimulationMode;
use crate::fleet::FleetStore;
use crate::history::TripHistory;

/// Appends every vehicle's post-tick position to its track. Ticks skipped
/// during playback record nothing.
pub fn record_trip_history_system(
    mode: Res<SimulationMode>,
    fleet: Res<FleetStore>,
    mut history: ResMut<TripHistory>,
) {
    if *mode != SimulationMode::Live {
        return;
    }
    for vehicle in &fleet.get().vehicles {
        history.record(&vehicle.id, vehicle.position);
    }
}
