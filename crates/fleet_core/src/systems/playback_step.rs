//! Playback interval: moves the cursor one point per period and ends the
//! session on the last point.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::info;

use crate::clock::{EventKind, SimulationClock};
use crate::engine::{EngineState, EngineTimers, SimulationMode};
use crate::playback::{PlaybackAdvance, PlaybackStore};
use crate::scenario::ScenarioConfig;

pub fn playback_step_system(
    mut clock: ResMut<SimulationClock>,
    mut engine: ResMut<EngineState>,
    mut mode: ResMut<SimulationMode>,
    mut playback: ResMut<PlaybackStore>,
    config: Res<ScenarioConfig>,
) {
    engine.timers.playback = None;
    let state = playback.get();
    if *mode != SimulationMode::Playback || !state.is_active || !state.is_playing {
        return;
    }

    match playback.update(|state| state.advance()) {
        PlaybackAdvance::Moved(_) => {
            let interval = playback
                .get()
                .speed
                .step_interval_ms(config.0.timings.playback_interval_ms);
            EngineTimers::rearm(
                &mut engine.timers.playback,
                &mut clock,
                interval,
                EventKind::PlaybackStep,
                None,
            );
        }
        PlaybackAdvance::Finished => {
            playback.update(|state| state.stop());
            *mode = SimulationMode::Live;
            info!(cursor = playback.get().cursor, "playback reached end of track");
        }
    }
}
