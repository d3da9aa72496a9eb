//! Applies queued operator intents: selection, playback control, alert
//! handling, driver calls and reconnects.
//!
//! Commands drain in the order they were issued. The live tick timer is never
//! touched by playback commands; the mode switch alone suspends its effect.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, info};

use crate::alerts::{AlertKind, AlertStore};
use crate::chance::ChanceResource;
use crate::clock::{EventKind, SimulationClock};
use crate::commands::{FleetCommand, PendingCommands};
use crate::dashboard::DashboardStore;
use crate::engine::{EngineState, EngineTimers, SimulationMode};
use crate::fleet::{FleetStore, VehicleId};
use crate::history::TripHistory;
use crate::playback::{PlaybackSpeed, PlaybackStore};
use crate::routing::PlannedRoutes;
use crate::scenario::ScenarioConfig;
use crate::systems::connection::connect_fleet;
use crate::systems::route_snap::apply_selection;

struct CommandContext<'a> {
    clock: &'a mut SimulationClock,
    engine: &'a mut EngineState,
    mode: &'a mut SimulationMode,
    fleet: &'a mut FleetStore,
    alerts: &'a mut AlertStore,
    playback: &'a mut PlaybackStore,
    dashboard: &'a mut DashboardStore,
    routes: &'a PlannedRoutes,
    history: &'a mut TripHistory,
    chance: &'a mut ChanceResource,
    config: &'a ScenarioConfig,
}

impl CommandContext<'_> {
    fn apply(&mut self, command: FleetCommand) {
        debug!(?command, "operator command");
        match command {
            FleetCommand::SelectVehicle { id, force } => self.select_vehicle(id, force),
            FleetCommand::SetPlaybackVehicle(id) => self.set_playback_vehicle(id),
            FleetCommand::StartPlayback(id) => self.start_playback(id),
            FleetCommand::StopPlayback => self.stop_playback(),
            FleetCommand::TogglePlay => self.toggle_play(),
            FleetCommand::SetSpeedMultiplier(speed) => self.set_speed(speed),
            FleetCommand::ScrubPlayback(index) => {
                self.playback.try_update(|state| {
                    if state.track.is_empty() {
                        return false;
                    }
                    state.scrub(index);
                    true
                });
            }
            FleetCommand::OpenAlert(alert_id) => self.open_alert(&alert_id),
            FleetCommand::MarkAllAlertsRead => {
                self.alerts.try_update(|log| log.mark_all_read());
            }
            FleetCommand::AcknowledgeAlert(alert_id) => {
                let handled_at = self.clock.real_now_ms();
                self.alerts.try_update(|log| log.acknowledge(&alert_id, handled_at));
            }
            FleetCommand::DismissAlert(alert_id) => {
                self.alerts.try_update(|log| log.dismiss(&alert_id));
            }
            FleetCommand::CallDriver(id) => self.call_driver(&id),
            FleetCommand::RequestReconnect => self.reconnect(),
        }
    }

    fn select_vehicle(&mut self, id: Option<VehicleId>, force: bool) {
        if !self
            .dashboard
            .try_update(|state| state.request_focus(id.clone(), force))
        {
            return;
        }
        let previous = self.engine.previous_selection.take();
        let routes = self.routes;
        self.fleet
            .try_update(|state| apply_selection(state, routes, previous.as_ref(), id.as_ref()));
        self.engine.previous_selection = id;
    }

    fn playback_interval_ms(&self) -> u64 {
        self.playback
            .get()
            .speed
            .step_interval_ms(self.config.0.timings.playback_interval_ms)
    }

    fn arm_playback(&mut self) {
        let interval = self.playback_interval_ms();
        EngineTimers::rearm(
            &mut self.engine.timers.playback,
            self.clock,
            interval,
            EventKind::PlaybackStep,
            None,
        );
    }

    fn set_playback_vehicle(&mut self, id: VehicleId) {
        let track = self.history.track(&id).to_vec();
        self.playback.update(|state| state.select_vehicle(id, track));
        let state = self.playback.get();
        if state.is_active && state.is_playing {
            self.arm_playback();
        }
    }

    fn start_playback(&mut self, id: VehicleId) {
        let track = self.history.track(&id).to_vec();
        info!(vehicle = %id, points = track.len(), "playback started");
        self.playback.update(|state| state.start(id, track));
        *self.mode = SimulationMode::Playback;
        self.arm_playback();
    }

    fn stop_playback(&mut self) {
        self.playback.update(|state| state.stop());
        *self.mode = SimulationMode::Live;
        EngineTimers::disarm(&mut self.engine.timers.playback, self.clock);
        info!("playback stopped");
    }

    fn toggle_play(&mut self) {
        if self.playback.get().is_active {
            if self.playback.update(|state| state.toggle()) {
                self.arm_playback();
            } else {
                EngineTimers::disarm(&mut self.engine.timers.playback, self.clock);
            }
            return;
        }

        // Not active yet: play the chosen vehicle, else the selection, else
        // the first vehicle of the roster.
        let candidate = self
            .playback
            .get()
            .vehicle_id
            .clone()
            .or_else(|| self.dashboard.get().selected_vehicle_id.clone())
            .or_else(|| self.fleet.get().vehicles.first().map(|vehicle| vehicle.id.clone()));
        match candidate {
            Some(id) => self.start_playback(id),
            None => debug!("no vehicle available for playback"),
        }
    }

    fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.playback.update(|state| state.set_speed(speed));
        let state = self.playback.get();
        if state.is_active && state.is_playing {
            self.arm_playback();
        }
    }

    fn open_alert(&mut self, alert_id: &str) {
        let Some(vehicle_id) = self
            .alerts
            .get()
            .alert(alert_id)
            .map(|alert| alert.vehicle_id.clone())
        else {
            return;
        };
        self.alerts.try_update(|log| log.mark_read(alert_id));
        self.select_vehicle(Some(vehicle_id), true);
    }

    fn call_driver(&mut self, id: &VehicleId) {
        let Some(vehicle) = self.fleet.get().vehicle(id) else {
            debug!(vehicle = %id, "call requested for unknown vehicle");
            return;
        };
        let message = format!(
            "Calling driver {} ({})",
            vehicle.driver_name, vehicle.vehicle_number
        );
        let timestamp = self.clock.real_now_ms();
        info!(vehicle = %id, "{message}");
        self.alerts
            .update(|log| log.add_alert(AlertKind::Manual, message, id.clone(), timestamp));
    }

    fn reconnect(&mut self) {
        self.fleet.update(|state| state.connection_attempt += 1);
        info!(attempt = self.fleet.get().connection_attempt, "reconnect requested");
        connect_fleet(
            self.clock,
            self.engine,
            self.fleet,
            self.history,
            self.chance,
            &self.config.0,
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub fn operator_command_system(
    mut pending: ResMut<PendingCommands>,
    mut clock: ResMut<SimulationClock>,
    mut engine: ResMut<EngineState>,
    mut mode: ResMut<SimulationMode>,
    mut fleet: ResMut<FleetStore>,
    mut alerts: ResMut<AlertStore>,
    mut playback: ResMut<PlaybackStore>,
    mut dashboard: ResMut<DashboardStore>,
    routes: Res<PlannedRoutes>,
    mut history: ResMut<TripHistory>,
    mut chance: ResMut<ChanceResource>,
    config: Res<ScenarioConfig>,
) {
    let mut context = CommandContext {
        clock: &mut clock,
        engine: &mut engine,
        mode: &mut mode,
        fleet: &mut fleet,
        alerts: &mut alerts,
        playback: &mut playback,
        dashboard: &mut dashboard,
        routes: &routes,
        history: &mut history,
        chance: &mut chance,
        config: &config,
    };
    while let Some(command) = pending.0.pop_front() {
        context.apply(command);
    }
}
