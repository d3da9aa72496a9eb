//! Operator intents issued by the presentation layer.
//!
//! Commands never touch state directly: they are queued here and applied by
//! the operator command system in the order they were issued.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;

use crate::fleet::VehicleId;
use crate::playback::PlaybackSpeed;

#[derive(Debug, Clone, PartialEq)]
pub enum FleetCommand {
    /// Focus a vehicle (or clear the focus). `force` re-applies an unchanged
    /// selection.
    SelectVehicle { id: Option<VehicleId>, force: bool },
    /// Chooses the playback vehicle without starting playback.
    SetPlaybackVehicle(VehicleId),
    StartPlayback(VehicleId),
    StopPlayback,
    TogglePlay,
    SetSpeedMultiplier(PlaybackSpeed),
    ScrubPlayback(usize),
    /// Operator clicked an alert: mark it read and focus its vehicle.
    OpenAlert(String),
    MarkAllAlertsRead,
    AcknowledgeAlert(String),
    DismissAlert(String),
    CallDriver(VehicleId),
    RequestReconnect,
}

impl FleetCommand {
    pub fn select(id: impl Into<VehicleId>) -> Self {
        Self::SelectVehicle {
            id: Some(id.into()),
            force: false,
        }
    }
}

#[derive(Debug, Default, Resource)]
pub struct PendingCommands(pub VecDeque<FleetCommand>);
