//! Per-vehicle position tracks recorded from the live feed, used as the
//! source for playback and for export.

use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::Resource;

use crate::fleet::VehicleId;
use crate::geo::LatLng;

/// Points kept per vehicle; 48 minutes of ticks at the default period.
pub const MAX_TRACK_POINTS: usize = 720;

#[derive(Debug, Clone, Default, Resource)]
pub struct TripHistory {
    tracks: HashMap<VehicleId, Vec<LatLng>>,
    /// Tracks supplied by the scenario; live recording leaves them alone.
    pinned: HashSet<VehicleId>,
}

impl TripHistory {
    /// Appends `position` unless it repeats the last recorded point.
    pub fn record(&mut self, id: &VehicleId, position: LatLng) {
        if self.pinned.contains(id) {
            return;
        }
        let track = self.tracks.entry(id.clone()).or_default();
        if track.last() == Some(&position) {
            return;
        }
        track.push(position);
        if track.len() > MAX_TRACK_POINTS {
            let overflow = track.len() - MAX_TRACK_POINTS;
            track.drain(..overflow);
        }
    }

    /// Installs a fixed track that live recording will not extend.
    pub fn replace_track(&mut self, id: VehicleId, track: Vec<LatLng>) {
        self.pinned.insert(id.clone());
        self.tracks.insert(id, track);
    }

    pub fn track(&self, id: &VehicleId) -> &[LatLng] {
        self.tracks.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tracks sorted by vehicle id.
    pub fn iter(&self) -> impl Iterator<Item = (&VehicleId, &[LatLng])> {
        let mut ids: Vec<&VehicleId> = self.tracks.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(move |id| (id, self.track(id)))
    }

    pub fn clear_recorded(&mut self) {
        let pinned = &self.pinned;
        self.tracks.retain(|id, _| pinned.contains(id));
    }
}
