//! Trip playback: replays a recorded track for one vehicle at 1x, 5x or 10x,
//! independently of the live tick.

use serde::{Deserialize, Serialize};

use crate::fleet::VehicleId;
use crate::geo::{heading_degrees, LatLng};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    #[default]
    X1,
    X5,
    X10,
}

impl PlaybackSpeed {
    pub fn from_multiplier(multiplier: u32) -> Option<Self> {
        match multiplier {
            1 => Some(Self::X1),
            5 => Some(Self::X5),
            10 => Some(Self::X10),
            _ => None,
        }
    }

    pub fn multiplier(self) -> u64 {
        match self {
            Self::X1 => 1,
            Self::X5 => 5,
            Self::X10 => 10,
        }
    }

    /// Step period for a base interval (3000 ms by default).
    pub fn step_interval_ms(self, base_interval_ms: u64) -> u64 {
        (base_interval_ms / self.multiplier()).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAdvance {
    Moved(usize),
    /// The cursor already sits on the last point (or the track is empty).
    Finished,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    pub vehicle_id: Option<VehicleId>,
    /// Playback owns the map; mirrors `SimulationMode::Playback`.
    pub is_active: bool,
    pub is_playing: bool,
    pub speed: PlaybackSpeed,
    pub cursor: usize,
    /// Snapshot of the vehicle's track taken when playback started.
    pub track: Vec<LatLng>,
}

impl PlaybackState {
    pub fn start(&mut self, vehicle_id: VehicleId, track: Vec<LatLng>) {
        self.vehicle_id = Some(vehicle_id);
        self.track = track;
        self.cursor = 0;
        self.is_active = true;
        self.is_playing = true;
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.is_playing = false;
    }

    /// Points the reducer at another vehicle. An active session restarts on
    /// the new track from its first point.
    pub fn select_vehicle(&mut self, vehicle_id: VehicleId, track: Vec<LatLng>) {
        self.vehicle_id = Some(vehicle_id);
        if self.is_active {
            self.track = track;
            self.cursor = 0;
        }
    }

    /// Flips play/pause and returns the new playing flag.
    pub fn toggle(&mut self) -> bool {
        self.is_playing = !self.is_playing;
        self.is_playing
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// Moves the cursor directly, clamped to the track.
    pub fn scrub(&mut self, index: usize) -> usize {
        self.cursor = index.min(self.track.len().saturating_sub(1));
        self.cursor
    }

    pub fn advance(&mut self) -> PlaybackAdvance {
        let next = self.cursor + 1;
        if next >= self.track.len() {
            return PlaybackAdvance::Finished;
        }
        self.cursor = next;
        PlaybackAdvance::Moved(next)
    }

    pub fn current_position(&self) -> Option<LatLng> {
        self.track.get(self.cursor).copied()
    }

    /// Bearing from the previous point to the current one; `None` at the
    /// start of the track or when the two points coincide.
    pub fn current_heading(&self) -> Option<f64> {
        let current = self.current_position()?;
        let previous = self.track.get(self.cursor.checked_sub(1)?).copied()?;
        if previous == current {
            return None;
        }
        Some(heading_degrees(previous, current))
    }
}

pub type PlaybackStore = Store<PlaybackState>;
