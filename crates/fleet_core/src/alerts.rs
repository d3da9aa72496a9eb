//! Alert log: active alerts (newest first) and the handled-alert archive.

use serde::Serialize;

use crate::fleet::VehicleId;
use crate::store::Store;

/// Active alerts kept before the oldest are dropped.
pub const MAX_ACTIVE_ALERTS: usize = 60;
/// Handled alerts kept before the oldest are dropped.
pub const MAX_HANDLED_ALERTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Geofence,
    Delay,
    Manual,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Geofence => "geofence",
            AlertKind::Delay => "delay",
            AlertKind::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub message: String,
    pub vehicle_id: VehicleId,
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub read: bool,
    pub acknowledged: bool,
    pub handled_at_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertsState {
    pub alerts: Vec<Alert>,
    pub handled_alerts: Vec<Alert>,
    last_sequence: u64,
}

impl AlertsState {
    /// Prepends a new unread alert and returns its id.
    pub fn add_alert(
        &mut self,
        kind: AlertKind,
        message: impl Into<String>,
        vehicle_id: VehicleId,
        timestamp_ms: u64,
    ) -> String {
        self.last_sequence += 1;
        let id = format!("ALERT-{}", self.last_sequence);
        self.alerts.insert(
            0,
            Alert {
                id: id.clone(),
                kind,
                message: message.into(),
                vehicle_id,
                timestamp_ms,
                read: false,
                acknowledged: false,
                handled_at_ms: None,
            },
        );
        self.alerts.truncate(MAX_ACTIVE_ALERTS);
        id
    }

    pub fn alert(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.alerts.iter().filter(|alert| !alert.read).count()
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) if !alert.read => {
                alert.read = true;
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) -> bool {
        let mut changed = false;
        for alert in self.alerts.iter_mut().filter(|alert| !alert.read) {
            alert.read = true;
            changed = true;
        }
        changed
    }

    /// Moves the alert to the handled archive. Unknown ids are ignored.
    pub fn acknowledge(&mut self, id: &str, handled_at_ms: u64) -> bool {
        let Some(position) = self.alerts.iter().position(|alert| alert.id == id) else {
            return false;
        };
        let mut alert = self.alerts.remove(position);
        alert.read = true;
        alert.acknowledged = true;
        alert.handled_at_ms = Some(handled_at_ms);
        self.handled_alerts.insert(0, alert);
        self.handled_alerts.truncate(MAX_HANDLED_ALERTS);
        true
    }

    /// Drops the alert without archiving it. Unknown ids are ignored.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|alert| alert.id != id);
        self.alerts.len() != before
    }
}

pub type AlertStore = Store<AlertsState>;
