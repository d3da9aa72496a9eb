//! Operator selection state shared with the presentation layer.

use crate::fleet::VehicleId;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub selected_vehicle_id: Option<VehicleId>,
    /// Bumped on every accepted focus request so the map can re-center even
    /// when the selection itself did not change.
    pub focus_request_key: u64,
}

impl DashboardState {
    /// Returns `false` when the request is ignored (same selection, not forced).
    pub fn request_focus(&mut self, vehicle_id: Option<VehicleId>, force: bool) -> bool {
        if self.selected_vehicle_id == vehicle_id && !force {
            return false;
        }
        self.selected_vehicle_id = vehicle_id;
        self.focus_request_key += 1;
        true
    }
}

pub type DashboardStore = Store<DashboardState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_focus_is_ignored_unless_forced() {
        let mut state = DashboardState::default();
        let id = Some(VehicleId::from("VH-005"));
        assert!(state.request_focus(id.clone(), false));
        assert!(!state.request_focus(id.clone(), false));
        assert_eq!(state.focus_request_key, 1);
        assert!(state.request_focus(id.clone(), true));
        assert_eq!(state.focus_request_key, 2);
        assert!(state.request_focus(None, false));
        assert_eq!(state.selected_vehicle_id, None);
    }
}
