mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fleet_core::alerts::AlertKind;
use fleet_core::commands::FleetCommand;
use fleet_core::fleet::VehicleId;
use fleet_core::test_helpers::TEST_EPOCH_MS;
use support::world::TestFeedBuilder;

#[test]
fn calling_a_driver_raises_a_manual_alert() {
    let mut feed = TestFeedBuilder::new().start();
    feed.advance_ticks(1);

    feed.dispatch(FleetCommand::CallDriver("VH-004".into()));

    let alerts = feed.alerts();
    assert_eq!(alerts.alerts.len(), 1);
    let alert = &alerts.alerts[0];
    assert_eq!(alert.kind, AlertKind::Manual);
    assert_eq!(alert.message, "Calling driver Sanjay M (KA-02-CR-4404)");
    assert_eq!(alert.vehicle_id, VehicleId::from("VH-004"));
    assert_eq!(alert.timestamp_ms, TEST_EPOCH_MS + 4_000);
    assert!(!alert.read);
    assert_eq!(alerts.unread_count(), 1);
}

#[test]
fn calling_an_unknown_vehicle_does_nothing() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::CallDriver("VH-999".into()));
    assert!(feed.alerts().alerts.is_empty());
}

#[test]
fn opening_an_alert_marks_it_read_and_focuses_its_vehicle() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::select("VH-004"));
    feed.dispatch(FleetCommand::CallDriver("VH-004".into()));
    let id = feed.alerts().alerts[0].id.clone();
    let key_before = feed.dashboard().focus_request_key;

    feed.dispatch(FleetCommand::OpenAlert(id.clone()));

    let alert = feed.alerts().alert(&id).expect("alert stays active");
    assert!(alert.read);
    assert_eq!(
        feed.dashboard().selected_vehicle_id,
        Some(VehicleId::from("VH-004"))
    );
    // Already selected, but opening an alert always re-centers.
    assert_eq!(feed.dashboard().focus_request_key, key_before + 1);
}

#[test]
fn acknowledge_archives_with_handled_time() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::CallDriver("VH-003".into()));
    feed.dispatch(FleetCommand::CallDriver("VH-005".into()));
    let first = feed.alerts().alerts[1].id.clone();
    feed.advance_ticks(2);

    feed.dispatch(FleetCommand::AcknowledgeAlert(first.clone()));

    let alerts = feed.alerts();
    assert_eq!(alerts.alerts.len(), 1);
    assert!(alerts.alert(&first).is_none());
    let handled = &alerts.handled_alerts[0];
    assert_eq!(handled.id, first);
    assert!(handled.acknowledged && handled.read);
    assert_eq!(handled.handled_at_ms, Some(TEST_EPOCH_MS + 8_000));
    assert_eq!(alerts.unread_count(), 1);
}

#[test]
fn unknown_ids_leave_the_log_untouched() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::CallDriver("VH-006".into()));
    let before = feed.alerts().clone();
    let notifications = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&notifications);
    feed.subscribe_alerts(move |_, _| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    feed.dispatch(FleetCommand::DismissAlert("ALERT-404".to_string()));
    feed.dispatch(FleetCommand::AcknowledgeAlert("ALERT-404".to_string()));
    feed.dispatch(FleetCommand::OpenAlert("ALERT-404".to_string()));

    assert_eq!(feed.alerts(), &before);
    assert_eq!(notifications.load(Ordering::SeqCst), 0);
    assert_eq!(feed.dashboard().selected_vehicle_id, None);
}

#[test]
fn dismiss_and_mark_all_read() {
    let mut feed = TestFeedBuilder::new().start();
    for id in ["VH-003", "VH-004", "VH-005"] {
        feed.dispatch(FleetCommand::CallDriver(id.into()));
    }
    let dismissed = feed.alerts().alerts[0].id.clone();

    feed.dispatch(FleetCommand::DismissAlert(dismissed.clone()));
    assert_eq!(feed.alerts().alerts.len(), 2);
    assert!(feed.alerts().handled_alerts.is_empty());

    feed.dispatch(FleetCommand::MarkAllAlertsRead);
    assert_eq!(feed.alerts().unread_count(), 0);
    assert!(feed.alerts().alerts.iter().all(|alert| alert.read));
}
