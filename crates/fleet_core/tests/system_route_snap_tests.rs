mod support;

use fleet_core::commands::FleetCommand;
use fleet_core::fleet::{VehicleId, VehicleStatus};
use support::vehicles::vehicle;
use support::world::TestFeedBuilder;

#[test]
fn selecting_snaps_onto_an_existing_route_point() {
    let mut feed = TestFeedBuilder::new().start();
    feed.advance_ticks(3);
    let before = vehicle(&feed, "VH-005").clone();
    assert!(!before.is_following_route);

    feed.dispatch(FleetCommand::select("VH-005"));

    let snapped = vehicle(&feed, "VH-005");
    let route = feed.routes().waypoints(&VehicleId::from("VH-005"));
    assert!(snapped.is_following_route);
    assert_eq!(route[snapped.route_index], snapped.position);
    assert!(route.contains(&snapped.position));
    assert_eq!(feed.dashboard().selected_vehicle_id, Some(VehicleId::from("VH-005")));
    assert_eq!(feed.dashboard().focus_request_key, 1);
}

#[test]
fn switching_selection_releases_the_previous_vehicle() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::select("VH-005"));
    feed.dispatch(FleetCommand::select("VH-006"));

    assert!(!vehicle(&feed, "VH-005").is_following_route);
    assert!(vehicle(&feed, "VH-006").is_following_route);
}

#[test]
fn clearing_selection_releases_the_vehicle() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::select("VH-004"));
    feed.dispatch(FleetCommand::SelectVehicle { id: None, force: false });

    assert!(!vehicle(&feed, "VH-004").is_following_route);
    assert_eq!(feed.dashboard().selected_vehicle_id, None);
}

#[test]
fn repeated_selection_is_ignored_unless_forced() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::select("VH-005"));
    feed.advance_ticks(2);
    let index_after_ticks = vehicle(&feed, "VH-005").route_index;
    assert_eq!(index_after_ticks, 2);

    feed.dispatch(FleetCommand::select("VH-005"));
    assert_eq!(feed.dashboard().focus_request_key, 1);
    assert_eq!(vehicle(&feed, "VH-005").route_index, index_after_ticks);

    feed.dispatch(FleetCommand::SelectVehicle {
        id: Some("VH-005".into()),
        force: true,
    });
    assert_eq!(feed.dashboard().focus_request_key, 2);
    let resnapped = vehicle(&feed, "VH-005");
    assert!(resnapped.is_following_route);
    assert_eq!(resnapped.route_index, index_after_ticks);
}

#[test]
fn arrived_vehicles_are_not_snapped() {
    let mut feed = TestFeedBuilder::new().start();
    let office = feed.scenario().office.coordinates;
    assert_eq!(vehicle(&feed, "VH-001").status(), VehicleStatus::Arrived);

    feed.dispatch(FleetCommand::select("VH-001"));

    let arrived = vehicle(&feed, "VH-001");
    assert!(!arrived.is_following_route);
    assert_eq!(arrived.position, office);
}

#[test]
fn route_follower_reaches_the_office_and_triggers_each_pickup_once() {
    let mut feed = TestFeedBuilder::new().start();
    let id = VehicleId::from("VH-003");
    let plan = feed.routes().get(&id).expect("planned route").clone();
    feed.dispatch(FleetCommand::select("VH-003"));
    assert_eq!(vehicle(&feed, "VH-003").route_index, 0);

    let mut notifications = Vec::new();
    for _ in 0..plan.route.len() {
        feed.advance_ticks(1);
        if let Some(notification) = &feed.fleet().pickup_notification {
            if notifications.last() != Some(&notification.message) {
                notifications.push(notification.message.clone());
            }
        }
    }

    let arrived = vehicle(&feed, "VH-003");
    assert_eq!(arrived.status(), VehicleStatus::Arrived);
    assert_eq!(arrived.position, feed.scenario().office.coordinates);
    assert!(!arrived.is_following_route);

    let expected: Vec<String> = plan
        .pickups
        .iter()
        .map(|pickup| format!("Cab arrived for {}", pickup.name))
        .collect();
    assert_eq!(notifications, expected);

    let geofence_alerts: Vec<_> = feed
        .alerts()
        .alerts
        .iter()
        .filter(|alert| alert.vehicle_id == id)
        .collect();
    assert_eq!(geofence_alerts.len(), 1);
    assert_eq!(geofence_alerts[0].message, "KA-05-BK-3303 entered office geofence");
}

#[test]
fn pickup_highlights_expire() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::select("VH-003"));
    // Waypoint 2 of VH-003 is its first pickup.
    feed.advance_ticks(2);
    assert_eq!(
        feed.fleet().pickup_pulse_vehicle,
        Some(VehicleId::from("VH-003"))
    );
    assert!(feed.fleet().pickup_notification.is_some());

    feed.advance_by(2_000);
    assert_eq!(feed.fleet().pickup_pulse_vehicle, None);
    assert!(feed.fleet().pickup_notification.is_some());

    feed.dispatch(FleetCommand::SelectVehicle { id: None, force: false });
    feed.advance_by(30_000);
    assert!(feed.fleet().pickup_notification.is_none());
}
