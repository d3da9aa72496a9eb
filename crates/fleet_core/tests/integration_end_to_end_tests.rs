mod support;

use fleet_core::alerts::AlertKind;
use fleet_core::clock::SimulationClock;
use fleet_core::commands::FleetCommand;
use fleet_core::engine::EngineState;
use fleet_core::fleet::{VehicleId, VehicleStatus};
use fleet_core::scenario::default_roster;
use support::vehicles::{seed_north, vehicle};
use support::world::TestFeedBuilder;

#[test]
fn arrival_waits_for_the_delay_even_inside_the_geofence() {
    let mut feed = TestFeedBuilder::new()
        .with_roster(vec![seed_north("VH-100", 400.0)])
        .with_arrival_delay("VH-100", 40_000)
        .start();
    let office = feed.scenario().office.clone();

    feed.advance_ticks(2);
    assert!(!office.contains(vehicle(&feed, "VH-100").position));

    feed.advance_ticks(1);
    assert!(office.contains(vehicle(&feed, "VH-100").position));
    assert_eq!(feed.stats().inside_office, 1);

    for tick in 4..10 {
        feed.advance_ticks(1);
        let current = vehicle(&feed, "VH-100");
        assert_ne!(current.status(), VehicleStatus::Arrived, "tick {tick}");
        assert!(current.speed_kmph > 0);
    }
    assert!(feed.alerts().alerts.is_empty());

    feed.advance_ticks(1);
    assert_eq!(feed.now_ms(), 40_000);
    let arrived = vehicle(&feed, "VH-100");
    assert_eq!(arrived.status(), VehicleStatus::Arrived);
    assert_eq!(arrived.position, office.coordinates);
    assert_eq!((arrived.speed_kmph, arrived.eta_minutes), (0, 0));

    let alerts = &feed.alerts().alerts;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Geofence);
    assert_eq!(alerts[0].message, "KA01VH100 entered office geofence");

    feed.advance_ticks(5);
    assert_eq!(feed.alerts().alerts.len(), 1);
    assert_eq!(vehicle(&feed, "VH-100").position, office.coordinates);
}

#[test]
fn entry_highlights_clear_after_their_window() {
    let mut feed = TestFeedBuilder::new()
        .with_roster(vec![seed_north("VH-100", 400.0)])
        .with_arrival_delay("VH-100", 0)
        .start();

    feed.advance_ticks(3);
    let id = VehicleId::from("VH-100");
    assert_eq!(feed.fleet().recently_entered, vec![id]);
    assert!(feed.fleet().geofence_highlighted);

    feed.advance_by(2_799);
    assert!(feed.fleet().geofence_highlighted);

    feed.advance_by(1);
    assert!(feed.fleet().recently_entered.is_empty());
    assert!(!feed.fleet().geofence_highlighted);
}

#[test]
fn default_roster_converges_on_the_office() {
    let mut feed = TestFeedBuilder::new().start();
    feed.advance_ticks(80);

    let office = feed.scenario().office.coordinates;
    for current in &feed.fleet().vehicles {
        assert_eq!(current.status(), VehicleStatus::Arrived, "{}", current.id);
        assert_eq!(current.position, office);
        assert_eq!(current.speed_kmph, 0);
    }

    // VH-001 starts parked and never announces an entry.
    let alerts = &feed.alerts().alerts;
    assert!(alerts.iter().all(|alert| alert.kind == AlertKind::Geofence));
    assert!(alerts
        .iter()
        .all(|alert| alert.vehicle_id != VehicleId::from("VH-001")));
    for id in ["VH-002", "VH-003", "VH-004", "VH-005", "VH-006"] {
        let count = alerts
            .iter()
            .filter(|alert| alert.vehicle_id == VehicleId::from(id))
            .count();
        assert!(count <= 1, "{id} raised {count} geofence alerts");
    }
    assert_eq!(feed.stats().inside_office, 6);
    assert_eq!(feed.stats().active_trips, 0);
}

#[test]
fn parked_vehicle_outside_the_geofence_is_demoted() {
    let feed = TestFeedBuilder::new().start();
    let parked = vehicle(&feed, "VH-002");
    assert_eq!(parked.status(), VehicleStatus::InProgress);
    assert_eq!(parked.speed_kmph, 0);
    let docked = vehicle(&feed, "VH-001");
    assert_eq!(docked.status(), VehicleStatus::Arrived);
    assert_eq!(docked.position, feed.scenario().office.coordinates);
}

#[test]
fn reconnect_reseeds_the_fleet_and_keeps_pickups() {
    let mut feed = TestFeedBuilder::new().start();
    feed.dispatch(FleetCommand::select("VH-003"));
    feed.advance_ticks(5);
    let triggered_before = feed
        .world()
        .resource::<EngineState>()
        .pickups_triggered
        .get(&VehicleId::from("VH-003"))
        .cloned()
        .unwrap_or_default();
    assert!(!triggered_before.is_empty());

    feed.dispatch(FleetCommand::RequestReconnect);

    let fleet = feed.fleet();
    assert_eq!(fleet.connection_attempt, 1);
    assert!(fleet.is_connecting);
    assert!(fleet.pickup_notification.is_none());
    let roster = default_roster();
    for seed in roster.iter().filter(|seed| seed.status != VehicleStatus::Arrived) {
        let current = vehicle(&feed, seed.id.as_str());
        assert_eq!(current.position, seed.position);
        assert_eq!((current.speed_kmph, current.eta_minutes), (37, 24));
        assert_eq!(feed.history().track(&seed.id).len(), 1);
    }
    let engine = feed.world().resource::<EngineState>();
    assert_eq!(
        engine.pickups_triggered.get(&VehicleId::from("VH-003")),
        Some(&triggered_before)
    );

    feed.advance_ticks(1);
    assert!(!feed.fleet().is_connecting);
}

#[test]
fn stop_silences_the_feed() {
    let mut feed = TestFeedBuilder::new().start();
    feed.advance_ticks(3);
    let snapshot = feed.fleet().clone();

    feed.stop();

    assert!(feed.world().resource::<SimulationClock>().is_empty());
    assert_eq!(feed.advance_by(60_000), 0);
    assert_eq!(feed.fleet(), &snapshot);
}
