//! Timed attribute lifecycle tests
//!
//! Run under paused tokio time so every interval is deterministic.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::sleep;

use skirmish::combat::{Combatant, Soldier, Vehicle};
use skirmish::entity::{ActiveObject, AttributeSpec, AttributeValue, TimedAttribute, UpdatePolicy};

fn ammo_depot() -> ActiveObject {
    let mut depot = ActiveObject::new("depot").unwrap();
    depot
        .add_attribute(AttributeSpec::updating(
            "ammo",
            10.0,
            UpdatePolicy::Sum,
            5.0,
            Duration::from_millis(100),
        ))
        .unwrap();
    depot
        .add_attribute(AttributeSpec::fixed("name", "north depot"))
        .unwrap();
    depot
}

#[tokio::test(start_paused = true)]
async fn test_attributes_tick_only_while_active() {
    let mut depot = ammo_depot();

    sleep(Duration::from_millis(350)).await;
    assert_eq!(depot.number("ammo"), Some(10.0));

    depot.activate();
    sleep(Duration::from_millis(350)).await;
    assert_eq!(depot.number("ammo"), Some(25.0));
    assert_eq!(
        depot.attribute_value("name"),
        Some(AttributeValue::Text("north depot".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_deactivate_resets_and_reactivate_starts_fresh() {
    let mut depot = ammo_depot();
    depot.activate();
    sleep(Duration::from_millis(250)).await;
    assert_eq!(depot.number("ammo"), Some(20.0));

    depot.deactivate();
    assert_eq!(depot.number("ammo"), Some(10.0));
    depot.activate();

    // A tick scheduled by the first activation would land at 300ms
    sleep(Duration::from_millis(60)).await;
    assert_eq!(depot.number("ammo"), Some(10.0));

    sleep(Duration::from_millis(60)).await;
    assert_eq!(depot.number("ammo"), Some(15.0));
}

#[tokio::test(start_paused = true)]
async fn test_no_tick_after_deactivate() {
    let mut depot = ammo_depot();
    depot.activate();
    sleep(Duration::from_millis(150)).await;
    depot.deactivate();

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(depot.number("ammo"), Some(10.0));
    assert!(!depot.attribute("ammo").unwrap().is_running());
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_listeners_fire_once_per_transition() {
    let mut depot = ammo_depot();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    depot.add_activate_listener(move |name| log.lock().unwrap().push(format!("up {name}")));
    let log = Arc::clone(&seen);
    depot.add_deactivate_listener(move |name| log.lock().unwrap().push(format!("down {name}")));

    depot.activate();
    depot.activate();
    depot.deactivate();
    depot.deactivate();

    assert_eq!(*seen.lock().unwrap(), vec!["up depot", "down depot"]);
}

#[tokio::test(start_paused = true)]
async fn test_soldier_recharge_clears_after_interval() {
    let mut soldier =
        Soldier::with_stats("private", 100.0, 0.0, Some(Duration::from_millis(500))).unwrap();
    soldier.activate();

    soldier.recharge();
    assert!(soldier.is_recharging());
    assert!(!soldier.can_attack());

    sleep(Duration::from_millis(400)).await;
    assert!(soldier.is_recharging());

    sleep(Duration::from_millis(200)).await;
    assert!(!soldier.is_recharging());
    assert!(soldier.can_attack());
}

#[tokio::test(start_paused = true)]
async fn test_recharge_restarts_the_cadence() {
    let mut soldier =
        Soldier::with_stats("private", 100.0, 0.0, Some(Duration::from_millis(1000))).unwrap();
    soldier.activate();

    // Ticks since activation would land at 1000ms; the recharge at 900ms
    // must hold for a full second.
    sleep(Duration::from_millis(900)).await;
    soldier.recharge();
    sleep(Duration::from_millis(500)).await;
    assert!(soldier.is_recharging());

    sleep(Duration::from_millis(600)).await;
    assert!(!soldier.is_recharging());
}

#[tokio::test(start_paused = true)]
async fn test_vehicle_recharges_with_its_crew() {
    let crew = vec![
        Soldier::with_stats("driver", 100.0, 0.0, Some(Duration::from_millis(300))).unwrap(),
        Soldier::with_stats("gunner", 100.0, 0.0, Some(Duration::from_millis(1500))).unwrap(),
    ];
    let mut vehicle =
        Vehicle::with_stats("apc", 100.0, Some(Duration::from_millis(1000)), crew).unwrap();
    vehicle.activate();

    vehicle.recharge();
    assert!(vehicle.is_recharging());

    // Hull done at 1000ms, gunner still busy until 1500ms
    sleep(Duration::from_millis(1200)).await;
    assert!(vehicle.is_recharging());

    sleep(Duration::from_millis(400)).await;
    assert!(!vehicle.is_recharging());
}

#[tokio::test(start_paused = true)]
async fn test_despawn_restores_health() {
    let mut soldier = Soldier::new("private").unwrap();
    soldier.activate();
    soldier.receive_damage(40.0);
    assert_eq!(soldier.health(), 60.0);

    soldier.deactivate();
    assert_eq!(soldier.health(), 100.0);
}

#[test]
fn test_manual_ticks_without_runtime() {
    let mut attr = TimedAttribute::new(AttributeSpec::updating(
        "fuel",
        1.0,
        UpdatePolicy::Sum,
        2.0,
        Duration::from_millis(50),
    ))
    .unwrap();
    attr.start();
    assert!(attr.is_running());

    assert!(attr.tick());
    assert!(attr.tick());
    assert_eq!(attr.value(), AttributeValue::Number(5.0));
    assert_eq!(attr.ticks_applied(), 2);
}

proptest! {
    #[test]
    fn prop_reset_after_ticks_restores_initial(initial in -100.0f64..100.0, delta in -10.0f64..10.0, ticks in 0usize..50) {
        let mut attr = TimedAttribute::new(AttributeSpec::updating(
            "supply",
            initial,
            UpdatePolicy::Sum,
            delta,
            Duration::from_millis(10),
        ))
        .unwrap();
        attr.start();
        for _ in 0..ticks {
            attr.tick();
        }
        attr.reset();
        prop_assert_eq!(attr.value(), AttributeValue::Number(initial));
    }
}
