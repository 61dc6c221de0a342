use super::common::*;
use crate::operations::access::{AccessEventKind, AccessEventLog, DoorState};

#[test]
fn door_state_is_unknown_without_door_events() {
    let log = AccessEventLog::new();
    assert_eq!(log.derive_door_state("apt-milano-01"), DoorState::Unknown);

    log.append(
        "apt-milano-01",
        AccessEventKind::GateOpened,
        "courier",
        "street gate pulse",
        at(10, 9, 0),
    );
    assert_eq!(log.derive_door_state("apt-milano-01"), DoorState::Unknown);
}

#[test]
fn door_state_tracks_latest_door_transition() {
    let log = AccessEventLog::new();
    log.append(
        "apt-milano-01",
        AccessEventKind::DoorOpened,
        "Mario Rossi",
        "front door opened",
        at(10, 9, 0),
    );
    assert_eq!(log.derive_door_state("apt-milano-01"), DoorState::Open);

    log.append(
        "apt-milano-01",
        AccessEventKind::DoorClosed,
        "Mario Rossi",
        "front door closed",
        at(10, 9, 5),
    );
    // Unrelated traffic after the close must not flip the derivation.
    log.append(
        "apt-milano-01",
        AccessEventKind::GateOpened,
        "courier",
        "street gate pulse",
        at(10, 10, 0),
    );
    log.append(
        "apt-milano-01",
        AccessEventKind::PinCreated,
        "registry",
        "guest PIN issued",
        at(10, 11, 0),
    );
    assert_eq!(log.derive_door_state("apt-milano-01"), DoorState::Closed);
}

#[test]
fn door_state_is_scoped_per_apartment() {
    let log = AccessEventLog::new();
    log.append(
        "apt-milano-01",
        AccessEventKind::DoorOpened,
        "Mario Rossi",
        "front door opened",
        at(10, 9, 0),
    );
    assert_eq!(log.derive_door_state("apt-roma-02"), DoorState::Unknown);
}

#[test]
fn events_are_returned_newest_first() {
    let log = AccessEventLog::new();
    for minute in 0..5 {
        log.append(
            "apt-milano-01",
            AccessEventKind::GateOpened,
            "courier",
            format!("pulse {minute}"),
            at(10, 9, minute),
        );
    }

    let events = log.events_for("apt-milano-01", 3);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].label, "pulse 4");
    assert_eq!(events[2].label, "pulse 2");
    assert!(events.windows(2).all(|pair| pair[0].id > pair[1].id));
}

#[test]
fn events_filter_by_apartment() {
    let log = AccessEventLog::new();
    log.append(
        "apt-milano-01",
        AccessEventKind::WanSwitched,
        "controller",
        "wan failover to backup",
        at(10, 9, 0),
    );
    log.append(
        "apt-roma-02",
        AccessEventKind::VpnToggled,
        "controller",
        "vpn enabled",
        at(10, 9, 1),
    );

    assert_eq!(log.events_for("apt-milano-01", 10).len(), 1);
    assert_eq!(log.events_for("apt-roma-02", 10).len(), 1);
    assert_eq!(log.total(), 2);
}
