use super::common::*;
use crate::operations::access::{AccessError, AccessEventKind, NewPin, PinRole, PinSource};
use crate::operations::stays::StayId;

#[test]
fn create_issues_six_digit_code_and_logs_event() {
    let (events, pins) = registry();
    let now = at(10, 12, 0);

    let record = pins.create(guest_pin("stay-000001", "guest-000001"), now).expect("pin issued");

    assert_eq!(record.code.len(), 6);
    assert!(record.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(record.created_at, now);

    let logged = events.events_for("apt-milano-01", 10);
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].kind, AccessEventKind::PinCreated);
    assert!(logged[0].label.contains("Mario Rossi"));
}

#[test]
fn create_rejects_empty_apartment() {
    let (_, pins) = registry();
    let mut new = guest_pin("stay-000001", "guest-000001");
    new.apt_id = "  ".to_string();

    let result = pins.create(new, at(10, 12, 0));
    assert!(matches!(result, Err(AccessError::EmptyApartment)));
}

#[test]
fn create_rejects_inverted_window() {
    let (_, pins) = registry();
    let mut new = guest_pin("stay-000001", "guest-000001");
    new.valid_from = at(14, 10, 0);
    new.valid_to = at(10, 15, 0);

    let result = pins.create(new, at(10, 12, 0));
    assert!(matches!(result, Err(AccessError::InvertedWindow { .. })));
}

#[test]
fn lookup_returns_pending_and_live_records() {
    let (_, pins) = registry();
    let record = pins
        .create(guest_pin("stay-000001", "guest-000001"), at(9, 8, 0))
        .expect("pin issued");

    // Before the window opens the record exists but is not yet live.
    let before = pins.lookup(&record.code, at(9, 9, 0)).expect("still present");
    assert!(!before.is_live(at(9, 9, 0)));

    let during = pins.lookup(&record.code, at(12, 12, 0)).expect("present");
    assert!(during.is_live(at(12, 12, 0)));
}

#[test]
fn lookup_treats_expired_records_as_absent() {
    let (_, pins) = registry();
    let record = pins
        .create(guest_pin("stay-000001", "guest-000001"), at(10, 12, 0))
        .expect("pin issued");

    assert!(pins.lookup(&record.code, at(15, 0, 0)).is_none());
    // The record is gone for good, not merely filtered.
    assert!(pins.lookup(&record.code, at(12, 0, 0)).is_none());
}

#[test]
fn revoke_removes_record_and_logs_event() {
    let (events, pins) = registry();
    let now = at(10, 12, 0);
    let record = pins
        .create(guest_pin("stay-000001", "guest-000001"), now)
        .expect("pin issued");

    assert!(pins.revoke(&record.code, now));
    assert!(pins.lookup(&record.code, now).is_none());
    assert!(!pins.revoke(&record.code, now), "second revoke is a no-op");

    let revocations: Vec<_> = events
        .events_for("apt-milano-01", 10)
        .into_iter()
        .filter(|event| event.kind == AccessEventKind::PinRevoked)
        .collect();
    assert_eq!(revocations.len(), 1);
}

#[test]
fn bulk_revoke_by_stay_emits_one_event_per_pin() {
    let (events, pins) = registry();
    let now = at(10, 12, 0);
    pins.create(guest_pin("stay-000001", "guest-000001"), now).expect("guest pin");
    pins.create(guest_pin("stay-000001", "guest-000002"), now).expect("guest pin");
    pins.create(cleaner_pin("stay-000001"), now).expect("cleaner pin");
    pins.create(guest_pin("stay-000002", "guest-000003"), now).expect("other stay");

    let removed = pins.revoke_all_by_stay(&StayId("stay-000001".to_string()), now);
    assert_eq!(removed, 3);
    assert!(pins.pins_for_stay(&StayId("stay-000001".to_string())).is_empty());
    assert_eq!(pins.pins_for_stay(&StayId("stay-000002".to_string())).len(), 1);

    let revocations = events
        .events_for("apt-milano-01", 20)
        .into_iter()
        .filter(|event| event.kind == AccessEventKind::PinRevoked)
        .count();
    assert_eq!(revocations, 3, "no batched revocation event");
}

#[test]
fn bulk_revoke_by_guest_leaves_no_guest_pins() {
    let (_, pins) = registry();
    let now = at(10, 12, 0);
    let stay = StayId("stay-000001".to_string());
    pins.create(guest_pin("stay-000001", "guest-000001"), now).expect("guest pin");
    pins.create(guest_pin("stay-000001", "guest-000002"), now).expect("guest pin");

    let removed = pins.revoke_all_by_guest(
        &stay,
        &crate::operations::stays::GuestId("guest-000001".to_string()),
        now,
    );
    assert_eq!(removed, 1);

    let remaining = pins.pins_for_stay(&stay);
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining[0].guest_id,
        Some(crate::operations::stays::GuestId("guest-000002".to_string()))
    );
}

#[test]
fn cleaner_revocation_spares_guest_pins() {
    let (_, pins) = registry();
    let now = at(10, 12, 0);
    let stay = StayId("stay-000001".to_string());
    pins.create(guest_pin("stay-000001", "guest-000001"), now).expect("guest pin");
    pins.create(cleaner_pin("stay-000001"), now).expect("cleaner pin");

    assert_eq!(pins.revoke_all_cleaner_by_stay(&stay, now), 1);
    let remaining = pins.pins_for_stay(&stay);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].role, PinRole::Guest);
}

#[test]
fn cleaner_window_reflects_current_cleaner_pin() {
    let (_, pins) = registry();
    let now = at(10, 12, 0);
    let stay = StayId("stay-000001".to_string());
    assert!(pins.cleaner_window_for_stay(&stay).is_none());

    pins.create(cleaner_pin("stay-000001"), now).expect("cleaner pin");
    let window = pins.cleaner_window_for_stay(&stay).expect("window present");
    assert_eq!(window, (at(14, 10, 0), at(14, 12, 0)));
}

#[test]
fn codes_are_unique_among_live_records() {
    let (_, pins) = registry();
    let now = at(10, 12, 0);
    let mut codes = std::collections::HashSet::new();
    for index in 0..50 {
        let new = NewPin {
            role: PinRole::Guest,
            apt_id: "apt-milano-01".to_string(),
            stay_id: None,
            guest_id: None,
            issued_to: format!("Guest {index}"),
            valid_from: at(10, 0, 0),
            valid_to: at(20, 0, 0),
            source: PinSource::Manual,
        };
        let record = pins.create(new, now).expect("pin issued");
        assert!(codes.insert(record.code), "duplicate live code allocated");
    }
}
