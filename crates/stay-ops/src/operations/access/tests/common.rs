use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::operations::access::{
    AccessEventLog, AccountDirectory, NewPin, PinRegistry, PinRole, PinSource,
};
use crate::operations::stays::{GuestId, StayId};

pub(super) fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(super) fn registry() -> (Arc<AccessEventLog>, PinRegistry) {
    let events = Arc::new(AccessEventLog::new());
    let pins = PinRegistry::new(events.clone());
    (events, pins)
}

pub(super) fn guest_pin(stay: &str, guest: &str) -> NewPin {
    NewPin {
        role: PinRole::Guest,
        apt_id: "apt-milano-01".to_string(),
        stay_id: Some(StayId(stay.to_string())),
        guest_id: Some(GuestId(guest.to_string())),
        issued_to: "Mario Rossi".to_string(),
        valid_from: at(10, 15, 0),
        valid_to: at(14, 10, 0),
        source: PinSource::Auto,
    }
}

pub(super) fn cleaner_pin(stay: &str) -> NewPin {
    NewPin {
        role: PinRole::Cleaner,
        apt_id: "apt-milano-01".to_string(),
        stay_id: Some(StayId(stay.to_string())),
        guest_id: None,
        issued_to: "Lucia Bianchi".to_string(),
        valid_from: at(14, 10, 0),
        valid_to: at(14, 12, 0),
        source: PinSource::Auto,
    }
}

#[derive(Default)]
pub(super) struct StaticAccounts {
    active: HashSet<String>,
}

impl StaticAccounts {
    pub(super) fn with(ids: &[&str]) -> Self {
        Self {
            active: ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl AccountDirectory for StaticAccounts {
    fn is_active(&self, account_id: &str) -> bool {
        self.active.contains(account_id)
    }
}
