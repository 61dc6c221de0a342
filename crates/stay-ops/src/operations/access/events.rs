use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Domain events recorded for an apartment, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventKind {
    DoorOpened,
    DoorClosed,
    GateOpened,
    PinCreated,
    PinRevoked,
    CleaningDone,
    ProblemReported,
    GuestAccessOk,
    GuestAccessKo,
    CleanerAccessOk,
    WanSwitched,
    VpnToggled,
}

impl AccessEventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DoorOpened => "door_opened",
            Self::DoorClosed => "door_closed",
            Self::GateOpened => "gate_opened",
            Self::PinCreated => "pin_created",
            Self::PinRevoked => "pin_revoked",
            Self::CleaningDone => "cleaning_done",
            Self::ProblemReported => "problem_reported",
            Self::GuestAccessOk => "guest_access_ok",
            Self::GuestAccessKo => "guest_access_ko",
            Self::CleanerAccessOk => "cleaner_access_ok",
            Self::WanSwitched => "wan_switched",
            Self::VpnToggled => "vpn_toggled",
        }
    }

    const fn is_door_transition(self) -> bool {
        matches!(self, Self::DoorOpened | Self::DoorClosed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub id: u64,
    pub apt_id: String,
    pub kind: AccessEventKind,
    pub label: String,
    pub actor: String,
    pub ts: NaiveDateTime,
}

/// Door state is never stored; it is derived from the newest door event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Open,
    Closed,
    Unknown,
}

impl DoorState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

/// Append-only event log shared by the registries and the HTTP surface.
///
/// Entries are kept newest-first; appends are O(1) and nothing is ever
/// deduplicated or rewritten.
#[derive(Debug, Default)]
pub struct AccessEventLog {
    entries: Mutex<VecDeque<AccessEvent>>,
    sequence: AtomicU64,
}

impl AccessEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &self,
        apt_id: &str,
        kind: AccessEventKind,
        actor: &str,
        label: impl Into<String>,
        ts: NaiveDateTime,
    ) -> AccessEvent {
        let event = AccessEvent {
            id: self.sequence.fetch_add(1, Ordering::Relaxed),
            apt_id: apt_id.to_string(),
            kind,
            label: label.into(),
            actor: actor.to_string(),
            ts,
        };

        let mut entries = self.entries.lock().expect("event log mutex poisoned");
        entries.push_front(event.clone());
        event
    }

    /// Newest events for one apartment, capped at `limit`.
    pub fn events_for(&self, apt_id: &str, limit: usize) -> Vec<AccessEvent> {
        let entries = self.entries.lock().expect("event log mutex poisoned");
        entries
            .iter()
            .filter(|event| event.apt_id == apt_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Scans newest-first for the latest door transition. Gate pulses and
    /// unrelated events never influence the result.
    pub fn derive_door_state(&self, apt_id: &str) -> DoorState {
        let entries = self.entries.lock().expect("event log mutex poisoned");
        for event in entries.iter() {
            if event.apt_id != apt_id || !event.kind.is_door_transition() {
                continue;
            }
            return match event.kind {
                AccessEventKind::DoorOpened => DoorState::Open,
                _ => DoorState::Closed,
            };
        }
        DoorState::Unknown
    }

    pub fn total(&self) -> usize {
        self.entries.lock().expect("event log mutex poisoned").len()
    }
}
