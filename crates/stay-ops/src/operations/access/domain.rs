use crate::operations::stays::{GuestId, StayId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Role a PIN (or a session) grants on one apartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinRole {
    Host,
    Tech,
    Guest,
    Cleaner,
}

impl PinRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Tech => "tech",
            Self::Guest => "guest",
            Self::Cleaner => "cleaner",
        }
    }
}

/// Whether a PIN was issued by an operator action or by a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinSource {
    Manual,
    Auto,
}

/// A time-boxed numeric access code for one apartment.
///
/// Records are immutable after creation; revocation removes them from the
/// registry entirely. There is no soft-delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    pub code: String,
    pub role: PinRole,
    pub apt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stay_id: Option<StayId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<GuestId>,
    pub issued_to: String,
    pub valid_from: NaiveDateTime,
    pub valid_to: NaiveDateTime,
    pub source: PinSource,
    pub created_at: NaiveDateTime,
}

impl PinRecord {
    /// A PIN is live while `valid_from <= now <= valid_to`.
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        self.valid_from <= now && now <= self.valid_to
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.valid_to < now
    }
}

/// Creation payload for a PIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPin {
    pub role: PinRole,
    pub apt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stay_id: Option<StayId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<GuestId>,
    pub issued_to: String,
    pub valid_from: NaiveDateTime,
    pub valid_to: NaiveDateTime,
    pub source: PinSource,
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("apartment id must not be empty")]
    EmptyApartment,
    #[error("validity window is inverted ({from} is not before {to})")]
    InvertedWindow {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
    #[error("unable to allocate an unused pin code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
}
