use crate::operations::access::AccessError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for booked stays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayId(pub String);

impl fmt::Display for StayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for guests on a stay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(pub String);

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Guest fields as supplied by the caller, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestDraft {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl GuestDraft {
    pub(crate) fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && !self.phone.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub guest_id: GuestId,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// A booked occupancy of one apartment between check-in and check-out.
///
/// The first guest in the roster is the "responsible" guest for display
/// purposes only; it carries no authorization weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub stay_id: StayId,
    pub apt_id: String,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub guests: Vec<Guest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaner_name: Option<String>,
}

impl Stay {
    pub fn responsible_guest(&self) -> Option<&Guest> {
        self.guests.first()
    }
}

/// Creation payload for a stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStay {
    pub apt_id: String,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub guests: Vec<GuestDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaner_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StayError {
    #[error("apartment id must not be empty")]
    EmptyApartment,
    #[error("check-out must be after check-in")]
    InvertedDates,
    #[error("a stay requires at least one guest")]
    EmptyRoster,
    #[error("every guest requires a first name, last name, and phone")]
    IncompleteGuest,
    #[error("stay {0} not found")]
    StayNotFound(StayId),
    #[error("guest {0} not found")]
    GuestNotFound(GuestId),
    #[error(transparent)]
    Access(#[from] AccessError),
}
