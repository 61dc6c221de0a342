use super::domain::PinRole;
use super::registry::PinRegistry;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// External user-account collaborator consulted for host/tech sessions.
pub trait AccountDirectory: Send + Sync {
    fn is_active(&self, account_id: &str) -> bool;
}

/// Session record handed in by the auth transport layer. The core never
/// issues cookies or tokens; it only judges whether the references the
/// session carries are still good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub role: PinRole,
    pub apt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    #[error("referenced pin is no longer live")]
    PinNotLive,
    #[error("referenced account is missing or disabled")]
    AccountInactive,
}

pub struct SessionGuard {
    pins: Arc<PinRegistry>,
    accounts: Arc<dyn AccountDirectory>,
}

impl SessionGuard {
    pub fn new(pins: Arc<PinRegistry>, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self { pins, accounts }
    }

    /// A PIN-bearing session is only as valid as its PIN: the record must
    /// still exist and its window must contain `now`, regardless of the
    /// session's own signature. Sessions carrying neither a PIN nor an
    /// account reference predate both mechanisms and pass.
    pub fn validate(&self, session: &Session, now: NaiveDateTime) -> Result<(), SessionRejection> {
        if let Some(code) = &session.pin {
            return match self.pins.lookup(code, now) {
                Some(record) if record.is_live(now) => Ok(()),
                _ => Err(SessionRejection::PinNotLive),
            };
        }

        if let Some(account_id) = &session.account_id {
            if self.accounts.is_active(account_id) {
                return Ok(());
            }
            return Err(SessionRejection::AccountInactive);
        }

        Ok(())
    }
}
