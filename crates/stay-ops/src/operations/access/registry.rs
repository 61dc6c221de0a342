use super::domain::{AccessError, NewPin, PinRecord, PinRole};
use super::events::{AccessEventKind, AccessEventLog};
use crate::operations::stays::{GuestId, StayId};
use chrono::NaiveDateTime;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const CODE_ATTEMPTS: u32 = 128;

/// Owns every PIN record. Creation, lookup, and revocation are synchronous
/// and serialized behind one mutex; revocation is deletion.
pub struct PinRegistry {
    records: Mutex<HashMap<String, PinRecord>>,
    events: Arc<AccessEventLog>,
}

impl PinRegistry {
    pub fn new(events: Arc<AccessEventLog>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Issues a new PIN with a code unique among currently-live codes.
    pub fn create(&self, new: NewPin, now: NaiveDateTime) -> Result<PinRecord, AccessError> {
        if new.apt_id.trim().is_empty() {
            return Err(AccessError::EmptyApartment);
        }
        if new.valid_to <= new.valid_from {
            return Err(AccessError::InvertedWindow {
                from: new.valid_from,
                to: new.valid_to,
            });
        }

        let mut records = self.records.lock().expect("pin registry mutex poisoned");
        records.retain(|_, record| !record.is_expired(now));

        let code = Self::allocate_code(&records)?;
        let record = PinRecord {
            code: code.clone(),
            role: new.role,
            apt_id: new.apt_id,
            stay_id: new.stay_id,
            guest_id: new.guest_id,
            issued_to: new.issued_to,
            valid_from: new.valid_from,
            valid_to: new.valid_to,
            source: new.source,
            created_at: now,
        };
        records.insert(code, record.clone());
        drop(records);

        self.events.append(
            &record.apt_id,
            AccessEventKind::PinCreated,
            &record.issued_to,
            format!("{} PIN issued to {}", record.role.label(), record.issued_to),
            now,
        );

        Ok(record)
    }

    fn allocate_code(records: &HashMap<String, PinRecord>) -> Result<String, AccessError> {
        let mut rng = rand::rng();
        for _ in 0..CODE_ATTEMPTS {
            let code = format!("{:06}", rng.random_range(0..1_000_000u32));
            if !records.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(AccessError::CodeSpaceExhausted {
            attempts: CODE_ATTEMPTS,
        })
    }

    /// Returns the record behind `code`, treating expired records as absent.
    /// Expired entries encountered here are purged in passing; a PIN whose
    /// window has not started yet is still returned.
    pub fn lookup(&self, code: &str, now: NaiveDateTime) -> Option<PinRecord> {
        let mut records = self.records.lock().expect("pin registry mutex poisoned");
        let record = records.get(code)?.clone();
        if record.is_expired(now) {
            records.remove(code);
            return None;
        }
        Some(record)
    }

    /// Removes one PIN. Returns `false` when the code is unknown; that is a
    /// no-op, not an error.
    pub fn revoke(&self, code: &str, now: NaiveDateTime) -> bool {
        let removed = {
            let mut records = self.records.lock().expect("pin registry mutex poisoned");
            records.remove(code)
        };
        match removed {
            Some(record) => {
                self.log_revocation(&record, now);
                true
            }
            None => false,
        }
    }

    pub fn revoke_all_by_apt(&self, apt_id: &str, now: NaiveDateTime) -> usize {
        self.revoke_where(now, |record| record.apt_id == apt_id)
    }

    pub fn revoke_all_by_stay(&self, stay_id: &StayId, now: NaiveDateTime) -> usize {
        self.revoke_where(now, |record| record.stay_id.as_ref() == Some(stay_id))
    }

    pub fn revoke_all_by_guest(
        &self,
        stay_id: &StayId,
        guest_id: &GuestId,
        now: NaiveDateTime,
    ) -> usize {
        self.revoke_where(now, |record| {
            record.stay_id.as_ref() == Some(stay_id) && record.guest_id.as_ref() == Some(guest_id)
        })
    }

    pub fn revoke_all_cleaner_by_stay(&self, stay_id: &StayId, now: NaiveDateTime) -> usize {
        self.revoke_where(now, |record| {
            record.stay_id.as_ref() == Some(stay_id) && record.role == PinRole::Cleaner
        })
    }

    // Bulk revocation still emits one pin_revoked event per record.
    fn revoke_where<F>(&self, now: NaiveDateTime, predicate: F) -> usize
    where
        F: Fn(&PinRecord) -> bool,
    {
        let removed: Vec<PinRecord> = {
            let mut records = self.records.lock().expect("pin registry mutex poisoned");
            let codes: Vec<String> = records
                .values()
                .filter(|record| predicate(record))
                .map(|record| record.code.clone())
                .collect();
            codes
                .into_iter()
                .filter_map(|code| records.remove(&code))
                .collect()
        };

        for record in &removed {
            self.log_revocation(record, now);
        }
        removed.len()
    }

    fn log_revocation(&self, record: &PinRecord, now: NaiveDateTime) {
        self.events.append(
            &record.apt_id,
            AccessEventKind::PinRevoked,
            &record.issued_to,
            format!("{} PIN for {} revoked", record.role.label(), record.issued_to),
            now,
        );
    }

    /// Window of the current cleaner PIN for a stay, if one exists. Used by
    /// cleaner reassignment to hand the replacement PIN the same slot.
    pub fn cleaner_window_for_stay(
        &self,
        stay_id: &StayId,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let records = self.records.lock().expect("pin registry mutex poisoned");
        records
            .values()
            .filter(|record| {
                record.role == PinRole::Cleaner && record.stay_id.as_ref() == Some(stay_id)
            })
            .map(|record| (record.valid_from, record.valid_to))
            .min()
    }

    pub fn pins_for_stay(&self, stay_id: &StayId) -> Vec<PinRecord> {
        let records = self.records.lock().expect("pin registry mutex poisoned");
        let mut pins: Vec<PinRecord> = records
            .values()
            .filter(|record| record.stay_id.as_ref() == Some(stay_id))
            .cloned()
            .collect();
        pins.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));
        pins
    }

    pub fn pins_for_apt(&self, apt_id: &str) -> Vec<PinRecord> {
        let records = self.records.lock().expect("pin registry mutex poisoned");
        let mut pins: Vec<PinRecord> = records
            .values()
            .filter(|record| record.apt_id == apt_id)
            .cloned()
            .collect();
        pins.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code)));
        pins
    }
}
