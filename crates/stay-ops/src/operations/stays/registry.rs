use super::domain::{Guest, GuestDraft, GuestId, NewStay, Stay, StayError, StayId};
use crate::operations::access::{NewPin, PinRegistry, PinRole, PinSource};
use crate::operations::cleaning::roster::display_name;
use crate::operations::cleaning::scheduler::compute_slot;
use crate::operations::cleaning::{CleanerConfig, StayDirectory, TimeSlot};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// External per-apartment cleaning configuration, read-only from the core.
pub trait CleanerConfigSource: Send + Sync {
    fn config_for(&self, apt_id: &str) -> CleanerConfig;
}

/// Owns stays and their guest rosters, and keeps the PIN registry in step:
/// guests get PINs for the stay window, cleaners get PINs for a computed
/// slot, and every removal cascades into revocation. No PIN outlives its
/// guest or stay.
pub struct StayRegistry {
    stays: Mutex<HashMap<StayId, Stay>>,
    pins: Arc<PinRegistry>,
    cleaner_configs: Arc<dyn CleanerConfigSource>,
    stay_sequence: AtomicU64,
    guest_sequence: AtomicU64,
}

impl StayRegistry {
    pub fn new(pins: Arc<PinRegistry>, cleaner_configs: Arc<dyn CleanerConfigSource>) -> Self {
        Self {
            stays: Mutex::new(HashMap::new()),
            pins,
            cleaner_configs,
            stay_sequence: AtomicU64::new(1),
            guest_sequence: AtomicU64::new(1),
        }
    }

    fn next_stay_id(&self) -> StayId {
        let id = self.stay_sequence.fetch_add(1, Ordering::Relaxed);
        StayId(format!("stay-{id:06}"))
    }

    fn next_guest_id(&self) -> GuestId {
        let id = self.guest_sequence.fetch_add(1, Ordering::Relaxed);
        GuestId(format!("guest-{id:06}"))
    }

    pub fn create_stay(&self, new: NewStay, now: NaiveDateTime) -> Result<Stay, StayError> {
        if new.apt_id.trim().is_empty() {
            return Err(StayError::EmptyApartment);
        }
        if new.check_out <= new.check_in {
            return Err(StayError::InvertedDates);
        }
        if new.guests.is_empty() {
            return Err(StayError::EmptyRoster);
        }
        if new.guests.iter().any(|draft| !draft.is_complete()) {
            return Err(StayError::IncompleteGuest);
        }

        let stay_id = self.next_stay_id();
        let guests: Vec<Guest> = new
            .guests
            .into_iter()
            .map(|draft| Guest {
                guest_id: self.next_guest_id(),
                first_name: draft.first_name,
                last_name: draft.last_name,
                phone: draft.phone,
                email: draft.email,
            })
            .collect();

        for guest in &guests {
            self.issue_guest_pin(&new.apt_id, &stay_id, guest, new.check_in, new.check_out, now)?;
        }

        let cleaner_name = new
            .cleaner_name
            .as_deref()
            .map(display_name)
            .filter(|name| !name.is_empty());
        if let Some(name) = &cleaner_name {
            let slot = self.cleaner_slot(&new.apt_id, new.check_out);
            self.issue_cleaner_pin(&new.apt_id, &stay_id, name, slot, now)?;
        }

        let stay = Stay {
            stay_id: stay_id.clone(),
            apt_id: new.apt_id,
            check_in: new.check_in,
            check_out: new.check_out,
            guests,
            cleaner_name,
        };

        let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
        stays.insert(stay_id, stay.clone());
        Ok(stay)
    }

    fn cleaner_slot(&self, apt_id: &str, check_out: NaiveDateTime) -> TimeSlot {
        let config = self.cleaner_configs.config_for(apt_id);
        compute_slot(check_out, &config.ranges, config.duration_min)
    }

    fn issue_guest_pin(
        &self,
        apt_id: &str,
        stay_id: &StayId,
        guest: &Guest,
        valid_from: NaiveDateTime,
        valid_to: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), StayError> {
        self.pins.create(
            NewPin {
                role: PinRole::Guest,
                apt_id: apt_id.to_string(),
                stay_id: Some(stay_id.clone()),
                guest_id: Some(guest.guest_id.clone()),
                issued_to: guest.full_name(),
                valid_from,
                valid_to,
                source: PinSource::Auto,
            },
            now,
        )?;
        Ok(())
    }

    fn issue_cleaner_pin(
        &self,
        apt_id: &str,
        stay_id: &StayId,
        cleaner: &str,
        slot: TimeSlot,
        now: NaiveDateTime,
    ) -> Result<(), StayError> {
        self.pins.create(
            NewPin {
                role: PinRole::Cleaner,
                apt_id: apt_id.to_string(),
                stay_id: Some(stay_id.clone()),
                guest_id: None,
                issued_to: cleaner.to_string(),
                valid_from: slot.from,
                valid_to: slot.to,
                source: PinSource::Auto,
            },
            now,
        )?;
        Ok(())
    }

    pub fn get(&self, stay_id: &StayId) -> Option<Stay> {
        let stays = self.stays.lock().expect("stay registry mutex poisoned");
        stays.get(stay_id).cloned()
    }

    pub fn list_for_apt(&self, apt_id: &str) -> Vec<Stay> {
        let stays = self.stays.lock().expect("stay registry mutex poisoned");
        let mut found: Vec<Stay> = stays
            .values()
            .filter(|stay| stay.apt_id == apt_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.check_in.cmp(&b.check_in));
        found
    }

    /// Moves the stay window. Existing PINs keep their original windows;
    /// regeneration is an explicit, separate caller action.
    pub fn update_dates(
        &self,
        stay_id: &StayId,
        check_in: NaiveDateTime,
        check_out: NaiveDateTime,
    ) -> Result<Stay, StayError> {
        if check_out <= check_in {
            return Err(StayError::InvertedDates);
        }
        let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
        let stay = stays
            .get_mut(stay_id)
            .ok_or_else(|| StayError::StayNotFound(stay_id.clone()))?;
        stay.check_in = check_in;
        stay.check_out = check_out;
        Ok(stay.clone())
    }

    pub fn add_guest(
        &self,
        stay_id: &StayId,
        draft: GuestDraft,
        now: NaiveDateTime,
    ) -> Result<Guest, StayError> {
        if !draft.is_complete() {
            return Err(StayError::IncompleteGuest);
        }

        let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
        let stay = stays
            .get_mut(stay_id)
            .ok_or_else(|| StayError::StayNotFound(stay_id.clone()))?;

        let guest = Guest {
            guest_id: self.next_guest_id(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            phone: draft.phone,
            email: draft.email,
        };
        let (apt_id, check_in, check_out) = (stay.apt_id.clone(), stay.check_in, stay.check_out);
        stay.guests.push(guest.clone());
        drop(stays);

        self.issue_guest_pin(&apt_id, stay_id, &guest, check_in, check_out, now)?;
        Ok(guest)
    }

    pub fn update_guest(
        &self,
        stay_id: &StayId,
        guest_id: &GuestId,
        draft: GuestDraft,
    ) -> Result<Guest, StayError> {
        if !draft.is_complete() {
            return Err(StayError::IncompleteGuest);
        }

        let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
        let stay = stays
            .get_mut(stay_id)
            .ok_or_else(|| StayError::StayNotFound(stay_id.clone()))?;
        let guest = stay
            .guests
            .iter_mut()
            .find(|guest| &guest.guest_id == guest_id)
            .ok_or_else(|| StayError::GuestNotFound(guest_id.clone()))?;

        guest.first_name = draft.first_name;
        guest.last_name = draft.last_name;
        guest.phone = draft.phone;
        guest.email = draft.email;
        Ok(guest.clone())
    }

    /// Removes a guest and revokes every PIN referencing it. The core does
    /// not reject emptying the roster; the caller layer guards that.
    /// Returns the number of PINs revoked.
    pub fn remove_guest(
        &self,
        stay_id: &StayId,
        guest_id: &GuestId,
        now: NaiveDateTime,
    ) -> Result<usize, StayError> {
        let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
        let stay = stays
            .get_mut(stay_id)
            .ok_or_else(|| StayError::StayNotFound(stay_id.clone()))?;

        let before = stay.guests.len();
        stay.guests.retain(|guest| &guest.guest_id != guest_id);
        if stay.guests.len() == before {
            return Err(StayError::GuestNotFound(guest_id.clone()));
        }
        drop(stays);

        Ok(self.pins.revoke_all_by_guest(stay_id, guest_id, now))
    }

    /// Swaps the assigned cleaner. The previous cleaner PIN's window is
    /// reused when one exists; otherwise a fresh slot is computed from the
    /// stay's checkout. Passing `None` (or a blank name) just clears the
    /// assignment after revoking the old PINs.
    pub fn reassign_cleaner(
        &self,
        stay_id: &StayId,
        new_cleaner: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Stay, StayError> {
        let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
        let stay = stays
            .get_mut(stay_id)
            .ok_or_else(|| StayError::StayNotFound(stay_id.clone()))?;
        let (apt_id, check_out) = (stay.apt_id.clone(), stay.check_out);

        let previous_window = self.pins.cleaner_window_for_stay(stay_id);
        self.pins.revoke_all_cleaner_by_stay(stay_id, now);

        let cleaner_name = new_cleaner.map(display_name).filter(|name| !name.is_empty());
        if let Some(name) = &cleaner_name {
            let slot = match previous_window {
                Some((from, to)) => TimeSlot { from, to },
                None => self.cleaner_slot(&apt_id, check_out),
            };
            self.issue_cleaner_pin(&apt_id, stay_id, name, slot, now)?;
        }

        stay.cleaner_name = cleaner_name;
        Ok(stay.clone())
    }

    /// Deletes the stay and revokes every PIN referencing it. Unknown stays
    /// are a no-op `false`.
    pub fn delete_stay(&self, stay_id: &StayId, now: NaiveDateTime) -> bool {
        let existed = {
            let mut stays = self.stays.lock().expect("stay registry mutex poisoned");
            stays.remove(stay_id).is_some()
        };
        self.pins.revoke_all_by_stay(stay_id, now);
        existed
    }
}

impl StayDirectory for StayRegistry {
    fn contains_stay(&self, stay_id: &StayId) -> bool {
        let stays = self.stays.lock().expect("stay registry mutex poisoned");
        stays.contains_key(stay_id)
    }
}
