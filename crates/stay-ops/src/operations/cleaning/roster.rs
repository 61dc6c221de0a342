use super::domain::Cleaner;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Canonical storage form of a cleaner name: whitespace collapsed to
/// single spaces, surrounding whitespace dropped, case preserved.
pub fn display_name(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity key for roster comparisons: collapsed and lowercased, so names
/// differing only by case or whitespace resolve to the same cleaner.
pub fn roster_key(value: &str) -> String {
    display_name(value).to_ascii_lowercase()
}

/// Roster of cleaners configured for one apartment. The normalized name is
/// the logical identity; phones are plain contact data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerRoster {
    cleaners: Vec<Cleaner>,
}

impl CleanerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a cleaner. An entry whose normalized name matches an
    /// existing one replaces that entry's phone instead of duplicating it.
    /// Returns `false` when the name normalizes to empty.
    pub fn upsert(&mut self, name: &str, phone: &str) -> bool {
        let display = display_name(name);
        if display.is_empty() {
            return false;
        }
        let key = roster_key(&display);
        match self
            .cleaners
            .iter_mut()
            .find(|cleaner| roster_key(&cleaner.name) == key)
        {
            Some(existing) => existing.phone = phone.trim().to_string(),
            None => self.cleaners.push(Cleaner {
                name: display,
                phone: phone.trim().to_string(),
            }),
        }
        true
    }

    pub fn find(&self, name: &str) -> Option<&Cleaner> {
        let key = roster_key(name);
        self.cleaners
            .iter()
            .find(|cleaner| roster_key(&cleaner.name) == key)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let key = roster_key(name);
        let before = self.cleaners.len();
        self.cleaners
            .retain(|cleaner| roster_key(&cleaner.name) != key);
        self.cleaners.len() != before
    }

    pub fn cleaners(&self) -> &[Cleaner] {
        &self.cleaners
    }

    pub fn is_empty(&self) -> bool {
        self.cleaners.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster csv: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed roster csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Phone", default)]
    phone: String,
}

/// Imports a cleaner roster from a `Name,Phone` CSV export, deduplicating
/// by normalized name (last phone wins).
#[derive(Debug)]
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_reader<R: Read>(reader: R) -> Result<CleanerRoster, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut roster = CleanerRoster::new();
        for record in csv_reader.deserialize::<RosterRow>() {
            let row = record?;
            roster.upsert(&row.name, &row.phone);
        }
        Ok(roster)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<CleanerRoster, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}
