use chrono::{NaiveDateTime, NaiveTime};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use stay_ops::operations::access::{
    AccessEventLog, AccountDirectory, PinRegistry, SessionGuard,
};
use stay_ops::operations::cleaning::{CleanerConfig, CleaningJobStore, TimeRange};
use stay_ops::operations::stays::{CleanerConfigSource, StayRegistry};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The core registries, wired once and shared across handlers.
#[derive(Clone)]
pub(crate) struct CoreState {
    pub(crate) pins: Arc<PinRegistry>,
    pub(crate) events: Arc<AccessEventLog>,
    pub(crate) stays: Arc<StayRegistry>,
    pub(crate) jobs: Arc<CleaningJobStore>,
    pub(crate) sessions: Arc<SessionGuard>,
}

pub(crate) fn build_core(
    configs: Arc<dyn CleanerConfigSource>,
    accounts: Arc<dyn AccountDirectory>,
) -> CoreState {
    let events = Arc::new(AccessEventLog::new());
    let pins = Arc::new(PinRegistry::new(events.clone()));
    let stays = Arc::new(StayRegistry::new(pins.clone(), configs));
    let jobs = Arc::new(CleaningJobStore::new(stays.clone(), events.clone()));
    let sessions = Arc::new(SessionGuard::new(pins.clone(), accounts));

    CoreState {
        pins,
        events,
        stays,
        jobs,
        sessions,
    }
}

/// Per-apartment cleaner configuration held in memory. Apartments without
/// an explicit entry fall back to the default (60 minutes, 09:00-18:00).
#[derive(Default)]
pub(crate) struct InMemoryCleanerConfigStore {
    configs: Mutex<HashMap<String, CleanerConfig>>,
}

impl InMemoryCleanerConfigStore {
    pub(crate) fn set(&self, apt_id: &str, config: CleanerConfig) {
        let mut configs = self.configs.lock().expect("config store mutex poisoned");
        configs.insert(apt_id.to_string(), config);
    }
}

impl CleanerConfigSource for InMemoryCleanerConfigStore {
    fn config_for(&self, apt_id: &str) -> CleanerConfig {
        let configs = self.configs.lock().expect("config store mutex poisoned");
        configs.get(apt_id).cloned().unwrap_or_default()
    }
}

/// Stand-in for the external user-account service.
#[derive(Default)]
pub(crate) struct StaticAccountDirectory {
    active: HashSet<String>,
}

impl StaticAccountDirectory {
    pub(crate) fn with(ids: &[&str]) -> Self {
        Self {
            active: ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

impl AccountDirectory for StaticAccountDirectory {
    fn is_active(&self, account_id: &str) -> bool {
        self.active.contains(account_id)
    }
}

pub(crate) fn default_accounts() -> StaticAccountDirectory {
    StaticAccountDirectory::with(&["host-admin", "tech-support"])
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let trimmed = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(value);
        }
    }
    Err(format!(
        "failed to parse '{raw}' as YYYY-MM-DDTHH:MM[:SS]"
    ))
}

pub(crate) fn parse_time_range(raw: &str) -> Result<TimeRange, String> {
    let (from, to) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("range '{raw}' must look like HH:MM-HH:MM"))?;
    let from = parse_time(from)?;
    let to = parse_time(to)?;
    if from >= to {
        return Err(format!("range '{raw}' is inverted"));
    }
    Ok(TimeRange::new(from, to))
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    for format in ["%H:%M", "%H:%M:%S"] {
        if let Ok(value) = NaiveTime::parse_from_str(trimmed, format) {
            return Ok(value);
        }
    }
    Err(format!("failed to parse '{raw}' as HH:MM"))
}

pub(crate) fn deserialize_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_parsing_accepts_minute_precision() {
        let parsed = parse_datetime("2026-08-01T15:30").expect("parses");
        assert_eq!(parsed, parse_datetime("2026-08-01T15:30:00").expect("parses"));
        assert!(parse_datetime("teatime").is_err());
    }

    #[test]
    fn time_ranges_reject_inversion() {
        assert!(parse_time_range("09:00-18:00").is_ok());
        assert!(parse_time_range("18:00-09:00").is_err());
        assert!(parse_time_range("whenever").is_err());
    }

    #[test]
    fn config_store_falls_back_to_default() {
        let store = InMemoryCleanerConfigStore::default();
        let config = store.config_for("apt-unknown");
        assert_eq!(config.duration_min, 60);
        assert_eq!(config.ranges.len(), 1);
    }
}
