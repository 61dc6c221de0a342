use super::roster::CleanerRoster;
use crate::operations::stays::StayId;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for cleaning jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Todo,
    InProgress,
    Done,
    Problem,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Problem => "problem",
        }
    }
}

/// Marks the one checklist item whose completion additionally requires
/// final photos to be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItemKind {
    Standard,
    FinalPhotos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub kind: ChecklistItemKind,
    pub done: bool,
}

/// One tracked cleaning occurrence for an apartment, optionally tied to a
/// stay. Photo fields hold opaque media references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningJob {
    pub id: JobId,
    pub apt_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stay_id: Option<StayId>,
    pub status: JobStatus,
    pub checklist: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problem_photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub final_photos: Vec<String>,
}

impl CleaningJob {
    /// The two completion guards, computed independently so a caller can
    /// render the precise blocking reason.
    pub fn completion_readiness(&self) -> CompletionReadiness {
        let checklist_complete = self.checklist.iter().all(|item| item.done);
        let photos_claimed = self
            .checklist
            .iter()
            .any(|item| item.kind == ChecklistItemKind::FinalPhotos && item.done);
        CompletionReadiness {
            checklist_complete,
            final_photos_satisfied: !photos_claimed || !self.final_photos.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReadiness {
    pub checklist_complete: bool,
    pub final_photos_satisfied: bool,
}

impl CompletionReadiness {
    pub const fn is_ready(self) -> bool {
        self.checklist_complete && self.final_photos_satisfied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Start,
    Complete,
    ReportProblem,
    ResolveProblem,
}

impl JobAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::ReportProblem => "report a problem on",
            Self::ResolveProblem => "resolve",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("apartment id must not be empty")]
    EmptyApartment,
    #[error("cleaning job {0} not found")]
    NotFound(JobId),
    #[error("stay {0} not found")]
    UnknownStay(StayId),
    #[error("cannot {} a job in status {}", .action.label(), .from.label())]
    InvalidTransition { from: JobStatus, action: JobAction },
    #[error(
        "completion blocked (checklist complete: {}, final photos satisfied: {})",
        .0.checklist_complete,
        .0.final_photos_satisfied
    )]
    CompletionBlocked(CompletionReadiness),
}

/// A daily wall-clock window during which cleaning is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl TimeRange {
    pub fn new(from: NaiveTime, to: NaiveTime) -> Self {
        Self { from, to }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            from: NaiveTime::from_hms_opt(9, 0, 0).expect("valid default range start"),
            to: NaiveTime::from_hms_opt(18, 0, 0).expect("valid default range end"),
        }
    }
}

/// A concrete scheduled window; `to` may land before `from + duration`
/// when the slot was clipped by a range boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cleaner {
    pub name: String,
    pub phone: String,
}

pub const MIN_CLEANING_MINUTES: i64 = 15;
pub const MAX_CLEANING_MINUTES: i64 = 1440;
pub const DEFAULT_CLEANING_MINUTES: i64 = 60;

/// Per-apartment cleaning configuration read by the scheduler and the stay
/// registry. Writes happen outside the core; this type only enforces the
/// duration clamp and the at-least-one-range rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    pub duration_min: i64,
    pub ranges: Vec<TimeRange>,
    pub roster: CleanerRoster,
}

impl CleanerConfig {
    pub fn new(duration_min: i64, ranges: Vec<TimeRange>, roster: CleanerRoster) -> Self {
        let duration_min = duration_min.clamp(MIN_CLEANING_MINUTES, MAX_CLEANING_MINUTES);
        let ranges = if ranges.is_empty() {
            vec![TimeRange::default()]
        } else {
            ranges
        };
        Self {
            duration_min,
            ranges,
            roster,
        }
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLEANING_MINUTES, Vec::new(), CleanerRoster::default())
    }
}
