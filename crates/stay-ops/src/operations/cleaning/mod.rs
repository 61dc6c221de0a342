pub mod checklist;
pub mod domain;
pub mod roster;
pub mod router;
pub mod scheduler;
mod store;

pub use checklist::ChecklistBlueprint;
pub use domain::{
    ChecklistItem, ChecklistItemKind, Cleaner, CleanerConfig, CleaningJob, CompletionReadiness,
    JobError, JobId, JobStatus, TimeRange, TimeSlot,
};
pub use roster::{CleanerRoster, RosterImportError, RosterImporter};
pub use router::cleaning_router;
pub use scheduler::compute_slot;
pub use store::{CleaningJobStore, StayDirectory};
