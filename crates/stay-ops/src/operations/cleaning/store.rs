use super::domain::{
    ChecklistItem, CleaningJob, CompletionReadiness, JobAction, JobError, JobId, JobStatus,
};
use crate::operations::access::{AccessEventKind, AccessEventLog};
use crate::operations::stays::StayId;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Read-only view of the stay registry, just enough to validate the
/// optional back-reference when a job is opened.
pub trait StayDirectory: Send + Sync {
    fn contains_stay(&self, stay_id: &StayId) -> bool;
}

/// Owns cleaning jobs and drives their status state machine:
/// `todo -> in_progress -> {done, problem}`, with `problem -> in_progress`
/// on resolve. Every transition goes through one method that either
/// succeeds or reports exactly why it cannot run.
pub struct CleaningJobStore {
    jobs: Mutex<HashMap<JobId, CleaningJob>>,
    stays: Arc<dyn StayDirectory>,
    events: Arc<AccessEventLog>,
    sequence: AtomicU64,
}

impl CleaningJobStore {
    pub fn new(stays: Arc<dyn StayDirectory>, events: Arc<AccessEventLog>) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            stays,
            events,
            sequence: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> JobId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        JobId(format!("job-{id:06}"))
    }

    pub fn open(
        &self,
        apt_id: &str,
        stay_id: Option<StayId>,
        checklist: Vec<ChecklistItem>,
    ) -> Result<CleaningJob, JobError> {
        if apt_id.trim().is_empty() {
            return Err(JobError::EmptyApartment);
        }
        if let Some(stay_id) = &stay_id {
            if !self.stays.contains_stay(stay_id) {
                return Err(JobError::UnknownStay(stay_id.clone()));
            }
        }

        let job = CleaningJob {
            id: self.next_id(),
            apt_id: apt_id.to_string(),
            stay_id,
            status: JobStatus::Todo,
            checklist,
            started_at: None,
            completed_at: None,
            problem_note: None,
            problem_photos: Vec::new(),
            final_photos: Vec::new(),
        };

        let mut jobs = self.jobs.lock().expect("job store mutex poisoned");
        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    pub fn get(&self, id: &JobId) -> Option<CleaningJob> {
        let jobs = self.jobs.lock().expect("job store mutex poisoned");
        jobs.get(id).cloned()
    }

    pub fn jobs_for_apt(&self, apt_id: &str) -> Vec<CleaningJob> {
        let jobs = self.jobs.lock().expect("job store mutex poisoned");
        let mut found: Vec<CleaningJob> = jobs
            .values()
            .filter(|job| job.apt_id == apt_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        found
    }

    pub fn start(&self, id: &JobId, now: NaiveDateTime) -> Result<CleaningJob, JobError> {
        self.with_job(id, |job| {
            if job.status != JobStatus::Todo {
                return Err(JobError::InvalidTransition {
                    from: job.status,
                    action: JobAction::Start,
                });
            }
            job.status = JobStatus::InProgress;
            job.started_at = Some(now);
            Ok(())
        })
    }

    /// Flips one checklist item. Outside `in_progress`, or for an unknown
    /// item id, this is an explicit no-op returning `false` — not an error.
    pub fn toggle_item(&self, id: &JobId, item_id: &str) -> Result<bool, JobError> {
        let mut jobs = self.jobs.lock().expect("job store mutex poisoned");
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        if job.status != JobStatus::InProgress {
            return Ok(false);
        }
        match job.checklist.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.done = !item.done;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Completion runs both guards and reports them together, so a caller
    /// can tell "checklist incomplete" apart from "final photos missing".
    pub fn complete(&self, id: &JobId, now: NaiveDateTime) -> Result<CleaningJob, JobError> {
        let completed = self.with_job(id, |job| {
            if job.status != JobStatus::InProgress {
                return Err(JobError::InvalidTransition {
                    from: job.status,
                    action: JobAction::Complete,
                });
            }
            let readiness = job.completion_readiness();
            if !readiness.is_ready() {
                return Err(JobError::CompletionBlocked(readiness));
            }
            job.status = JobStatus::Done;
            job.completed_at = Some(now);
            Ok(())
        })?;

        self.events.append(
            &completed.apt_id,
            AccessEventKind::CleaningDone,
            "cleaner",
            format!("cleaning job {} completed", completed.id),
            now,
        );
        Ok(completed)
    }

    /// Problems can be reported at any point while working, regardless of
    /// checklist progress, and re-reported while already in `problem`.
    pub fn report_problem(
        &self,
        id: &JobId,
        note: Option<String>,
        photos: Vec<String>,
        now: NaiveDateTime,
    ) -> Result<CleaningJob, JobError> {
        let updated = self.with_job(id, |job| {
            if !matches!(job.status, JobStatus::InProgress | JobStatus::Problem) {
                return Err(JobError::InvalidTransition {
                    from: job.status,
                    action: JobAction::ReportProblem,
                });
            }
            job.status = JobStatus::Problem;
            job.problem_note = note.clone();
            job.problem_photos = photos.clone();
            Ok(())
        })?;

        self.events.append(
            &updated.apt_id,
            AccessEventKind::ProblemReported,
            "cleaner",
            format!("problem reported on cleaning job {}", updated.id),
            now,
        );
        Ok(updated)
    }

    /// Back to work: only the status flips. Checklist progress, photos, and
    /// the recorded note all survive resolution.
    pub fn resolve_problem(&self, id: &JobId) -> Result<CleaningJob, JobError> {
        self.with_job(id, |job| {
            if job.status != JobStatus::Problem {
                return Err(JobError::InvalidTransition {
                    from: job.status,
                    action: JobAction::ResolveProblem,
                });
            }
            job.status = JobStatus::InProgress;
            Ok(())
        })
    }

    /// Replaces the final photo set while the job is being worked. Ignored
    /// (returns `false`) in any other status; never changes the status.
    pub fn set_final_photos(&self, id: &JobId, photos: Vec<String>) -> Result<bool, JobError> {
        let mut jobs = self.jobs.lock().expect("job store mutex poisoned");
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        if job.status != JobStatus::InProgress {
            return Ok(false);
        }
        job.final_photos = photos;
        Ok(true)
    }

    pub fn completion_readiness(&self, id: &JobId) -> Result<CompletionReadiness, JobError> {
        let jobs = self.jobs.lock().expect("job store mutex poisoned");
        jobs.get(id)
            .map(CleaningJob::completion_readiness)
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    fn with_job<F>(&self, id: &JobId, mutate: F) -> Result<CleaningJob, JobError>
    where
        F: FnOnce(&mut CleaningJob) -> Result<(), JobError>,
    {
        let mut jobs = self.jobs.lock().expect("job store mutex poisoned");
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))?;
        mutate(job)?;
        Ok(job.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::cleaning::ChecklistBlueprint;
    use chrono::NaiveDate;

    struct NoStays;

    impl StayDirectory for NoStays {
        fn contains_stay(&self, _stay_id: &StayId) -> bool {
            false
        }
    }

    struct AllStays;

    impl StayDirectory for AllStays {
        fn contains_stay(&self, _stay_id: &StayId) -> bool {
            true
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 11)
            .expect("valid date")
            .and_hms_opt(11, 30, 0)
            .expect("valid time")
    }

    fn store() -> (Arc<AccessEventLog>, CleaningJobStore) {
        let events = Arc::new(AccessEventLog::new());
        let store = CleaningJobStore::new(Arc::new(AllStays), events.clone());
        (events, store)
    }

    fn started_job(store: &CleaningJobStore) -> CleaningJob {
        let job = store
            .open(
                "apt-milano-01",
                None,
                ChecklistBlueprint::standard().instantiate(),
            )
            .expect("job opens");
        store.start(&job.id, now()).expect("job starts")
    }

    fn tick_all(store: &CleaningJobStore, job: &CleaningJob) {
        for item in &job.checklist {
            assert!(store.toggle_item(&job.id, &item.id).expect("toggles"));
        }
    }

    #[test]
    fn open_validates_stay_reference() {
        let events = Arc::new(AccessEventLog::new());
        let store = CleaningJobStore::new(Arc::new(NoStays), events);
        let result = store.open(
            "apt-milano-01",
            Some(StayId("stay-000404".to_string())),
            Vec::new(),
        );
        assert!(matches!(result, Err(JobError::UnknownStay(_))));
    }

    #[test]
    fn start_moves_todo_to_in_progress() {
        let (_, store) = store();
        let job = store
            .open("apt-milano-01", None, Vec::new())
            .expect("job opens");
        assert_eq!(job.status, JobStatus::Todo);

        let started = store.start(&job.id, now()).expect("starts");
        assert_eq!(started.status, JobStatus::InProgress);
        assert_eq!(started.started_at, Some(now()));

        let again = store.start(&job.id, now());
        assert!(matches!(again, Err(JobError::InvalidTransition { .. })));
    }

    #[test]
    fn toggling_outside_in_progress_is_ignored() {
        let (_, store) = store();
        let job = store
            .open(
                "apt-milano-01",
                None,
                ChecklistBlueprint::standard().instantiate(),
            )
            .expect("job opens");

        assert!(!store.toggle_item(&job.id, "wash_floors").expect("no-op"));
        let unchanged = store.get(&job.id).expect("job present");
        assert!(unchanged.checklist.iter().all(|item| !item.done));
    }

    #[test]
    fn complete_blocks_on_unfinished_checklist() {
        let (_, store) = store();
        let job = started_job(&store);

        match store.complete(&job.id, now()) {
            Err(JobError::CompletionBlocked(readiness)) => {
                assert!(!readiness.checklist_complete);
                assert!(readiness.final_photos_satisfied);
            }
            other => panic!("expected completion block, got {other:?}"),
        }
    }

    #[test]
    fn complete_blocks_when_photos_claimed_but_missing() {
        let (_, store) = store();
        let job = started_job(&store);
        tick_all(&store, &job);

        match store.complete(&job.id, now()) {
            Err(JobError::CompletionBlocked(readiness)) => {
                assert!(readiness.checklist_complete);
                assert!(!readiness.final_photos_satisfied);
            }
            other => panic!("expected photo guard, got {other:?}"),
        }
    }

    #[test]
    fn complete_succeeds_with_checklist_and_photos() {
        let (events, store) = store();
        let job = started_job(&store);
        tick_all(&store, &job);
        assert!(store
            .set_final_photos(&job.id, vec!["media/apt-milano-01/final-1.jpg".to_string()])
            .expect("photos set"));

        let done = store.complete(&job.id, now()).expect("completes");
        assert_eq!(done.status, JobStatus::Done);
        assert_eq!(done.completed_at, Some(now()));

        let logged = events.events_for("apt-milano-01", 10);
        assert!(logged
            .iter()
            .any(|event| event.kind == AccessEventKind::CleaningDone));
    }

    #[test]
    fn problem_report_needs_no_checklist_progress() {
        let (events, store) = store();
        let job = started_job(&store);

        let flagged = store
            .report_problem(
                &job.id,
                Some("Broken lamp in the bedroom".to_string()),
                vec!["media/apt-milano-01/problem-1.jpg".to_string()],
                now(),
            )
            .expect("problem recorded");
        assert_eq!(flagged.status, JobStatus::Problem);
        assert_eq!(
            flagged.problem_note.as_deref(),
            Some("Broken lamp in the bedroom")
        );

        assert!(events
            .events_for("apt-milano-01", 10)
            .iter()
            .any(|event| event.kind == AccessEventKind::ProblemReported));
    }

    #[test]
    fn resolve_returns_to_in_progress_and_keeps_state() {
        let (_, store) = store();
        let job = started_job(&store);
        assert!(store.toggle_item(&job.id, "wash_floors").expect("toggles"));
        store
            .report_problem(&job.id, Some("Stained couch".to_string()), Vec::new(), now())
            .expect("problem recorded");

        let resumed = store.resolve_problem(&job.id).expect("resolves");
        assert_eq!(resumed.status, JobStatus::InProgress);
        let floors = resumed
            .checklist
            .iter()
            .find(|item| item.id == "wash_floors")
            .expect("item present");
        assert!(floors.done, "resolution must not reset checklist progress");
        assert_eq!(resumed.problem_note.as_deref(), Some("Stained couch"));
    }

    #[test]
    fn resolve_requires_problem_status() {
        let (_, store) = store();
        let job = started_job(&store);
        let result = store.resolve_problem(&job.id);
        assert!(matches!(result, Err(JobError::InvalidTransition { .. })));
    }

    #[test]
    fn final_photos_are_ignored_outside_in_progress() {
        let (_, store) = store();
        let job = store
            .open("apt-milano-01", None, Vec::new())
            .expect("job opens");
        assert!(!store
            .set_final_photos(&job.id, vec!["media/x.jpg".to_string()])
            .expect("no-op"));
        assert!(store.get(&job.id).expect("present").final_photos.is_empty());
    }
}
