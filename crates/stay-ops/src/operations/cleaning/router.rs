use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::checklist::ChecklistBlueprint;
use super::domain::{JobError, JobId};
use super::store::CleaningJobStore;
use crate::operations::stays::StayId;

/// HTTP surface for the cleaning-job state machine.
pub fn cleaning_router(store: Arc<CleaningJobStore>) -> Router {
    Router::new()
        .route("/api/v1/cleaning/jobs", post(open_handler))
        .route("/api/v1/cleaning/jobs/:job_id", get(get_handler))
        .route("/api/v1/cleaning/jobs/:job_id/start", post(start_handler))
        .route(
            "/api/v1/cleaning/jobs/:job_id/checklist/:item_id",
            post(toggle_handler),
        )
        .route(
            "/api/v1/cleaning/jobs/:job_id/complete",
            post(complete_handler),
        )
        .route(
            "/api/v1/cleaning/jobs/:job_id/problem",
            post(problem_handler),
        )
        .route(
            "/api/v1/cleaning/jobs/:job_id/resolve",
            post(resolve_handler),
        )
        .route("/api/v1/cleaning/jobs/:job_id/photos", put(photos_handler))
        .route(
            "/api/v1/cleaning/jobs/:job_id/readiness",
            get(readiness_handler),
        )
        .with_state(store)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenJobRequest {
    pub(crate) apt_id: String,
    #[serde(default)]
    pub(crate) stay_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProblemRequest {
    #[serde(default)]
    pub(crate) note: Option<String>,
    #[serde(default)]
    pub(crate) photos: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotosRequest {
    pub(crate) photos: Vec<String>,
}

fn job_error_response(error: JobError) -> Response {
    let status = match &error {
        JobError::NotFound(_) | JobError::UnknownStay(_) => StatusCode::NOT_FOUND,
        JobError::InvalidTransition { .. } => StatusCode::CONFLICT,
        JobError::EmptyApartment | JobError::CompletionBlocked(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };

    let body = match &error {
        JobError::CompletionBlocked(readiness) => json!({
            "error": error.to_string(),
            "checklist_complete": readiness.checklist_complete,
            "final_photos_satisfied": readiness.final_photos_satisfied,
        }),
        _ => json!({ "error": error.to_string() }),
    };

    (status, Json(body)).into_response()
}

pub(crate) async fn open_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Json(payload): Json<OpenJobRequest>,
) -> Response {
    let stay_id = payload.stay_id.map(StayId);
    let checklist = ChecklistBlueprint::standard().instantiate();
    match store.open(&payload.apt_id, stay_id, checklist) {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn get_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
) -> Response {
    let id = JobId(job_id);
    match store.get(&id) {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => job_error_response(JobError::NotFound(id)),
    }
}

pub(crate) async fn start_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
) -> Response {
    match store.start(&JobId(job_id), Local::now().naive_local()) {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn toggle_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path((job_id, item_id)): Path<(String, String)>,
) -> Response {
    let id = JobId(job_id);
    match store.toggle_item(&id, &item_id) {
        Ok(toggled) => {
            let job = store.get(&id);
            (StatusCode::OK, Json(json!({ "toggled": toggled, "job": job }))).into_response()
        }
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn complete_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
) -> Response {
    match store.complete(&JobId(job_id), Local::now().naive_local()) {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn problem_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
    Json(payload): Json<ProblemRequest>,
) -> Response {
    let result = store.report_problem(
        &JobId(job_id),
        payload.note,
        payload.photos,
        Local::now().naive_local(),
    );
    match result {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn resolve_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
) -> Response {
    match store.resolve_problem(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn readiness_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
) -> Response {
    match store.completion_readiness(&JobId(job_id)) {
        Ok(readiness) => (StatusCode::OK, Json(readiness)).into_response(),
        Err(error) => job_error_response(error),
    }
}

pub(crate) async fn photos_handler(
    State(store): State<Arc<CleaningJobStore>>,
    Path(job_id): Path<String>,
    Json(payload): Json<PhotosRequest>,
) -> Response {
    let id = JobId(job_id);
    match store.set_final_photos(&id, payload.photos) {
        Ok(replaced) => {
            let job = store.get(&id);
            (StatusCode::OK, Json(json!({ "replaced": replaced, "job": job }))).into_response()
        }
        Err(error) => job_error_response(error),
    }
}
