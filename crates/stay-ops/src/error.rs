use crate::config::ConfigError;
use crate::operations::access::AccessError;
use crate::operations::cleaning::{JobError, RosterImportError};
use crate::operations::stays::StayError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Access(AccessError),
    Stay(StayError),
    Cleaning(JobError),
    Roster(RosterImportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Access(err) => write!(f, "access error: {}", err),
            AppError::Stay(err) => write!(f, "stay error: {}", err),
            AppError::Cleaning(err) => write!(f, "cleaning error: {}", err),
            AppError::Roster(err) => write!(f, "roster import error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Access(err) => Some(err),
            AppError::Stay(err) => Some(err),
            AppError::Cleaning(err) => Some(err),
            AppError::Roster(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Stay(StayError::StayNotFound(_))
            | AppError::Stay(StayError::GuestNotFound(_))
            | AppError::Cleaning(JobError::NotFound(_))
            | AppError::Cleaning(JobError::UnknownStay(_)) => StatusCode::NOT_FOUND,
            AppError::Cleaning(JobError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            AppError::Access(_)
            | AppError::Stay(_)
            | AppError::Cleaning(_)
            | AppError::Roster(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Completion-guard failures carry both guard flags so the caller can
        // tell a missing checklist item apart from missing final photos.
        let body = match &self {
            AppError::Cleaning(JobError::CompletionBlocked(readiness)) => Json(json!({
                "error": self.to_string(),
                "checklist_complete": readiness.checklist_complete,
                "final_photos_satisfied": readiness.final_photos_satisfied,
            })),
            _ => Json(json!({ "error": self.to_string() })),
        };

        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<AccessError> for AppError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<StayError> for AppError {
    fn from(value: StayError) -> Self {
        Self::Stay(value)
    }
}

impl From<JobError> for AppError {
    fn from(value: JobError) -> Self {
        Self::Cleaning(value)
    }
}

impl From<RosterImportError> for AppError {
    fn from(value: RosterImportError) -> Self {
        Self::Roster(value)
    }
}
