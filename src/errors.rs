use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::models::workflow::TransitionError;
use crate::models::setting::SettingsError;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Json(serde_json::Error),
    Io(std::io::Error),
    Validation(String),
    Transition(TransitionError),
    Settings(SettingsError),
    PermissionDenied(String),
    Unauthorized,
    TooManyRequests,
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Json(e) => write!(f, "JSON error: {e}"),
            AppError::Io(e) => write!(f, "IO error: {e}"),
            AppError::Validation(msg) => write!(f, "{msg}"),
            AppError::Transition(e) => write!(f, "{e}"),
            AppError::Settings(e) => write!(f, "{e}"),
            AppError::PermissionDenied(what) => write!(f, "Permission denied: {what}"),
            AppError::Unauthorized => write!(f, "Missing or invalid bearer token"),
            AppError::TooManyRequests => write!(f, "Too many failed authentication attempts"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl AppError {
    /// Message safe to hand back to API callers.
    fn public_message(&self) -> String {
        match self {
            AppError::Db(_) | AppError::Json(_) | AppError::Io(_) => {
                "Internal Server Error".to_string()
            }
            AppError::Settings(SettingsError::Invalid(_)) => self.to_string(),
            AppError::Settings(_) => "Internal Server Error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Transition(TransitionError::NotAssigned { .. } | TransitionError::NotOwner(_)) => {
                StatusCode::FORBIDDEN
            }
            AppError::Transition(_) => StatusCode::CONFLICT,
            AppError::Settings(SettingsError::Invalid(_)) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        HttpResponse::build(status).json(serde_json::json!({ "message": self.public_message() }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::Transition(e)
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        AppError::Settings(e)
    }
}
