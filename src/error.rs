use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message shown when a selection contains names the encoder does not know
pub const NAME_NOT_FOUND_MESSAGE: &str =
    "One or more restaurant names are not present in the dataset";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("{}: {}", NAME_NOT_FOUND_MESSAGE, .0.join(", "))]
    NameNotFound(Vec<String>),

    #[error("Model fit failed: {0}")]
    FitFailure(String),

    #[error("Recommendation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidSelection(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            // The offending names are logged, not echoed back
            AppError::NameNotFound(_) => {
                (StatusCode::BAD_REQUEST, NAME_NOT_FOUND_MESSAGE.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidTransition(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::FitFailure(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Dataset(_) | AppError::Csv(_) | AppError::Io(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
