// Error types for the wizard and their conversion into responses.
//
// Remote failures (lookup, prediction, results) are display strings the pages
// render themselves; only genuine server faults become an AppError response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Local, synchronous input problems. Rendered inline next to `field`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }

    pub fn invalid_vin() -> Self {
        Self::new("vin", "Invalid VIN format")
    }

    pub fn invalid_mileage() -> Self {
        Self::new("mileage", "Please enter your current mileage as a number")
    }
}

// Remote failures, already converted to the message shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("{0}")]
    LookupFailure(String),
    #[error("{0}")]
    PredictionFailure(String),
    #[error("{0}")]
    ResultsFetchFailure(String),
}

impl WizardError {
    pub fn message(&self) -> &str {
        match self {
            WizardError::LookupFailure(m)
            | WizardError::PredictionFailure(m)
            | WizardError::ResultsFetchFailure(m) => m,
        }
    }
}

// Application error type for handler results
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
}

// Implement conversion from anyhow::Error for easier error propagation
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<askama::Error> for AppError {
    fn from(error: askama::Error) -> Self {
        AppError::InternalServerError(anyhow::Error::new(error).context("Failed to render template"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                // Log the detailed error here
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        (status, error_message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_hides_details() {
        let response = AppError::from(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn wizard_error_message_is_the_display_string() {
        let err = WizardError::LookupFailure("Vin lookup failed".to_string());
        assert_eq!(err.message(), "Vin lookup failed");
        assert_eq!(err.to_string(), "Vin lookup failed");
    }

    #[test]
    fn validation_error_names_its_field() {
        let err = ValidationError::invalid_vin();
        assert_eq!(err.field, "vin");
        assert_eq!(err.to_string(), "Invalid VIN format");
    }
}
