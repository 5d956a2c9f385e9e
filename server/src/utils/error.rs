use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::pricing::{PricingError, ValidationErrors};
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid pricing: {0}")]
    Pricing(#[from] ValidationErrors),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<PricingError> for AppError {
    fn from(error: PricingError) -> Self {
        AppError::Pricing(error.into())
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Database(e) => AppError::DatabaseError(e),
            StoreError::Pricing(e) => AppError::from(e),
        }
    }
}

// Malformed bodies and query strings get the same envelope as every other error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Pricing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Pricing(_) => "INVALID_PRICING",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            // Client mistakes are expected traffic.
            AppError::ValidationError(msg) | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::Pricing(errors) => {
                warn!(problems = errors.errors().len(), "Pricing configuration rejected");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Only expose high-level message to the client
        let (public_message, details) = match &self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) => (msg.clone(), None),
            AppError::Pricing(errors) => (
                errors.to_string(),
                serde_json::to_value(errors.flatten()).ok(),
            ),
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
        };

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_errors_are_unprocessable() {
        let err = AppError::from(PricingError::EmptyTierList);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INVALID_PRICING");
    }

    #[test]
    fn test_database_errors_hide_details() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_store_pricing_errors_are_unprocessable() {
        let err = AppError::from(StoreError::Pricing(PricingError::tier(
            0,
            "id",
            "belongs to a different convention",
        )));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        match err {
            AppError::Pricing(errors) => {
                assert_eq!(
                    errors.flatten()["tiers.0.id"],
                    vec!["belongs to a different convention".to_string()]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err = AppError::ValidationError("Failed to parse the request body".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
