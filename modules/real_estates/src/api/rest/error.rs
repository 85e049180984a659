use axum::http::StatusCode;
use modkit::api::problem::Problem;

use crate::contract::error::RealEstatesError;

const TYPE_BASE: &str = "https://imobprime.org/errors";

/// Map a service error to the problem returned for `instance`.
pub fn map_service_error(e: &RealEstatesError, instance: &str) -> Problem {
    let (status, code, title, detail) = match e {
        RealEstatesError::NotFound { id } => (
            StatusCode::NOT_FOUND,
            "REAL_ESTATES_NOT_FOUND",
            "Real estate not found",
            format!("Real estate with id {id} was not found"),
        ),
        RealEstatesError::Conflict { cnpj } => (
            StatusCode::CONFLICT,
            "REAL_ESTATES_CNPJ_CONFLICT",
            "Cnpj already exists",
            format!("Cnpj '{cnpj}' is already registered"),
        ),
        RealEstatesError::Validation { message } => (
            StatusCode::BAD_REQUEST,
            "REAL_ESTATES_VALIDATION",
            "Validation error",
            message.clone(),
        ),
        RealEstatesError::Internal => {
            // Details stay in the logs
            tracing::error!(error = ?e, "Internal real estates error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "REAL_ESTATES_INTERNAL",
                "Internal error",
                "An internal error occurred".to_string(),
            )
        }
    };
    Problem::new(status, title, detail)
        .with_code(TYPE_BASE, code)
        .at(instance)
}
