use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealEstatesError {
    #[error("Real estate not found: {id}")]
    NotFound { id: i32 },

    #[error("Real estate with cnpj '{cnpj}' already exists")]
    Conflict { cnpj: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl RealEstatesError {
    pub fn not_found(id: i32) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(cnpj: impl Into<String>) -> Self {
        Self::Conflict { cnpj: cnpj.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for RealEstatesError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            RealEstateNotFound { id } => Self::not_found(id),
            CnpjAlreadyExists { cnpj } => Self::conflict(cnpj),
            EmptyName => Self::validation("Name cannot be empty"),
            EmptyCnpj => Self::validation("Cnpj cannot be empty"),
            NameTooLong { len, max } => Self::validation(format!(
                "Name too long: {len} characters (max: {max})"
            )),
            MissingId => Self::validation("Id is required to update a real estate"),
            InvalidFilter { key, value } => {
                Self::validation(format!("Filter '{key}' must be an integer, got '{value}'"))
            }
            Storage { .. } => Self::internal(),
        }
    }
}
