use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Real estate not found: {id}")]
    RealEstateNotFound { id: i32 },

    #[error("Cnpj '{cnpj}' is already registered")]
    CnpjAlreadyExists { cnpj: String },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Cnpj cannot be empty")]
    EmptyCnpj,

    #[error("Name too long: {len} characters (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Id is required")]
    MissingId,

    #[error("Filter '{key}' must be an integer, got '{value}'")]
    InvalidFilter { key: String, value: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(id: i32) -> Self {
        Self::RealEstateNotFound { id }
    }

    pub fn cnpj_already_exists(cnpj: impl Into<String>) -> Self {
        Self::CnpjAlreadyExists { cnpj: cnpj.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
