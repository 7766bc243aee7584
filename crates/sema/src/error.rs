use thiserror::Error;

#[derive(Debug, Error)]
pub enum SemaError {
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl SemaError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

pub type SemaResult<T> = Result<T, SemaError>;

impl From<sea_orm::DbErr> for SemaError {
    fn from(value: sea_orm::DbErr) -> Self {
        SemaError::storage(value.to_string())
    }
}
