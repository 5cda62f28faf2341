use thiserror::Error;

use crate::models::ImageSourceError;
use crate::services::{OracleError, StoreError};

/// Errors surfaced by the matching and reconciliation engines
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    MissingResource(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ImageSourceError> for CoreError {
    fn from(value: ImageSourceError) -> Self {
        CoreError::Validation(value.to_string())
    }
}
