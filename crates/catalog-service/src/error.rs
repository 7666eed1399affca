//! Service error types.

use catalog_db::{DbError, ErrorKind};
use thiserror::Error;

use crate::config::ConfigError;
use crate::events::PublishError;
use crate::images::ImageStoreError;

/// Errors surfaced by [`CatalogService`](crate::CatalogService).
///
/// Publication failures after a commit are logged, never returned.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Image(#[from] ImageStoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Only raised while building a publisher.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl ServiceError {
    /// Caller-facing category; see [`DbError::kind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Db(err) => err.kind(),
            ServiceError::Image(ImageStoreError::Empty) => ErrorKind::Validation,
            ServiceError::Config(_) => ErrorKind::Validation,
            ServiceError::Image(_) | ServiceError::Publish(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
