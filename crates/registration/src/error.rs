//! Registration coordinator error types.

use common::RegistrationId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during registration coordination.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The registration does not exist.
    #[error("Registration not found: {0}")]
    NotFound(RegistrationId),

    /// The registration vanished between the existence read and the delete.
    #[error("Registration {0} was deleted concurrently")]
    DeleteRace(RegistrationId),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for coordinator results.
pub type Result<T> = std::result::Result<T, RegistrationError>;
