use thiserror::Error;

/// Failure surface of the persistence layer. Implementations map their
/// backend's duplicate-key rejection onto `Conflict` so services can treat
/// retried inserts as idempotent.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store backend: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &e {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::Conflict(e.to_string());
            }
        }
        StoreError::Backend(e.to_string())
    }
}

/// Service-level taxonomy. `NotFound` deliberately covers both "does not
/// exist" and "exists but belongs to someone else" so cross-tenant probes
/// cannot distinguish the two.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no authenticated identity on request")]
    Unauthenticated,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("call is not in a state that allows {0}")]
    BadState(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
