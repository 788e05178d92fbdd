//! Error types for the Gatehouse engine

use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed to presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    BadValue = 3,
    Duplicate = 4,
    NoSuchVisitor = 5,
    NoSuchVisit = 6,
    VisitorRestricted = 7,
    DocumentAlreadyBound = 8,
    DocumentMismatch = 9,
    AlreadySignedIn = 10,
    NotSignedIn = 11,
    PastDate = 12,
    SlotTaken = 13,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input (past-dated registration, bad phone, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate visit slot, duplicate identity document, double sign-in/out
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Suspended or banned visitor attempting a gated operation
    #[error("Restricted: {0}")]
    Restricted(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Repository write failed; the only fatal class
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl AppError {
    /// Numeric code for the presentation layer
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Restricted(_) => ErrorCode::VisitorRestricted,
            AppError::NotFound(_) => ErrorCode::NoSuchVisit,
            AppError::Persistence(_) => ErrorCode::DbFailure,
        }
    }
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;
