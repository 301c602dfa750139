//! Error taxonomy shared by every resource kind.
//!
//! Each variant is one outward error kind; [`StoreError::status`] is the only
//! place where a kind is turned into an HTTP status.

use rocket::http::Status;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing or malformed fields, invalid identifiers, unknown kinds.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} '{id}' already exists")]
    Conflict { kind: &'static str, id: String },

    #[error("'{0}' is currently being loaded, retry later")]
    LoadInProgress(String),

    /// I/O failure. The message names the action, never the path.
    #[error("storage failure while {action}: {source}")]
    Storage {
        action: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored document is not valid JSON or lacks required fields.
    #[error("stored {kind} '{id}' is unreadable: {reason}")]
    CorruptDocument {
        kind: &'static str,
        id: String,
        reason: String,
    },

    /// The request body is not a JSON object.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("worker failure: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn storage(action: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Storage {
            action: action.into(),
            source,
        }
    }

    pub fn corrupt(kind: &'static str, id: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::CorruptDocument {
            kind,
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            StoreError::Validation(_) | StoreError::MalformedBody(_) => Status::BadRequest,
            StoreError::NotFound { .. } => Status::NotFound,
            StoreError::Conflict { .. } => Status::Conflict,
            StoreError::LoadInProgress(_) => Status::Accepted,
            StoreError::Storage { .. }
            | StoreError::CorruptDocument { .. }
            | StoreError::Worker(_) => Status::InternalServerError,
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "ValidationError",
            StoreError::NotFound { .. } => "NotFoundError",
            StoreError::Conflict { .. } => "ConflictError",
            StoreError::LoadInProgress(_) => "LoadInProgress",
            StoreError::Storage { .. } => "StorageError",
            StoreError::CorruptDocument { .. } => "ParseError",
            StoreError::MalformedBody(_) => "ParseError",
            StoreError::Worker(_) => "StorageError",
        }
    }

    /// The resource id the error is about, when there is one.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            StoreError::NotFound { id, .. }
            | StoreError::Conflict { id, .. }
            | StoreError::CorruptDocument { id, .. } => Some(id),
            StoreError::LoadInProgress(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
