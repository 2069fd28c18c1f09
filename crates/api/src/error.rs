// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::artifacts::ArtifactError;
use tally::CoreError;
use tally_audit::AuditError;
use tally_domain::DomainError;
use tally_persistence::PersistenceError;

/// API-level errors.
///
/// These are distinct from lower-layer errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The snapshot store or session table rejected a write.
    AuditWriteFailed {
        /// Description of the store failure.
        message: String,
    },
    /// An artifact file could not be written or read.
    ArtifactIo {
        /// Description of the file system failure.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::AuditWriteFailed { message } => write!(f, "Audit write failed: {message}"),
            Self::ArtifactIo { message } => write!(f, "Artifact I/O failed: {message}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Store failures raised inside a caller's transaction abort it as write failures.
impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        Self::AuditWriteFailed {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidEntryMethod(value) => ApiError::InvalidInput {
            field: String::from("entryMethod"),
            message: format!("Unknown entry method '{value}'"),
        },
        DomainError::InvalidAuditAction(value) => ApiError::InvalidInput {
            field: String::from("action"),
            message: format!("Unknown audit action '{value}'"),
        },
        DomainError::InvalidSnapshot(message) => ApiError::InvalidInput {
            field: String::from("snapshot"),
            message,
        },
    }
}

/// Translates an audit rule violation into an API error.
#[must_use]
pub fn translate_audit_error(err: AuditError) -> ApiError {
    let field: &str = match &err {
        AuditError::MissingOldData { .. } | AuditError::UnexpectedOldData { .. } => "oldData",
        AuditError::MissingNewData { .. } | AuditError::UnexpectedNewData { .. } => "newData",
        AuditError::EmptyField { field } => *field,
        AuditError::NegativeResultCount { .. } => "resultCount",
        AuditError::ArtifactWindowClosed { .. } => "filePath",
    };
    ApiError::InvalidInput {
        field: field.to_string(),
        message: err.to_string(),
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::InvalidActivityType(value) => ApiError::InvalidInput {
            field: String::from("actionType"),
            message: format!("Unknown activity type '{value}'"),
        },
    }
}

/// Translates an artifact failure into an API error.
///
/// Every flavor of missing file collapses into one not-found signal.
#[must_use]
pub fn translate_artifact_error(err: ArtifactError) -> ApiError {
    match err {
        ArtifactError::Missing { .. } => ApiError::ResourceNotFound {
            resource_type: String::from("Session file"),
            message: String::from("No file is available for this session"),
        },
        ArtifactError::Io { .. } | ArtifactError::Csv(_) => ApiError::ArtifactIo {
            message: err.to_string(),
        },
    }
}

/// Translates a read-path store failure into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::SessionNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Entry session"),
            message: format!("Entry session {id} does not exist"),
        },
        PersistenceError::AuditEntryNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Audit log"),
            message: format!("Audit log {id} does not exist"),
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}
