use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelstate operations.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Invalid mutation of {target}: {reason}")]
    InvalidMutation { target: String, reason: String },

    #[error("Result {id} ({from_name} -> {to_name}) cannot be loaded: {reason}")]
    SerializationMismatch {
        id: String,
        from_name: String,
        to_name: String,
        reason: String,
    },

    #[error("Relation {from} -> {to} rejected: {reason}")]
    RelationIntegrity {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Persistence failed: {0}")]
    Persistence(#[source] GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse result JSON from {path}: {source}")]
    ResultJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write result JSON to {path}: {source}")]
    ResultJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl LabelError {
    pub(crate) fn invalid(target: impl Into<String>, reason: impl Into<String>) -> Self {
        LabelError::InvalidMutation {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LabelError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Failures reported by a [`PersistenceGateway`](crate::comments::PersistenceGateway).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("request cancelled")]
    Cancelled,
}
