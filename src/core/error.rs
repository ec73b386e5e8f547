//! Storage error taxonomy

use miette::Diagnostic;
use thiserror::Error;

use crate::core::integrity::Violations;

/// Errors raised inside the storage layer. They are converted into an
/// [`Outcome`](crate::core::outcome::Outcome) before leaving the provider.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    #[diagnostic(code(ptrack::store::not_found))]
    NotFound { kind: &'static str, id: String },

    #[error("invalid data: {0}")]
    #[diagnostic(code(ptrack::store::invalid_data))]
    Invalid(Violations),

    #[error("conflict: {0}")]
    #[diagnostic(code(ptrack::store::conflict))]
    Conflict(String),

    #[error("storage error: {0}")]
    #[diagnostic(code(ptrack::store::storage))]
    Storage(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// A stored value could not be decoded back into an entity
    pub fn malformed(table: &str, detail: impl std::fmt::Display) -> Self {
        StoreError::Storage(format!("malformed record in {}: {}", table, detail))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<quick_xml::DeError> for StoreError {
    fn from(e: quick_xml::DeError) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<quick_xml::SeError> for StoreError {
    fn from(e: quick_xml::SeError) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}
