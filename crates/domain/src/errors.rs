//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::EntityRecord;

/// Main error type for LedgerLink
///
/// Only configuration errors, validation faults and exhausted transient
/// faults are expected to reach callers of the core; transient conditions
/// are absorbed by the request executor until its attempt ceiling.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service rejected the payload. Never retried.
    #[error("Validation fault: {detail}")]
    Validation { detail: Value },

    /// Every attempt ended in a transient fault.
    #[error("Request failed after {attempts} attempts: {detail}")]
    RetriesExhausted { attempts: u32, detail: Value },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// A successful response did not carry the expected entity section.
    #[error("Unexpected response for {entity_type}: {detail}")]
    UnexpectedResponse { entity_type: String, detail: Value },

    /// A paged query failed after some pages were already accumulated.
    #[error(
        "Query for {entity_type} failed after {pages} page(s) with {} record(s) accumulated: {source}",
        records.len()
    )]
    PartialQuery {
        entity_type: String,
        records: Vec<EntityRecord>,
        pages: u32,
        source: Box<LedgerError>,
    },

    #[error("Operation cancelled after {} record(s)", records.len())]
    Cancelled { records: Vec<EntityRecord> },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Raw diagnostic payload carried by the error, looking through
    /// `PartialQuery` wrappers.
    pub fn diagnostic(&self) -> Option<&Value> {
        match self {
            Self::Validation { detail }
            | Self::RetriesExhausted { detail, .. }
            | Self::UnexpectedResponse { detail, .. } => Some(detail),
            Self::PartialQuery { source, .. } => source.diagnostic(),
            _ => None,
        }
    }

    /// Records accumulated before a paged query failed or was cancelled.
    pub fn partial_records(&self) -> &[EntityRecord] {
        match self {
            Self::PartialQuery { records, .. } | Self::Cancelled { records } => records,
            _ => &[],
        }
    }

    /// True for a remote validation rejection, including one wrapped in a
    /// partial query.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation { .. } => true,
            Self::PartialQuery { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

/// Result type alias for LedgerLink operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Outcome of a lookup that may legitimately find nothing.
///
/// A missing record is a normal return value rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lookup<T> {
    Found(T),
    NotFound { detail: Value },
}

impl<T> Lookup<T> {
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Convert into an `Option`, discarding the not-found diagnostic.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound { .. } => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound { detail } => Lookup::NotFound { detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn partial_query_exposes_records_and_inner_diagnostic() {
        let mut record = EntityRecord::new();
        record.insert("Id".into(), json!("1"));
        let err = LedgerError::PartialQuery {
            entity_type: "Invoice".into(),
            records: vec![record],
            pages: 1,
            source: Box::new(LedgerError::RetriesExhausted {
                attempts: 10,
                detail: json!({"Fault": {"type": "SystemFault"}}),
            }),
        };

        assert_eq!(err.partial_records().len(), 1);
        assert_eq!(err.diagnostic(), Some(&json!({"Fault": {"type": "SystemFault"}})));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("1 record(s) accumulated"));
    }

    #[test]
    fn lookup_helpers() {
        let found: Lookup<u32> = Lookup::Found(3);
        assert!(found.is_found());
        assert_eq!(found.map(|v| v * 2).found(), Some(6));

        let missing: Lookup<u32> = Lookup::NotFound { detail: json!("gone") };
        assert!(!missing.is_found());
        assert_eq!(missing.found(), None);
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let value = serde_json::to_value(LedgerError::Config("missing realm".into()))
            .expect("serializes");
        assert_eq!(value, json!({"type": "Config", "detail": "missing realm"}));
    }
}
