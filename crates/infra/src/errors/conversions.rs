//! Conversions from external infrastructure errors into domain errors.

use ledgerlink_domain::LedgerError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LedgerError);

impl From<InfraError> for LedgerError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LedgerError> for InfraError {
    fn from(value: LedgerError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLedgerError {
    fn into_ledger(self) -> LedgerError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LedgerError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerError for HttpError {
    fn into_ledger(self) -> LedgerError {
        if self.is_timeout() {
            return LedgerError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return LedgerError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return LedgerError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => LedgerError::Auth(message),
                400..=499 => LedgerError::InvalidInput(message),
                _ => LedgerError::Network(message),
            };
        }

        LedgerError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_ledger())
    }
}

/* -------------------------------------------------------------------------- */
/* Decoding errors → LedgerError */
/* -------------------------------------------------------------------------- */

impl IntoLedgerError for quick_xml::Error {
    fn into_ledger(self) -> LedgerError {
        LedgerError::InvalidInput(format!("malformed XML document: {self}"))
    }
}

impl From<quick_xml::Error> for InfraError {
    fn from(value: quick_xml::Error) -> Self {
        InfraError(value.into_ledger())
    }
}

impl IntoLedgerError for serde_json::Error {
    fn into_ledger(self) -> LedgerError {
        LedgerError::InvalidInput(format!("malformed JSON document: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_ledger())
    }
}

impl IntoLedgerError for url::ParseError {
    fn into_ledger(self) -> LedgerError {
        LedgerError::Config(format!("invalid service URL: {self}"))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(value.into_ledger())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
