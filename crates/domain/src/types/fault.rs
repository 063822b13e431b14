//! Fault envelope produced by response normalization

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Diagnostic attached to a body that could not be decoded.
pub const INCONCLUSIVE: &str = "(inconclusive)";

/// Classification of a fault reported (or implied) by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The service rejected the payload. Terminal.
    Validation,
    /// The service reported an authentication fault. These are frequently
    /// spurious and clear on retry.
    Authentication,
    /// Network hiccups, malformed bodies and generic server faults.
    Transient,
}

impl FaultKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Transient => "transient",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fault plus the raw diagnostic payload it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub detail: Value,
}

impl Fault {
    pub const fn new(kind: FaultKind, detail: Value) -> Self {
        Self { kind, detail }
    }

    pub const fn validation(detail: Value) -> Self {
        Self::new(FaultKind::Validation, detail)
    }

    pub const fn authentication(detail: Value) -> Self {
        Self::new(FaultKind::Authentication, detail)
    }

    pub const fn transient(detail: Value) -> Self {
        Self::new(FaultKind::Transient, detail)
    }

    /// Transient fault for a body that could not be parsed at all.
    pub fn inconclusive() -> Self {
        Self::transient(Value::String(INCONCLUSIVE.to_string()))
    }

    pub fn is_validation(&self) -> bool {
        self.kind == FaultKind::Validation
    }
}
