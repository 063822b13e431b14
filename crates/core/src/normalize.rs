//! Response normalization
//!
//! Turns a raw response into either a success payload or a [`Fault`]. A body
//! that cannot be decoded is not an error: the service is known to return
//! empty or truncated bodies under load, so it becomes a transient
//! "(inconclusive)" fault and the executor tries again.

use ledgerlink_domain::{Fault, FaultKind};
use serde_json::{Map, Value};

use crate::ports::{RawResponse, ResponseFormat, XmlDecoder};

const VALIDATION_FAULT: &str = "ValidationFault";
const LEGACY_FAULT_KEYS: [&str; 2] = ["FaultInfo", "ErrorCode"];

/// Normalize a response decoded according to `format`.
pub fn normalize(
    response: &RawResponse,
    format: ResponseFormat,
    xml: &dyn XmlDecoder,
) -> Result<Value, Fault> {
    match format {
        ResponseFormat::Json => normalize_json(response),
        ResponseFormat::Xml => normalize_xml(&response.body, xml),
        ResponseFormat::FileLink => normalize_file_link(response),
    }
}

/// A `Fault` section decides the kind. Without one, an error status is a
/// generic server fault.
fn normalize_json(response: &RawResponse) -> Result<Value, Fault> {
    let value: Value = serde_json::from_str(&response.body).map_err(|_| Fault::inconclusive())?;
    match json_fault(&value) {
        Some(kind) => Err(Fault::new(kind, value)),
        None if !response.is_success() => Err(Fault::transient(serde_json::json!({
            "status": response.status,
            "body": value,
        }))),
        None => Ok(value),
    }
}

/// Classify the `Fault` section of a JSON body, if present.
fn json_fault(value: &Value) -> Option<FaultKind> {
    let section = value.get("Fault").or_else(|| value.get("fault"))?;
    let fault_type = section
        .get("type")
        .or_else(|| section.get("Type"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(classify_fault_type(fault_type))
}

fn classify_fault_type(fault_type: &str) -> FaultKind {
    if fault_type.eq_ignore_ascii_case(VALIDATION_FAULT) {
        FaultKind::Validation
    } else if fault_type.to_ascii_lowercase().contains("authentication") {
        FaultKind::Authentication
    } else {
        FaultKind::Transient
    }
}

fn normalize_xml(body: &str, xml: &dyn XmlDecoder) -> Result<Value, Fault> {
    if body.trim().is_empty() {
        return Err(Fault::inconclusive());
    }
    let value = xml.decode(body).map_err(|_| Fault::inconclusive())?;

    let Some(document) = value.as_object() else {
        return Ok(value);
    };
    let root = document_root(document);

    let fault_section = LEGACY_FAULT_KEYS
        .iter()
        .find_map(|key| root.get(*key).or_else(|| document.get(*key)));

    match fault_section {
        None => Ok(value),
        Some(section) => {
            let terminal = [section, &Value::Object(root.clone())].iter().any(|scope| {
                ["Type", "Cause", "type"]
                    .iter()
                    .filter_map(|key| scope.get(*key).and_then(text_of))
                    .any(|text| text.eq_ignore_ascii_case(VALIDATION_FAULT))
            });
            let kind = if terminal { FaultKind::Validation } else { FaultKind::Transient };
            Err(Fault::new(kind, value))
        }
    }
}

/// Content of the single root element, or the document itself.
pub(crate) fn document_root(document: &Map<String, Value>) -> &Map<String, Value> {
    match document.values().next() {
        Some(Value::Object(root)) if document.len() == 1 => root,
        _ => document,
    }
}

/// Text content of a decoded XML element (plain or carrying attributes).
pub(crate) fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text),
        Value::Object(element) => element.get("#text").and_then(Value::as_str),
        _ => None,
    }
}

fn normalize_file_link(response: &RawResponse) -> Result<Value, Fault> {
    let link = response.body.trim();
    if response.is_success() && !link.is_empty() {
        Ok(Value::String(link.to_string()))
    } else {
        Err(Fault::transient(serde_json::json!({
            "status": response.status,
            "body": response.body,
        })))
    }
}
