//! Entity records and per-type collections
//!
//! Records mirror the remote schema and are kept as JSON objects. The core
//! only relies on the identifier field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{LedgerError, Result};

/// Server-assigned identifier field present on persisted records.
pub const ID_FIELD: &str = "Id";

/// A single business entity as returned by the ledger service.
pub type EntityRecord = Map<String, Value>;

/// Identifier of a record, if it has been persisted.
///
/// The service sends identifiers as strings, but numeric identifiers are
/// accepted and rendered in decimal.
pub fn record_id(record: &EntityRecord) -> Option<String> {
    match record.get(ID_FIELD)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Mapping from identifier to record for one entity type.
///
/// Keys are always the identifiers of the records they map to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection {
    entity_type: String,
    records: BTreeMap<String, EntityRecord>,
}

impl EntityCollection {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self { entity_type: entity_type.into(), records: BTreeMap::new() }
    }

    /// Build a collection from query results.
    ///
    /// Records without an identifier cannot be keyed and are returned
    /// separately. A later record with a repeated identifier replaces the
    /// earlier one.
    pub fn from_records(
        entity_type: impl Into<String>,
        records: impl IntoIterator<Item = EntityRecord>,
    ) -> (Self, Vec<EntityRecord>) {
        let mut collection = Self::new(entity_type);
        let mut unkeyed = Vec::new();
        for record in records {
            match record_id(&record) {
                Some(id) => {
                    collection.records.insert(id, record);
                }
                None => unkeyed.push(record),
            }
        }
        (collection, unkeyed)
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Insert or replace a record by its identifier, returning the previous
    /// version.
    pub fn upsert(&mut self, record: EntityRecord) -> Result<Option<EntityRecord>> {
        let id = record_id(&record).ok_or_else(|| {
            LedgerError::InvalidInput(format!(
                "{} record has no {ID_FIELD} and cannot be cached",
                self.entity_type
            ))
        })?;
        Ok(self.records.insert(id, record))
    }

    pub fn remove(&mut self, id: &str) -> Option<EntityRecord> {
        self.records.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub fn into_records(self) -> BTreeMap<String, EntityRecord> {
        self.records
    }
}
