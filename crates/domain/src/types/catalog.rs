//! Known entity types and their default filters

use std::collections::BTreeSet;

use crate::constants::{
    BUSINESS_OBJECTS, INCLUDE_INACTIVE_FILTER, NAME_LIST_OBJECTS, TRANSACTION_OBJECTS,
    UNFILTERED_ENTITY_TYPE,
};
use crate::errors::{LedgerError, Result};
use crate::types::query::QueryFilter;

/// Immutable set of entity-type names, injected into the core services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCatalog {
    business_objects: BTreeSet<String>,
    name_list: Vec<String>,
    transactions: Vec<String>,
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self::new(BUSINESS_OBJECTS, NAME_LIST_OBJECTS, TRANSACTION_OBJECTS)
    }
}

impl EntityCatalog {
    pub fn new(business_objects: &[&str], name_list: &[&str], transactions: &[&str]) -> Self {
        Self {
            business_objects: business_objects.iter().map(|name| (*name).to_string()).collect(),
            name_list: owned(name_list),
            transactions: owned(transactions),
        }
    }

    /// Case-sensitive membership check.
    pub fn is_known(&self, entity_type: &str) -> bool {
        self.business_objects.contains(entity_type)
    }

    pub fn require_known(&self, entity_type: &str) -> Result<()> {
        if self.is_known(entity_type) {
            Ok(())
        } else {
            Err(LedgerError::Config(format!(
                "`{entity_type}` is not a known entity type (names are case sensitive)"
            )))
        }
    }

    pub fn is_name_list(&self, entity_type: &str) -> bool {
        self.name_list.iter().any(|name| name == entity_type)
    }

    pub fn name_list(&self) -> &[String] {
        &self.name_list
    }

    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }

    /// Filter to use when the caller supplied none.
    ///
    /// Name-list types include inactive records, since the service hides
    /// soft-deleted ones by default.
    pub fn default_filter(&self, entity_type: &str) -> Option<QueryFilter> {
        self.is_name_list(entity_type)
            .then(|| QueryFilter::Tail(INCLUDE_INACTIVE_FILTER.to_string()))
    }

    /// Filter for one type of a multi-type fetch sharing `shared` across
    /// types. The unfiltered type never inherits a filter.
    pub fn filter_for(&self, entity_type: &str, shared: Option<&QueryFilter>) -> Option<QueryFilter> {
        if entity_type == UNFILTERED_ENTITY_TYPE {
            return None;
        }
        shared.cloned().or_else(|| self.default_filter(entity_type))
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_contents() {
        let catalog = EntityCatalog::default();
        assert!(catalog.is_known("Invoice"));
        assert!(!catalog.is_known("invoice"));
        assert_eq!(catalog.name_list().len(), 11);
        assert_eq!(catalog.transactions().len(), 12);
        assert!(matches!(catalog.require_known("Widget"), Err(LedgerError::Config(_))));
    }

    #[test]
    fn name_list_types_default_to_including_inactive() {
        let catalog = EntityCatalog::default();
        assert_eq!(
            catalog.default_filter("Customer"),
            Some(QueryFilter::Tail(INCLUDE_INACTIVE_FILTER.into()))
        );
        assert_eq!(catalog.default_filter("Invoice"), None);
    }

    #[test]
    fn time_activity_never_inherits_a_filter() {
        let catalog = EntityCatalog::default();
        let shared = QueryFilter::Tail("WHERE TxnDate > '2024-01-01'".into());
        assert_eq!(catalog.filter_for("TimeActivity", Some(&shared)), None);
        assert_eq!(catalog.filter_for("Bill", Some(&shared)), Some(shared.clone()));
        assert_eq!(
            catalog.filter_for("Vendor", None),
            Some(QueryFilter::Tail(INCLUDE_INACTIVE_FILTER.into()))
        );
    }
}
