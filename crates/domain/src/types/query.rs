//! Query descriptors and their translation to the service's query language

use serde::{Deserialize, Serialize};

use crate::constants::FILTERABLE_PROPERTIES;
use crate::errors::{LedgerError, Result};

/// One `property operator criterion` condition of a parameterised filter.
///
/// The criterion is inserted verbatim, so string literals must carry their
/// own quotes (`'2024-01-01'`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub property: String,
    pub operator: String,
    pub criterion: String,
}

impl Criterion {
    pub fn new(
        property: impl Into<String>,
        operator: impl Into<String>,
        criterion: impl Into<String>,
    ) -> Self {
        Self { property: property.into(), operator: operator.into(), criterion: criterion.into() }
    }

    /// Parse `"TxnDate >= '2024-01-01'"` into its three parts.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.trim().splitn(3, char::is_whitespace);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(property), Some(operator), Some(criterion))
                if !property.is_empty() && !operator.is_empty() =>
            {
                Ok(Self::new(property, operator, criterion.trim()))
            }
            _ => Err(LedgerError::InvalidInput(format!(
                "expected `property operator criterion`, got `{text}`"
            ))),
        }
    }

    fn render(&self) -> Result<String> {
        if !FILTERABLE_PROPERTIES.contains(&self.property.as_str()) {
            return Err(LedgerError::Config(format!(
                "unfamiliar filter property `{}` (expected one of: {})",
                self.property,
                FILTERABLE_PROPERTIES.join(", ")
            )));
        }
        Ok(format!("{} {} {}", self.property, self.operator, self.criterion))
    }
}

/// Optional restriction applied to a `SELECT * FROM <EntityType>` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFilter {
    /// AND-joined conditions on the filterable properties.
    Params(Vec<Criterion>),
    /// Raw text appended after the `FROM` clause, e.g. `WHERE Active = true`.
    Tail(String),
    /// Complete statement that replaces the generated one.
    Raw(String),
}

/// What to query: an entity type plus an optional filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub entity_type: String,
    pub filter: Option<QueryFilter>,
}

impl QueryDescriptor {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self { entity_type: entity_type.into(), filter: None }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<QueryFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Render the statement without paging directives.
    pub fn to_query_text(&self) -> Result<String> {
        let mut text = format!("SELECT * FROM {}", self.entity_type);
        match &self.filter {
            None => {}
            Some(QueryFilter::Raw(statement)) => return Ok(statement.trim().to_string()),
            Some(QueryFilter::Tail(tail)) => {
                let tail = tail.trim();
                if !tail.is_empty() {
                    text.push(' ');
                    text.push_str(tail);
                }
            }
            Some(QueryFilter::Params(criteria)) => {
                for (index, criterion) in criteria.iter().enumerate() {
                    text.push_str(if index == 0 { " WHERE " } else { " AND " });
                    text.push_str(&criterion.render()?);
                }
            }
        }
        Ok(text)
    }
}
