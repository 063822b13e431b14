//! Query dialects: how a page is requested and how its records are found
//!
//! [`QueryDialect`] drives the SQL-like query endpoint with `STARTPOSITION`
//! and `MAXRESULTS` directives. [`LegacyDialect`] drives the XML resource
//! surface with `ResultsPerPage`/`PageNum` form payloads.

use ledgerlink_domain::constants::{LEGACY_PAGE_SIZE, PAGE_SIZE_CEILING};
use ledgerlink_domain::{EntityRecord, LedgerError, Result};
use serde_json::Value;

use crate::normalize::{document_root, text_of};
use crate::ports::{RequestBody, ResponseFormat, ServiceRequest};

/// Position of the next page within one logical query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// 0-based page number
    pub page_index: u32,
    pub page_size: u32,
}

impl PageCursor {
    pub const fn first(page_size: u32) -> Self {
        Self { page_index: 0, page_size }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self { page_index: self.page_index + 1, page_size: self.page_size }
    }

    pub const fn is_first(self) -> bool {
        self.page_index == 0
    }

    /// 1-based offset of the first record on this page.
    pub const fn start_position(self) -> u32 {
        1 + self.page_index * self.page_size
    }
}

/// Records extracted from one page
#[derive(Debug, Clone, PartialEq)]
pub enum PageContents {
    /// The response section is present but holds no records
    Empty,
    Records {
        records: Vec<EntityRecord>,
        /// Count reported by the service, when it bothers to report one
        declared_count: Option<u64>,
    },
}

/// Request shape and response layout of one paging surface
pub trait PagingDialect: Send + Sync {
    /// Entity type whose records are being collected
    fn entity_type(&self) -> &str;

    /// Maximum records the server returns per page
    fn page_size(&self) -> u32;

    fn response_format(&self) -> ResponseFormat;

    fn page_request(&self, cursor: PageCursor) -> ServiceRequest;

    /// Find the records in a success payload.
    fn extract_page(&self, payload: &Value) -> Result<PageContents>;
}

/// SQL-like query endpoint (`.../company/{realm}/query`)
#[derive(Debug, Clone)]
pub struct QueryDialect {
    url: String,
    realm: String,
    entity_type: String,
    query_text: String,
    page_size: u32,
}

impl QueryDialect {
    pub fn new(
        base_url: &str,
        realm: impl Into<String>,
        entity_type: impl Into<String>,
        query_text: impl Into<String>,
    ) -> Self {
        let realm = realm.into();
        Self {
            url: format!("{}/company/{realm}/query", base_url.trim_end_matches('/')),
            realm,
            entity_type: entity_type.into(),
            query_text: query_text.into(),
            page_size: PAGE_SIZE_CEILING,
        }
    }

    /// Override the page ceiling. Only useful against test servers.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Statement for the page at `cursor`. The first page carries no
    /// `STARTPOSITION` directive.
    pub fn statement(&self, cursor: PageCursor) -> String {
        if cursor.is_first() {
            format!("{} MAXRESULTS {}", self.query_text, self.page_size)
        } else {
            format!(
                "{} STARTPOSITION {} MAXRESULTS {}",
                self.query_text,
                cursor.start_position(),
                self.page_size
            )
        }
    }
}

impl PagingDialect for QueryDialect {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn response_format(&self) -> ResponseFormat {
        ResponseFormat::Json
    }

    fn page_request(&self, cursor: PageCursor) -> ServiceRequest {
        ServiceRequest::post(&self.url, &self.realm)
            .header("Content-Type", "application/text")
            .header("Accept", "application/json")
            .body(RequestBody::Text(self.statement(cursor)))
    }

    fn extract_page(&self, payload: &Value) -> Result<PageContents> {
        let section = payload.get("QueryResponse").and_then(Value::as_object).ok_or_else(|| {
            LedgerError::UnexpectedResponse {
                entity_type: self.entity_type.clone(),
                detail: payload.clone(),
            }
        })?;

        let records = match section.get(&self.entity_type) {
            None => return Ok(PageContents::Empty),
            Some(value) => records_from(value).ok_or_else(|| LedgerError::UnexpectedResponse {
                entity_type: self.entity_type.clone(),
                detail: payload.clone(),
            })?,
        };
        if records.is_empty() {
            return Ok(PageContents::Empty);
        }

        let declared_count = section.get("totalCount").and_then(count_of);
        Ok(PageContents::Records { records, declared_count })
    }
}

/// Legacy XML resource surface (`{legacy}/resource/{resource}/v2/{realm}`)
#[derive(Debug, Clone)]
pub struct LegacyDialect {
    url: String,
    realm: String,
    entity_type: String,
    page_size: u32,
}

impl LegacyDialect {
    pub fn new(
        legacy_base_url: &str,
        realm: impl Into<String>,
        resource: &str,
        entity_type: impl Into<String>,
    ) -> Self {
        let realm = realm.into();
        Self {
            url: format!(
                "{}/resource/{resource}/v2/{realm}",
                legacy_base_url.trim_end_matches('/')
            ),
            realm,
            entity_type: entity_type.into(),
            page_size: LEGACY_PAGE_SIZE,
        }
    }
}

impl PagingDialect for LegacyDialect {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }

    fn response_format(&self) -> ResponseFormat {
        ResponseFormat::Xml
    }

    fn page_request(&self, cursor: PageCursor) -> ServiceRequest {
        ServiceRequest::post(&self.url, &self.realm).body(RequestBody::Form(vec![
            ("ResultsPerPage".to_string(), self.page_size.to_string()),
            ("PageNum".to_string(), (cursor.page_index + 1).to_string()),
        ]))
    }

    fn extract_page(&self, payload: &Value) -> Result<PageContents> {
        let document = payload.as_object().ok_or_else(|| LedgerError::UnexpectedResponse {
            entity_type: self.entity_type.clone(),
            detail: payload.clone(),
        })?;
        let root = document_root(document);

        let records = root
            .get("CdmCollections")
            .and_then(|collections| collections.get(&self.entity_type))
            .and_then(records_from)
            .unwrap_or_default();
        if records.is_empty() {
            return Ok(PageContents::Empty);
        }

        let declared_count = root.get("Count").and_then(count_of);
        Ok(PageContents::Records { records, declared_count })
    }
}

/// Records from an entity section: an array of objects, or a single object
/// when the decoder saw only one element.
fn records_from(value: &Value) -> Option<Vec<EntityRecord>> {
    match value {
        Value::Array(items) => {
            items.iter().map(|item| item.as_object().cloned()).collect::<Option<Vec<_>>>()
        }
        Value::Object(record) => Some(vec![record.clone()]),
        _ => None,
    }
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(count) => count.as_u64(),
        other => text_of(other).and_then(|text| text.trim().parse().ok()),
    }
}
