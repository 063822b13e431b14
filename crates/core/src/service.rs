//! Ledger service: CRUD facade, cached collections and query helpers
//!
//! Every remote call goes through the shared [`RequestExecutor`]; paged
//! queries go through the [`PagedQueryDriver`]. Successful mutations are
//! reconciled into the [`EntityCache`].

use std::collections::BTreeMap;
use std::sync::Arc;

use ledgerlink_domain::{
    record_id, EntityCatalog, EntityCollection, EntityRecord, LedgerError, Lookup,
    QueryDescriptor, QueryFilter, Result,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::cache::EntityCache;
use crate::executor::RequestExecutor;
use crate::paging::{LegacyDialect, PagedQueryDriver, QueryDialect};
use crate::ports::{RequestBody, ResponseFormat, ServiceRequest};

/// Error code the service uses for a missing object.
const OBJECT_NOT_FOUND_CODE: &str = "610";

/// Where requests are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub legacy_base_url: String,
    pub realm: String,
}

impl Endpoints {
    pub fn new(
        base_url: impl Into<String>,
        legacy_base_url: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            legacy_base_url: legacy_base_url.into().trim_end_matches('/').to_string(),
            realm: realm.into(),
        }
    }

    fn company_url(&self) -> String {
        format!("{}/company/{}", self.base_url, self.realm)
    }

    fn entity_url(&self, entity_type: &str) -> String {
        format!("{}/{}", self.company_url(), entity_type.to_lowercase())
    }
}

/// Client for one realm of the ledger service
pub struct LedgerService {
    executor: Arc<RequestExecutor>,
    driver: PagedQueryDriver,
    cache: EntityCache,
    catalog: EntityCatalog,
    endpoints: Endpoints,
}

impl LedgerService {
    pub fn new(executor: Arc<RequestExecutor>, endpoints: Endpoints) -> Self {
        Self {
            driver: PagedQueryDriver::new(Arc::clone(&executor)),
            executor,
            cache: EntityCache::new(),
            catalog: EntityCatalog::default(),
            endpoints,
        }
    }

    /// Replace the entity catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: EntityCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Run a query and return every matching record, uncached.
    #[instrument(skip(self, descriptor, cancel), fields(entity_type = %descriptor.entity_type))]
    pub async fn query(
        &self,
        descriptor: &QueryDescriptor,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<EntityRecord>> {
        self.catalog.require_known(&descriptor.entity_type)?;
        let text = descriptor.to_query_text()?;
        debug!(query = %text, "running query");

        let dialect = QueryDialect::new(
            &self.endpoints.base_url,
            &self.endpoints.realm,
            &descriptor.entity_type,
            text,
        );
        self.driver.fetch_all(&dialect, cancel).await
    }

    /// Cached collection for one entity type.
    ///
    /// The filter only applies when the collection is (re)populated. Without
    /// an explicit filter, name-list types include inactive records.
    pub async fn get(
        &self,
        entity_type: &str,
        force_refresh: bool,
        filter: Option<QueryFilter>,
    ) -> Result<EntityCollection> {
        self.catalog.require_known(entity_type)?;
        let filter = filter.or_else(|| self.catalog.default_filter(entity_type));
        let descriptor = QueryDescriptor::new(entity_type).with_filter(filter);

        let (collection, _) = self
            .cache
            .get_or_populate(entity_type, force_refresh, || self.query(&descriptor, None))
            .await?;
        Ok(collection)
    }

    /// Cached collections for several entity types sharing one filter.
    pub async fn collections(
        &self,
        entity_types: &[String],
        force_refresh: bool,
        filter: Option<&QueryFilter>,
    ) -> Result<BTreeMap<String, EntityCollection>> {
        let mut collections = BTreeMap::new();
        for entity_type in entity_types {
            let type_filter = self.catalog.filter_for(entity_type, filter);
            let collection = self.get(entity_type, force_refresh, type_filter).await?;
            collections.insert(entity_type.clone(), collection);
        }
        Ok(collections)
    }

    /// Every name-list collection.
    pub async fn names(
        &self,
        force_refresh: bool,
        filter: Option<&QueryFilter>,
    ) -> Result<BTreeMap<String, EntityCollection>> {
        let types = self.catalog.name_list().to_vec();
        self.collections(&types, force_refresh, filter).await
    }

    /// Every transaction collection.
    pub async fn transactions(
        &self,
        force_refresh: bool,
        filter: Option<&QueryFilter>,
    ) -> Result<BTreeMap<String, EntityCollection>> {
        let types = self.catalog.transactions().to_vec();
        self.collections(&types, force_refresh, filter).await
    }

    /// Page through a collection on the legacy XML surface.
    pub async fn fetch_legacy_collection(
        &self,
        resource: &str,
        entity_type: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<EntityRecord>> {
        let dialect = LegacyDialect::new(
            &self.endpoints.legacy_base_url,
            &self.endpoints.realm,
            resource,
            entity_type,
        );
        self.driver.fetch_all(&dialect, cancel).await
    }

    // ------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------

    /// Create a record and add it to the cached collection.
    #[instrument(skip(self, record))]
    pub async fn create(&self, entity_type: &str, record: EntityRecord) -> Result<EntityRecord> {
        self.catalog.require_known(entity_type)?;
        let body = Value::Object(record.clone());
        debug!(request_body = %body, "about to create record");

        let created = self.submit(entity_type, &record, None).await?;
        self.cache.upsert(entity_type, created.clone()).await?;
        let id = record_id(&created).unwrap_or_default();
        info!(id = %id, "record created");
        Ok(created)
    }

    /// Read one record by identifier.
    #[instrument(skip(self))]
    pub async fn read(&self, entity_type: &str, id: &str) -> Result<Lookup<EntityRecord>> {
        self.catalog.require_known(entity_type)?;
        let request = json_request(ServiceRequest::get(
            format!("{}/{id}", self.endpoints.entity_url(entity_type)),
            &self.endpoints.realm,
        ));

        match self.executor.execute(&request, ResponseFormat::Json).await {
            Ok(payload) => Ok(match payload.get(entity_type).and_then(Value::as_object) {
                Some(record) => Lookup::Found(record.clone()),
                None => Lookup::NotFound { detail: payload },
            }),
            Err(LedgerError::Validation { detail }) if is_object_not_found(&detail) => {
                debug!("record not found");
                Ok(Lookup::NotFound { detail })
            }
            Err(error) => Err(error),
        }
    }

    /// Read a record, merge `changes` over it and submit the result.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        entity_type: &str,
        id: &str,
        changes: EntityRecord,
    ) -> Result<Lookup<EntityRecord>> {
        let mut merged = match self.read(entity_type, id).await? {
            Lookup::Found(current) => current,
            not_found @ Lookup::NotFound { .. } => return Ok(not_found),
        };
        merged.extend(changes);
        let body = Value::Object(merged.clone());
        debug!(request_body = %body, "about to update record");

        let updated = self.submit(entity_type, &merged, None).await?;
        self.cache.upsert(entity_type, updated.clone()).await?;
        info!("record updated");
        Ok(Lookup::Found(updated))
    }

    /// Delete a record and drop it from the cached collection.
    #[instrument(skip(self))]
    pub async fn delete(&self, entity_type: &str, id: &str) -> Result<Lookup<EntityRecord>> {
        let current = match self.read(entity_type, id).await? {
            Lookup::Found(current) => current,
            not_found @ Lookup::NotFound { .. } => return Ok(not_found),
        };
        let Some(current_id) = record_id(&current) else {
            return Ok(Lookup::NotFound { detail: Value::Object(current) });
        };

        let deleted = self.submit(entity_type, &current, Some("delete")).await?;
        self.cache.remove(entity_type, &current_id).await;
        info!("record deleted");
        Ok(Lookup::Found(deleted))
    }

    /// POST a record to the entity endpoint and return the entity section of
    /// the response.
    async fn submit(
        &self,
        entity_type: &str,
        record: &EntityRecord,
        operation: Option<&str>,
    ) -> Result<EntityRecord> {
        let body = serde_json::to_string(record)
            .map_err(|e| LedgerError::Internal(format!("failed to encode record: {e}")))?;
        let mut request = json_request(
            ServiceRequest::post(self.endpoints.entity_url(entity_type), &self.endpoints.realm)
                .header("Content-Type", "application/json")
                .body(RequestBody::Text(body)),
        );
        if let Some(operation) = operation {
            request = request.query_param("operation", operation);
        }

        let payload = self.executor.execute(&request, ResponseFormat::Json).await?;
        match payload.get(entity_type).and_then(Value::as_object) {
            Some(record) => Ok(record.clone()),
            None => Err(LedgerError::UnexpectedResponse {
                entity_type: entity_type.to_string(),
                detail: payload,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Pass-through operations
    // ------------------------------------------------------------------

    /// Fetch a named report.
    pub async fn report(&self, report_name: &str, params: &[(String, String)]) -> Result<Value> {
        let mut request = json_request(ServiceRequest::get(
            format!("{}/reports/{report_name}", self.endpoints.company_url()),
            &self.endpoints.realm,
        ));
        request.query.extend(params.iter().cloned());
        self.executor.execute(&request, ResponseFormat::Json).await
    }

    /// Temporary download URL for an attachment.
    pub async fn download_link(&self, attachment_id: &str) -> Result<String> {
        let request = ServiceRequest::get(
            format!("{}/download/{attachment_id}", self.endpoints.company_url()),
            &self.endpoints.realm,
        );
        match self.executor.execute(&request, ResponseFormat::FileLink).await? {
            Value::String(link) => Ok(link),
            other => Err(LedgerError::UnexpectedResponse {
                entity_type: "Attachable".to_string(),
                detail: other,
            }),
        }
    }

    // ------------------------------------------------------------------
    // Customer-scoped helpers
    // ------------------------------------------------------------------

    /// Every invoice billed to one customer.
    pub async fn invoices_for_customer(&self, customer_id: &str) -> Result<Vec<EntityRecord>> {
        let descriptor = QueryDescriptor::new("Invoice").with_filter(Some(QueryFilter::Tail(
            format!("WHERE CustomerRef = '{}'", quote_literal(customer_id)),
        )));
        self.query(&descriptor, None).await
    }

    /// Purchases with an account-based expense line charged to one customer.
    ///
    /// Only purchases created after the customer itself are queried.
    pub async fn purchases_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Lookup<Vec<EntityRecord>>> {
        let customer = match self.read("Customer", customer_id).await? {
            Lookup::Found(customer) => customer,
            Lookup::NotFound { detail } => return Ok(Lookup::NotFound { detail }),
        };

        let created_after = customer
            .get("MetaData")
            .and_then(|meta| meta.get("CreateTime"))
            .and_then(Value::as_str)
            .map(|time| format!("WHERE MetaData.CreateTime > '{}'", quote_literal(time)));
        let descriptor =
            QueryDescriptor::new("Purchase").with_filter(created_after.map(QueryFilter::Tail));

        let purchases = self.query(&descriptor, None).await?;
        let matching: Vec<EntityRecord> = purchases
            .into_iter()
            .filter(|purchase| charges_customer(purchase, customer_id))
            .collect();
        debug!(customer_id, purchases = matching.len(), "filtered purchases for customer");
        Ok(Lookup::Found(matching))
    }
}

/// Add the JSON accept header used by the v3 surface.
fn json_request(request: ServiceRequest) -> ServiceRequest {
    request.header("Accept", "application/json")
}

/// Escape a value for use inside a single-quoted query literal.
fn quote_literal(value: &str) -> String {
    value.replace('\'', "\\'")
}

fn is_object_not_found(detail: &Value) -> bool {
    detail
        .pointer("/Fault/Error")
        .and_then(Value::as_array)
        .is_some_and(|errors| {
            errors.iter().any(|error| {
                error.get("code").and_then(Value::as_str) == Some(OBJECT_NOT_FOUND_CODE)
                    || error
                        .get("Message")
                        .and_then(Value::as_str)
                        .is_some_and(|message| message.eq_ignore_ascii_case("Object Not Found"))
            })
        })
}

fn charges_customer(purchase: &EntityRecord, customer_id: &str) -> bool {
    let wanted = json!(customer_id);
    purchase.get("Line").and_then(Value::as_array).is_some_and(|lines| {
        lines.iter().any(|line| {
            line.pointer("/AccountBasedExpenseLineDetail/CustomerRef/value") == Some(&wanted)
        })
    })
}
