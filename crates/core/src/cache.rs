//! Session-scoped entity cache
//!
//! Maps entity-type name to the [`EntityCollection`] last fetched for it.
//!
//! # Architecture
//!
//! - **Population**: a collection is filled by the first query for its type
//!   (or a forced refresh) and kept for the lifetime of the session.
//! - **Mutation**: created and updated records are upserted in place, deleted
//!   ones removed, without requerying the rest of the collection.
//! - **Locking**: each entity type has its own async mutex slot, so
//!   check-then-populate and upsert are atomic per type while different
//!   types proceed independently.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use ledgerlink_domain::{EntityCollection, EntityRecord, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type Slot = Arc<Mutex<Option<EntityCollection>>>;

/// Cache outcome for a `get_or_populate` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Served from the existing collection
    Cached,
    /// Freshly populated from the service
    Populated,
}

/// In-memory entity-type to collection mapping
#[derive(Debug, Default)]
pub struct EntityCache {
    slots: DashMap<String, Slot>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, entity_type: &str) -> Slot {
        Arc::clone(self.slots.entry(entity_type.to_string()).or_default().value())
    }

    /// Return the cached collection, or populate it with `populate`.
    ///
    /// With `force_refresh` the collection is always replaced. A failed
    /// population leaves the previous collection untouched.
    pub async fn get_or_populate<F, Fut>(
        &self,
        entity_type: &str,
        force_refresh: bool,
        populate: F,
    ) -> Result<(EntityCollection, CacheSource)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<EntityRecord>>>,
    {
        let slot = self.slot(entity_type);
        let mut guard = slot.lock().await;

        if let (Some(collection), false) = (guard.as_ref(), force_refresh) {
            debug!(entity_type, records = collection.len(), "serving cached collection");
            return Ok((collection.clone(), CacheSource::Cached));
        }

        info!(entity_type, force_refresh, "caching list of {}", entity_type);
        let records = populate().await?;
        let (collection, unkeyed) = EntityCollection::from_records(entity_type, records);
        if !unkeyed.is_empty() {
            warn!(entity_type, skipped = unkeyed.len(), "records without an identifier not cached");
        }
        debug!(entity_type, records = collection.len(), "collection populated");

        *guard = Some(collection.clone());
        Ok((collection, CacheSource::Populated))
    }

    /// Insert or replace one record. A collection that was never populated
    /// starts out as a single-entry collection.
    pub async fn upsert(&self, entity_type: &str, record: EntityRecord) -> Result<()> {
        let slot = self.slot(entity_type);
        let mut guard = slot.lock().await;
        let collection = guard.get_or_insert_with(|| EntityCollection::new(entity_type));
        let replaced = collection.upsert(record)?.is_some();
        debug!(entity_type, replaced, records = collection.len(), "record upserted into cache");
        Ok(())
    }

    /// Remove one record, returning whether it was cached.
    pub async fn remove(&self, entity_type: &str, id: &str) -> bool {
        let Some(slot) = self.slots.get(entity_type).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        let mut guard = slot.lock().await;
        let removed = guard.as_mut().and_then(|collection| collection.remove(id)).is_some();
        debug!(entity_type, id, removed, "record removed from cache");
        removed
    }

    /// Snapshot of the cached collection, without populating it.
    pub async fn cached(&self, entity_type: &str) -> Option<EntityCollection> {
        let slot = self.slots.get(entity_type).map(|entry| Arc::clone(entry.value()))?;
        let guard = slot.lock().await;
        guard.clone()
    }

    /// Forget the collection for one type.
    pub async fn invalidate(&self, entity_type: &str) {
        if let Some(slot) = self.slots.get(entity_type).map(|entry| Arc::clone(entry.value())) {
            *slot.lock().await = None;
        }
    }
}
