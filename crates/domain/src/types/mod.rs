//! Domain types and models

pub mod catalog;
pub mod credentials;
pub mod entity;
pub mod fault;
pub mod query;

pub use catalog::EntityCatalog;
pub use credentials::Credentials;
pub use entity::{record_id, EntityCollection, EntityRecord, ID_FIELD};
pub use fault::{Fault, FaultKind};
pub use query::{Criterion, QueryDescriptor, QueryFilter};
