//! # LedgerLink Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the signed transport session and XML decoding
//! - The response normalizer and the retrying request executor
//! - The paged query driver and its query dialects
//! - The entity cache and the CRUD facade ([`LedgerService`])
//!
//! ## Architecture Principles
//! - Only depends on `ledgerlink-common` and `ledgerlink-domain`
//! - No HTTP, OAuth or XML parsing code
//! - All external dependencies via traits

pub mod cache;
pub mod executor;
pub mod normalize;
pub mod paging;
pub mod ports;
pub mod service;

pub use cache::EntityCache;
pub use executor::{ExecutorSettings, RequestExecutor};
pub use normalize::normalize;
pub use paging::{
    DriverState, LegacyDialect, PageContents, PageCursor, PagedQueryDriver, PagingDialect,
    QueryDialect,
};
pub use ports::{
    HttpMethod, RawResponse, RequestBody, ResponseFormat, ServiceRequest, SessionFactory,
    TransportSession, XmlDecoder,
};
pub use service::{Endpoints, LedgerService};
