//! Paging: page requests, record extraction and the driver state machine

pub mod dialect;
pub mod driver;

pub use dialect::{LegacyDialect, PageContents, PageCursor, PagingDialect, QueryDialect};
pub use driver::{DriverState, PagedQueryDriver};
