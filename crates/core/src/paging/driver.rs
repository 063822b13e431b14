//! Paged query driver
//!
//! Turns one logical query into the complete ordered record sequence by
//! issuing page requests through the [`RequestExecutor`] until the service
//! signals the last page.
//!
//! Completion follows the count the service declares on the page and falls
//! back to the number of records returned when no count is declared: a page
//! at (or above) the ceiling means more may follow, anything less was the
//! last page. An empty page always ends the query.

use std::sync::Arc;

use ledgerlink_domain::{EntityRecord, LedgerError, Result};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::dialect::{PageContents, PageCursor, PagingDialect};
use crate::executor::RequestExecutor;

/// State of one logical query
#[derive(Debug, Clone, PartialEq)]
pub enum DriverState {
    /// About to request the page at the cursor
    Querying(PageCursor),
    /// A page payload arrived for the cursor and is being folded in
    Accumulating { cursor: PageCursor, payload: Value },
    Done,
}

/// Drives repeated page requests for one query at a time
#[derive(Clone)]
pub struct PagedQueryDriver {
    executor: Arc<RequestExecutor>,
}

impl PagedQueryDriver {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Fetch every record for the query described by `dialect`.
    ///
    /// A fault on any page fails the whole query. When pages were already
    /// accumulated they travel inside [`LedgerError::PartialQuery`].
    /// Cancellation is observed between pages.
    pub async fn fetch_all(
        &self,
        dialect: &dyn PagingDialect,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<EntityRecord>> {
        let entity_type = dialect.entity_type();
        let page_size = dialect.page_size();
        let mut accumulated: Vec<EntityRecord> = Vec::new();
        let mut pages: u32 = 0;
        let mut state = DriverState::Querying(PageCursor::first(page_size));

        loop {
            state = match state {
                DriverState::Querying(cursor) => {
                    if cancel.is_some_and(CancellationToken::is_cancelled) {
                        info!(entity_type, pages, records = accumulated.len(), "query cancelled");
                        return Err(LedgerError::Cancelled { records: accumulated });
                    }

                    debug!(
                        entity_type,
                        page = cursor.page_index + 1,
                        start_position = cursor.start_position(),
                        "batch begins with record {}",
                        cursor.start_position()
                    );
                    let request = dialect.page_request(cursor);
                    match self.executor.execute(&request, dialect.response_format()).await {
                        Ok(payload) => DriverState::Accumulating { cursor, payload },
                        Err(error) => {
                            return Err(partial_failure(entity_type, accumulated, pages, error))
                        }
                    }
                }
                DriverState::Accumulating { cursor, payload } => {
                    let contents = match dialect.extract_page(&payload) {
                        Ok(contents) => contents,
                        Err(error) => {
                            return Err(partial_failure(entity_type, accumulated, pages, error))
                        }
                    };
                    pages += 1;

                    match contents {
                        PageContents::Empty => DriverState::Done,
                        PageContents::Records { records, declared_count } => {
                            let measured = declared_count.unwrap_or(records.len() as u64);
                            debug!(
                                entity_type,
                                page = pages,
                                records = records.len(),
                                declared_count,
                                "page received"
                            );
                            accumulated.extend(records);
                            if measured >= u64::from(page_size) {
                                DriverState::Querying(cursor.next())
                            } else {
                                DriverState::Done
                            }
                        }
                    }
                }
                DriverState::Done => {
                    debug!(entity_type, pages, records = accumulated.len(), "query complete");
                    return Ok(accumulated);
                }
            };
        }
    }
}

fn partial_failure(
    entity_type: &str,
    records: Vec<EntityRecord>,
    pages: u32,
    error: LedgerError,
) -> LedgerError {
    if records.is_empty() {
        error
    } else {
        LedgerError::PartialQuery {
            entity_type: entity_type.to_string(),
            records,
            pages,
            source: Box::new(error),
        }
    }
}
