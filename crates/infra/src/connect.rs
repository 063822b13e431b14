//! Wiring: configuration in, ready-to-use [`LedgerService`] out

use std::sync::Arc;

use ledgerlink_core::{Endpoints, ExecutorSettings, LedgerService, RequestExecutor};
use ledgerlink_domain::{ClientConfig, Result};
use tracing::debug;

use crate::http::HttpClient;
use crate::oauth1::OAuth1SessionFactory;
use crate::xml::QuickXmlDecoder;

/// Build a client for the realm named in `config`.
///
/// No network traffic happens here. Credentials are checked when the first
/// request establishes the signed session.
pub fn connect(config: &ClientConfig) -> Result<LedgerService> {
    connect_with(config, HttpClient::new()?)
}

/// Same as [`connect`], with a caller-supplied HTTP client.
pub fn connect_with(config: &ClientConfig, http: HttpClient) -> Result<LedgerService> {
    let factory = OAuth1SessionFactory::new(http, config.credentials.clone());
    let settings = ExecutorSettings::from(&config.retry);
    debug!(
        max_attempts = settings.max_attempts,
        backoff_ms = config.retry.backoff_ms,
        base_url = config.base_url(),
        "building ledger client"
    );

    let executor =
        RequestExecutor::new(Arc::new(factory), Arc::new(QuickXmlDecoder::new()), settings)?;
    let endpoints = Endpoints::new(
        config.base_url(),
        config.legacy_base_url(),
        config.credentials.realm_id.clone(),
    );
    Ok(LedgerService::new(Arc::new(executor), endpoints))
}
