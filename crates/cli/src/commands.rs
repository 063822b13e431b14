//! Command handlers
//!
//! Each handler returns the JSON document to print. Failures keep the last
//! diagnostic payload from the service in the error chain.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use ledgerlink_core::LedgerService;
use ledgerlink_domain::{
    ClientConfig, Criterion, EntityCollection, EntityRecord, LedgerError, Lookup, QueryDescriptor,
    QueryFilter,
};
use ledgerlink_infra::{HttpClient, OAuth1Client, RequestToken};
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::args::{Command, FilterArgs};

pub async fn run(command: Command, config: &ClientConfig) -> Result<Value> {
    match command {
        Command::Authorize { callback } => authorize(config, callback).await,
        Command::Exchange { request_token, request_token_secret, verifier, realm_id } => {
            let token = RequestToken { token: request_token, secret: request_token_secret };
            exchange(config, &token, &verifier, realm_id).await
        }
        other => {
            let client = ledgerlink_infra::connect(config)?;
            run_with_client(&client, other).await
        }
    }
}

async fn run_with_client(client: &LedgerService, command: Command) -> Result<Value> {
    match command {
        Command::Query { entity_type, filter } => {
            let descriptor = QueryDescriptor::new(&entity_type).with_filter(build_filter(&filter)?);
            let cancel = cancel_on_ctrl_c();
            let records = client.query(&descriptor, Some(&cancel)).await.map_err(explain)?;
            Ok(records_json(records))
        }
        Command::Read { entity_type, id } => lookup_json(client.read(&entity_type, &id).await?),
        Command::Create { entity_type, data } => {
            let created = client.create(&entity_type, parse_record(&data)?).await.map_err(explain)?;
            Ok(Value::Object(created))
        }
        Command::Update { entity_type, id, data } => {
            let changes = parse_record(&data)?;
            lookup_json(client.update(&entity_type, &id, changes).await.map_err(explain)?)
        }
        Command::Delete { entity_type, id } => {
            lookup_json(client.delete(&entity_type, &id).await.map_err(explain)?)
        }
        Command::Names { filter } => {
            let collections =
                client.names(false, build_filter(&filter)?.as_ref()).await.map_err(explain)?;
            Ok(collections_json(collections))
        }
        Command::Transactions { filter } => {
            let collections =
                client.transactions(false, build_filter(&filter)?.as_ref()).await.map_err(explain)?;
            Ok(collections_json(collections))
        }
        Command::Report { name, params } => {
            let params = params.iter().map(|p| parse_param(p)).collect::<Result<Vec<_>>>()?;
            Ok(client.report(&name, &params).await.map_err(explain)?)
        }
        Command::DownloadLink { attachment_id } => {
            Ok(Value::String(client.download_link(&attachment_id).await.map_err(explain)?))
        }
        Command::Legacy { resource, entity_type } => {
            let cancel = cancel_on_ctrl_c();
            let records = client
                .fetch_legacy_collection(&resource, &entity_type, Some(&cancel))
                .await
                .map_err(explain)?;
            Ok(records_json(records))
        }
        Command::CustomerInvoices { customer_id } => {
            Ok(records_json(client.invoices_for_customer(&customer_id).await.map_err(explain)?))
        }
        Command::CustomerPurchases { customer_id } => {
            let purchases = client.purchases_for_customer(&customer_id).await.map_err(explain)?;
            lookup_json(purchases.map(records_json))
        }
        Command::Authorize { .. } | Command::Exchange { .. } => {
            Err(anyhow!("handshake commands do not need a connected client"))
        }
    }
}

fn handshake_client(config: &ClientConfig, callback: Option<String>) -> Result<OAuth1Client> {
    if !config.credentials.has_consumer() {
        bail!("the handshake needs consumer_key and consumer_secret");
    }
    let callback = callback
        .or_else(|| config.callback_url.clone())
        .unwrap_or_else(|| "oob".to_string());
    Ok(OAuth1Client::new(
        HttpClient::new()?,
        &config.credentials.consumer_key,
        &config.credentials.consumer_secret,
        callback,
    ))
}

async fn authorize(config: &ClientConfig, callback: Option<String>) -> Result<Value> {
    let client = handshake_client(config, callback)?;
    let token = client.request_token().await.context("request token call failed")?;
    let url = client.authorize_url(&token);
    info!(%url, "open the authorization URL and approve access");
    Ok(json!({
        "authorize_url": url,
        "request_token": token.token,
        "request_token_secret": token.secret,
    }))
}

async fn exchange(
    config: &ClientConfig,
    token: &RequestToken,
    verifier: &str,
    realm_id: Option<String>,
) -> Result<Value> {
    let client = handshake_client(config, None)?;
    let access = client.access_token(token, verifier).await.context("access token call failed")?;
    let realm_id = realm_id.unwrap_or_else(|| config.credentials.realm_id.clone());
    let credentials = client.credentials(access, realm_id);
    Ok(json!({
        "access_token": credentials.access_token,
        "access_token_secret": credentials.access_token_secret,
        "realm_id": credentials.realm_id,
    }))
}

/// Translate the filter flags into a query filter.
pub fn build_filter(args: &FilterArgs) -> Result<Option<QueryFilter>> {
    if let Some(raw) = &args.raw {
        return Ok(Some(QueryFilter::Raw(raw.clone())));
    }
    if let Some(tail) = &args.tail {
        return Ok(Some(QueryFilter::Tail(tail.clone())));
    }
    if args.conditions.is_empty() {
        return Ok(None);
    }
    let criteria = args
        .conditions
        .iter()
        .map(|condition| Criterion::parse(condition))
        .collect::<ledgerlink_domain::Result<Vec<_>>>()?;
    Ok(Some(QueryFilter::Params(criteria)))
}

/// `key=value` report parameter.
pub fn parse_param(param: &str) -> Result<(String, String)> {
    let (key, value) = param
        .split_once('=')
        .ok_or_else(|| anyhow!("report parameter must look like key=value: {param}"))?;
    if key.trim().is_empty() {
        bail!("report parameter has an empty key: {param}");
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// JSON object given inline or as `@path`.
pub fn parse_record(data: &str) -> Result<EntityRecord> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read record file {path}"))?,
        None => data.to_string(),
    };
    match serde_json::from_str::<Value>(&text).context("record is not valid JSON")? {
        Value::Object(record) => Ok(record),
        other => bail!("record must be a JSON object, got {other}"),
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current page");
            trigger.cancel();
        }
    });
    token
}

fn records_json(records: Vec<EntityRecord>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

fn collections_json(collections: std::collections::BTreeMap<String, EntityCollection>) -> Value {
    let map: Map<String, Value> = collections
        .into_iter()
        .map(|(entity_type, collection)| {
            let records = collection.into_records().into_values().collect();
            (entity_type, records_json(records))
        })
        .collect();
    Value::Object(map)
}

fn lookup_json<T: Into<Value>>(lookup: Lookup<T>) -> Result<Value> {
    match lookup {
        Lookup::Found(value) => Ok(value.into()),
        Lookup::NotFound { detail } => Err(anyhow!("record not found: {detail}")),
    }
}

/// Attach the service diagnostic and any partial progress to an error.
fn explain(error: LedgerError) -> anyhow::Error {
    let partial = error.partial_records().len();
    let diagnostic = error.diagnostic().map(Value::to_string);
    let mut report = anyhow::Error::new(error);
    if let Some(diagnostic) = diagnostic {
        report = report.context(format!("last service response: {diagnostic}"));
    }
    if partial > 0 {
        report = report.context(format!("{partial} records were retrieved before the failure"));
    }
    report
}
