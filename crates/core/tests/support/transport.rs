use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ledgerlink_core::{
    Endpoints, ExecutorSettings, LedgerService, RawResponse, RequestExecutor, ServiceRequest,
    SessionFactory, TransportSession, XmlDecoder,
};
use ledgerlink_domain::{EntityRecord, LedgerError, Result as DomainResult};
use serde_json::{json, Value};

pub const REALM: &str = "4620816365";
pub const BASE_URL: &str = "https://ledger.test/v3";
pub const LEGACY_URL: &str = "https://legacy.test/qbo1";

type Handler = Box<dyn Fn(&ServiceRequest) -> DomainResult<RawResponse> + Send + Sync>;

/// In-memory `TransportSession` driven by a handler closure.
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<ServiceRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&ServiceRequest) -> DomainResult<RawResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self { handler: Box::new(handler), requests: Mutex::new(Vec::new()) })
    }

    /// Replays `responses` in order, repeating the last one once exhausted.
    pub fn sequence(responses: Vec<DomainResult<RawResponse>>) -> Arc<Self> {
        let last = responses.last().cloned().unwrap_or_else(|| Ok(RawResponse::new(200, "{}")));
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| queue.lock().unwrap().pop_front().unwrap_or_else(|| last.clone()))
    }

    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Text bodies (query statements) of every request so far.
    pub fn statements(&self) -> Vec<String> {
        self.requests().iter().filter_map(|r| r.text_body().map(str::to_string)).collect()
    }
}

#[async_trait]
impl TransportSession for ScriptedTransport {
    async fn send(&self, request: &ServiceRequest) -> DomainResult<RawResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

/// Session factory handing out one shared scripted transport.
pub struct ScriptedFactory {
    transport: Arc<ScriptedTransport>,
    created: AtomicUsize,
    failure: Option<LedgerError>,
}

impl ScriptedFactory {
    pub fn new(transport: Arc<ScriptedTransport>) -> Arc<Self> {
        Arc::new(Self { transport, created: AtomicUsize::new(0), failure: None })
    }

    pub fn failing(transport: Arc<ScriptedTransport>, failure: LedgerError) -> Arc<Self> {
        Arc::new(Self { transport, created: AtomicUsize::new(0), failure: Some(failure) })
    }

    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn create_session(&self) -> DomainResult<Arc<dyn TransportSession>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(Arc::clone(&self.transport) as Arc<dyn TransportSession>)
    }
}

/// Legacy documents in these tests are written as JSON.
pub struct JsonDocumentDecoder;

impl XmlDecoder for JsonDocumentDecoder {
    fn decode(&self, document: &str) -> DomainResult<Value> {
        serde_json::from_str(document).map_err(|e| LedgerError::InvalidInput(e.to_string()))
    }
}

pub fn settings(max_attempts: u32, backoff_ms: u64) -> ExecutorSettings {
    ExecutorSettings {
        max_attempts,
        backoff: Duration::from_millis(backoff_ms),
        ..ExecutorSettings::default()
    }
}

pub fn executor_with(
    factory: Arc<ScriptedFactory>,
    settings: ExecutorSettings,
) -> Arc<RequestExecutor> {
    Arc::new(
        RequestExecutor::new(factory, Arc::new(JsonDocumentDecoder), settings)
            .expect("valid executor settings"),
    )
}

/// Executor with the production attempt ceiling and no pause.
pub fn executor(transport: &Arc<ScriptedTransport>) -> Arc<RequestExecutor> {
    executor_with(ScriptedFactory::new(Arc::clone(transport)), settings(10, 0))
}

pub fn service(transport: &Arc<ScriptedTransport>) -> LedgerService {
    LedgerService::new(executor(transport), Endpoints::new(BASE_URL, LEGACY_URL, REALM))
}

pub fn ok(value: Value) -> DomainResult<RawResponse> {
    Ok(RawResponse::new(200, value.to_string()))
}

pub fn fault(fault_type: &str) -> DomainResult<RawResponse> {
    Ok(RawResponse::new(
        400,
        json!({"Fault": {"Error": [{"Message": "fault", "code": "0"}], "type": fault_type}})
            .to_string(),
    ))
}

pub fn record(value: Value) -> EntityRecord {
    value.as_object().cloned().expect("record literal must be an object")
}

/// Records with sequential identifiers `first..first + count`.
pub fn numbered(first: usize, count: usize) -> Vec<Value> {
    (first..first + count).map(|n| json!({"Id": n.to_string(), "Name": format!("row {n}")})).collect()
}

/// A query-response page for `entity_type`.
pub fn query_page(entity_type: &str, rows: Vec<Value>, total_count: Option<u64>) -> Value {
    let mut section = serde_json::Map::new();
    section.insert(entity_type.to_string(), Value::Array(rows));
    if let Some(total) = total_count {
        section.insert("totalCount".to_string(), json!(total));
    }
    json!({"QueryResponse": section, "time": "2024-03-01T10:00:00.000-08:00"})
}
