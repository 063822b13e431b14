//! Retrying request executor
//!
//! Every request against the ledger service goes through
//! [`RequestExecutor::execute`]. Each attempt sends the request through the
//! lazily established transport session and normalizes the response; the
//! shared [`RetryExecutor`] then decides, per fault kind, whether to pause
//! and try again.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ledgerlink_common::{RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy};
use ledgerlink_domain::{Fault, FaultKind, LedgerError, Result, RetrySettings};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::normalize::normalize;
use crate::ports::{
    ResponseFormat, ServiceRequest, SessionFactory, TransportSession, XmlDecoder,
};

/// Diagnostic prefix for transport failures folded into transient faults.
const NETWORK_FAULT: &str = "(network)";

/// Retry settings for the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Attempt ceiling, including the first attempt
    pub max_attempts: u32,
    /// Pause before every attempt after the first
    pub backoff: Duration,
    /// Fault kinds that are retried. Validation faults should never be here.
    pub retryable: HashSet<FaultKind>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for ExecutorSettings {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            backoff: Duration::from_millis(settings.backoff_ms),
            retryable: HashSet::from([FaultKind::Authentication, FaultKind::Transient]),
        }
    }
}

/// Failure of a single attempt
#[derive(Debug)]
enum AttemptError {
    /// The service answered with (or implied) a fault
    Fault(Fault),
    /// Something that retrying cannot fix, e.g. missing credentials
    Fatal(LedgerError),
}

/// Retries faults whose kind is in the configured set
#[derive(Debug, Clone)]
struct FaultPolicy {
    retryable: HashSet<FaultKind>,
}

impl RetryPolicy<AttemptError> for FaultPolicy {
    fn should_retry(&self, error: &AttemptError, _attempt: u32) -> RetryDecision {
        match error {
            AttemptError::Fault(fault) if self.retryable.contains(&fault.kind) => {
                RetryDecision::Retry
            }
            _ => RetryDecision::Stop,
        }
    }
}

/// Issues logical requests with retry, backoff and fault interpretation
pub struct RequestExecutor {
    factory: Arc<dyn SessionFactory>,
    session: OnceCell<Arc<dyn TransportSession>>,
    xml: Arc<dyn XmlDecoder>,
    retry: RetryExecutor<FaultPolicy>,
}

impl RequestExecutor {
    /// Create an executor. The session is not established until the first
    /// request.
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        xml: Arc<dyn XmlDecoder>,
        settings: ExecutorSettings,
    ) -> Result<Self> {
        let config = RetryConfig::builder()
            .max_attempts(settings.max_attempts)
            .fixed_backoff(settings.backoff)
            .build()
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        if settings.retryable.contains(&FaultKind::Validation) {
            warn!("validation faults are configured as retryable");
        }

        Ok(Self {
            factory,
            session: OnceCell::new(),
            xml,
            retry: RetryExecutor::new(config, FaultPolicy { retryable: settings.retryable }),
        })
    }

    /// Attempt ceiling in use.
    pub fn max_attempts(&self) -> u32 {
        self.retry.config().max_attempts
    }

    /// The transport session, established on first use.
    ///
    /// Concurrent first callers share a single initialization.
    pub async fn session(&self) -> Result<Arc<dyn TransportSession>> {
        self.session
            .get_or_try_init(|| async {
                debug!("establishing transport session");
                self.factory.create_session().await
            })
            .await
            .cloned()
    }

    /// Issue one logical request and return the normalized success payload.
    ///
    /// Transient and authentication faults are retried up to the attempt
    /// ceiling. A validation fault stops immediately. The final error always
    /// carries the last diagnostic payload.
    pub async fn execute(&self, request: &ServiceRequest, format: ResponseFormat) -> Result<Value> {
        let session = self.session().await?;
        let mut attempt: u32 = 0;

        self.retry
            .execute(|| {
                attempt += 1;
                let session = Arc::clone(&session);
                let current = attempt;
                async move { self.attempt(session.as_ref(), request, format, current).await }
            })
            .await
            .map_err(|error| self.final_error(request, error))
    }

    async fn attempt(
        &self,
        session: &dyn TransportSession,
        request: &ServiceRequest,
        format: ResponseFormat,
        attempt: u32,
    ) -> std::result::Result<Value, AttemptError> {
        if attempt > 1 {
            debug!(attempt, method = request.method.as_str(), url = %request.url, "retrying request");
        }

        let response = match session.send(request).await {
            Ok(response) => response,
            Err(LedgerError::Network(message)) => {
                debug!(attempt, error = %message, "transport failure");
                return Err(AttemptError::Fault(Fault::transient(Value::String(format!(
                    "{NETWORK_FAULT} {message}"
                )))));
            }
            Err(other) => return Err(AttemptError::Fatal(other)),
        };

        normalize(&response, format, self.xml.as_ref()).map_err(|fault| {
            debug!(
                attempt,
                status = response.status,
                fault_kind = %fault.kind,
                "request returned a fault"
            );
            AttemptError::Fault(fault)
        })
    }

    fn final_error(&self, request: &ServiceRequest, error: RetryError<AttemptError>) -> LedgerError {
        let attempts = error.attempts();
        match error {
            RetryError::InvalidConfiguration { message } => LedgerError::Config(message),
            RetryError::AttemptsExhausted { last: AttemptError::Fatal(e), .. }
            | RetryError::NonRetryable { error: AttemptError::Fatal(e), .. } => e,
            RetryError::AttemptsExhausted { last: AttemptError::Fault(fault), .. } => {
                warn!(
                    attempts,
                    url = %request.url,
                    fault_kind = %fault.kind,
                    detail = %fault.detail,
                    "giving up after exhausting retries"
                );
                LedgerError::RetriesExhausted { attempts, detail: fault.detail }
            }
            RetryError::NonRetryable { error: AttemptError::Fault(fault), .. } => {
                warn!(
                    attempts,
                    url = %request.url,
                    fault_kind = %fault.kind,
                    detail = %fault.detail,
                    "request rejected"
                );
                match fault.kind {
                    FaultKind::Validation => LedgerError::Validation { detail: fault.detail },
                    FaultKind::Authentication => LedgerError::Auth(fault.detail.to_string()),
                    FaultKind::Transient => {
                        LedgerError::RetriesExhausted { attempts, detail: fault.detail }
                    }
                }
            }
        }
    }
}
