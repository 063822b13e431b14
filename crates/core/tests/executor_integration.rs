//! Retry behaviour of the request executor against a scripted transport.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ledgerlink_core::{ResponseFormat, ServiceRequest};
use ledgerlink_domain::LedgerError;
use serde_json::json;
use support::*;

fn read_request() -> ServiceRequest {
    ServiceRequest::get(format!("{BASE_URL}/company/{REALM}/customer/1"), REALM)
        .header("Accept", "application/json")
}

#[tokio::test]
async fn transient_faults_are_retried_up_to_the_ceiling() {
    let transport = ScriptedTransport::sequence(vec![fault("SystemFault")]);
    let executor = executor(&transport);

    let err = executor.execute(&read_request(), ResponseFormat::Json).await.unwrap_err();

    assert_eq!(transport.request_count(), 10);
    match err {
        LedgerError::RetriesExhausted { attempts, detail } => {
            assert_eq!(attempts, 10);
            assert_eq!(detail["Fault"]["type"], "SystemFault");
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn validation_fault_stops_after_one_attempt() {
    let transport = ScriptedTransport::sequence(vec![fault("ValidationFault")]);
    let executor = executor(&transport);

    let err = executor.execute(&read_request(), ResponseFormat::Json).await.unwrap_err();

    assert_eq!(transport.request_count(), 1);
    assert!(err.is_validation());
    assert_eq!(err.diagnostic().unwrap()["Fault"]["type"], "ValidationFault");
}

#[tokio::test]
async fn authentication_fault_is_retried_and_recovers() {
    let transport = ScriptedTransport::sequence(vec![
        fault("AUTHENTICATION"),
        ok(json!({"Customer": {"Id": "1"}})),
    ]);
    let executor = executor(&transport);

    let payload = executor.execute(&read_request(), ResponseFormat::Json).await.unwrap();

    assert_eq!(payload["Customer"]["Id"], "1");
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn unparseable_body_counts_as_transient() {
    let transport = ScriptedTransport::sequence(vec![
        Ok(ledgerlink_core::RawResponse::new(502, "<html>Bad Gateway</html>")),
        Err(LedgerError::Network("connection reset".into())),
        ok(json!({"Customer": {"Id": "1"}})),
    ]);
    let executor = executor(&transport);

    executor.execute(&read_request(), ResponseFormat::Json).await.unwrap();
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn gateway_error_with_json_body_is_retried() {
    let transport = ScriptedTransport::sequence(vec![
        Ok(ledgerlink_core::RawResponse::new(503, r#"{"message":"Service Unavailable"}"#)),
        ok(query_page("Invoice", numbered(1, 3), Some(3))),
    ]);
    let driver = ledgerlink_core::PagedQueryDriver::new(executor(&transport));
    let dialect =
        ledgerlink_core::QueryDialect::new(BASE_URL, REALM, "Invoice", "SELECT * FROM Invoice");

    let records = driver.fetch_all(&dialect, None).await.unwrap();

    assert_eq!(transport.request_count(), 2);
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn exhausted_network_failures_keep_the_last_diagnostic() {
    let transport =
        ScriptedTransport::sequence(vec![Err(LedgerError::Network("connection refused".into()))]);
    let executor = executor_with(ScriptedFactory::new(Arc::clone(&transport)), settings(3, 0));

    let err = executor.execute(&read_request(), ResponseFormat::Json).await.unwrap_err();

    assert_eq!(transport.request_count(), 3);
    let detail = err.diagnostic().unwrap().as_str().unwrap().to_string();
    assert!(detail.contains("connection refused"), "{detail}");
}

#[tokio::test]
async fn backoff_pauses_between_attempts() {
    let transport = ScriptedTransport::sequence(vec![fault("SystemFault")]);
    let executor = executor_with(ScriptedFactory::new(Arc::clone(&transport)), settings(3, 20));

    let started = Instant::now();
    let _ = executor.execute(&read_request(), ResponseFormat::Json).await;

    assert_eq!(transport.request_count(), 3);
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn session_is_established_once_and_reused() {
    let transport = ScriptedTransport::sequence(vec![ok(json!({"Customer": {"Id": "1"}}))]);
    let factory = ScriptedFactory::new(Arc::clone(&transport));
    let executor = executor_with(Arc::clone(&factory), settings(10, 0));

    assert_eq!(factory.sessions_created(), 0);
    for _ in 0..3 {
        executor.execute(&read_request(), ResponseFormat::Json).await.unwrap();
    }
    assert_eq!(factory.sessions_created(), 1);
}

#[tokio::test]
async fn session_failure_is_not_retried() {
    let transport = ScriptedTransport::sequence(vec![ok(json!({}))]);
    let factory = ScriptedFactory::failing(
        Arc::clone(&transport),
        LedgerError::Config("missing credentials: consumer_key".into()),
    );
    let executor = executor_with(Arc::clone(&factory), settings(10, 0));

    let err = executor.execute(&read_request(), ResponseFormat::Json).await.unwrap_err();

    assert!(matches!(err, LedgerError::Config(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn file_link_body_is_returned_verbatim() {
    let transport = ScriptedTransport::sequence(vec![Ok(ledgerlink_core::RawResponse::new(
        200,
        "https://files.test/attachment/123?sig=abc\n",
    ))]);
    let executor = executor(&transport);
    let request = ServiceRequest::get(format!("{BASE_URL}/company/{REALM}/download/123"), REALM);

    let link = executor.execute(&request, ResponseFormat::FileLink).await.unwrap();
    assert_eq!(link, json!("https://files.test/attachment/123?sig=abc"));
}
