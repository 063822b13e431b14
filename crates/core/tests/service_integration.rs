//! CRUD facade and entity cache behaviour.

mod support;

use ledgerlink_core::{HttpMethod, RawResponse, ServiceRequest};
use ledgerlink_domain::{LedgerError, Lookup, QueryFilter};
use serde_json::{json, Value};
use support::*;

fn not_found() -> ledgerlink_domain::Result<RawResponse> {
    Ok(RawResponse::new(
        400,
        json!({"Fault": {
            "Error": [{"Message": "Object Not Found", "Detail": "Object Not Found : Something you're trying to use has been made inactive. Check the fields with accounts, customers, items, vendors or employees.", "code": "610"}],
            "type": "ValidationFault"
        }})
        .to_string(),
    ))
}

/// A small in-memory ledger for vendors.
fn vendor_ledger(request: &ServiceRequest) -> ledgerlink_domain::Result<RawResponse> {
    let entity_url = format!("{BASE_URL}/company/{REALM}/vendor");
    match (request.method, request.url.as_str()) {
        (HttpMethod::Post, url) if url.ends_with("/query") => {
            ok(query_page("Vendor", vec![json!({"Id": "1", "DisplayName": "Stationers"})], Some(1)))
        }
        (HttpMethod::Post, url) if url == entity_url => {
            let mut body: Value = serde_json::from_str(request.text_body().unwrap()).unwrap();
            if body.get("Id").is_none() {
                body["Id"] = json!("77");
            }
            body["SyncToken"] = json!("0");
            ok(json!({ "Vendor": body }))
        }
        (HttpMethod::Get, url) if url == format!("{entity_url}/1") => {
            ok(json!({"Vendor": {"Id": "1", "DisplayName": "Stationers", "SyncToken": "3"}}))
        }
        _ => not_found(),
    }
}

#[tokio::test]
async fn create_upserts_into_cached_collection_without_requery() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);

    let vendors = service.get("Vendor", false, None).await.unwrap();
    assert_eq!(vendors.len(), 1);

    let created = service
        .create("Vendor", record(json!({"DisplayName": "Paper Supply"})))
        .await
        .unwrap();
    assert_eq!(created["Id"], "77");
    let requests_so_far = transport.request_count();

    let vendors = service.get("Vendor", false, None).await.unwrap();
    assert_eq!(transport.request_count(), requests_so_far);
    assert_eq!(vendors.len(), 2);
    assert_eq!(vendors.get("77").unwrap()["DisplayName"], "Paper Supply");
}

#[tokio::test]
async fn create_before_any_get_starts_a_single_entry_collection() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);

    service.create("Vendor", record(json!({"DisplayName": "Paper Supply"}))).await.unwrap();

    let cached = service.cache().cached("Vendor").await.unwrap();
    assert_eq!(cached.ids().collect::<Vec<_>>(), vec!["77"]);
}

#[tokio::test]
async fn delete_removes_record_and_missing_record_reads_as_not_found() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);
    service.get("Vendor", false, None).await.unwrap();

    let deleted = service.delete("Vendor", "1").await.unwrap();
    assert!(deleted.is_found());
    assert!(!service.cache().cached("Vendor").await.unwrap().contains("1"));

    let delete_request = transport
        .requests()
        .into_iter()
        .find(|r| r.query.iter().any(|(k, v)| k == "operation" && v == "delete"))
        .expect("delete submitted");
    assert_eq!(delete_request.method, HttpMethod::Post);
    let submitted: Value = serde_json::from_str(delete_request.text_body().unwrap()).unwrap();
    assert_eq!(submitted["SyncToken"], "3");

    match service.read("Vendor", "404").await.unwrap() {
        Lookup::NotFound { detail } => assert_eq!(detail["Fault"]["Error"][0]["code"], "610"),
        Lookup::Found(record) => panic!("unexpected record {record:?}"),
    }
    assert!(!service.delete("Vendor", "404").await.unwrap().is_found());
}

#[tokio::test]
async fn update_merges_changes_over_the_current_record() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);

    let updated = service
        .update("Vendor", "1", record(json!({"DisplayName": "Stationers Ltd"})))
        .await
        .unwrap()
        .found()
        .unwrap();

    assert_eq!(updated["DisplayName"], "Stationers Ltd");
    let submitted: Value =
        serde_json::from_str(transport.requests().last().unwrap().text_body().unwrap()).unwrap();
    assert_eq!(submitted["SyncToken"], "3");
    assert_eq!(submitted["Id"], "1");
    assert_eq!(
        service.cache().cached("Vendor").await.unwrap().get("1").unwrap()["DisplayName"],
        "Stationers Ltd"
    );
}

#[tokio::test]
async fn unknown_entity_type_fails_without_network() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);

    let err = service.get("Spaceship", false, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::Config(_)));
    let err = service.create("Spaceship", record(json!({"Name": "x"}))).await.unwrap_err();
    assert!(matches!(err, LedgerError::Config(_)));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn name_lists_include_inactive_records_by_default() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);

    service.get("Vendor", false, None).await.unwrap();

    assert_eq!(
        transport.statements(),
        vec!["SELECT * FROM Vendor WHERE Active IN (true,false) MAXRESULTS 500"]
    );
}

#[tokio::test]
async fn explicit_filter_replaces_the_default_and_refresh_requeries() {
    let transport = ScriptedTransport::new(vendor_ledger);
    let service = service(&transport);

    service.get("Vendor", false, None).await.unwrap();
    service
        .get("Vendor", true, Some(QueryFilter::Tail("WHERE DisplayName LIKE 'S%'".into())))
        .await
        .unwrap();

    assert_eq!(transport.request_count(), 2);
    assert_eq!(
        transport.statements()[1],
        "SELECT * FROM Vendor WHERE DisplayName LIKE 'S%' MAXRESULTS 500"
    );
}

#[tokio::test]
async fn shared_filter_is_not_applied_to_time_activity() {
    let transport = ScriptedTransport::new(|request| {
        let statement = request.text_body().unwrap_or_default().to_string();
        let entity = statement.split_whitespace().nth(3).unwrap_or_default().to_string();
        ok(query_page(&entity, vec![], None))
    });
    let service = service(&transport);
    let tail = QueryFilter::Tail("WHERE MetaData.LastUpdatedTime > '2024-01-01'".into());

    let collections = service
        .collections(&["Bill".to_string(), "TimeActivity".to_string()], false, Some(&tail))
        .await
        .unwrap();

    assert_eq!(collections.len(), 2);
    assert_eq!(
        transport.statements(),
        vec![
            "SELECT * FROM Bill WHERE MetaData.LastUpdatedTime > '2024-01-01' MAXRESULTS 500",
            "SELECT * FROM TimeActivity MAXRESULTS 500",
        ]
    );
}

#[tokio::test]
async fn purchases_are_filtered_by_line_customer() {
    let transport = ScriptedTransport::new(|request| {
        if request.method == HttpMethod::Get {
            return ok(json!({"Customer": {
                "Id": "58",
                "MetaData": {"CreateTime": "2023-06-01T09:00:00-07:00"}
            }}));
        }
        let line = |customer: &str| {
            json!({"DetailType": "AccountBasedExpenseLineDetail",
                   "AccountBasedExpenseLineDetail": {"CustomerRef": {"value": customer}}})
        };
        ok(query_page(
            "Purchase",
            vec![
                json!({"Id": "1", "Line": [line("58"), line("58")]}),
                json!({"Id": "2", "Line": [line("12")]}),
                json!({"Id": "3", "Line": [line("12"), line("58")]}),
            ],
            Some(3),
        ))
    });
    let service = service(&transport);

    let purchases = service.purchases_for_customer("58").await.unwrap().found().unwrap();

    let ids: Vec<&Value> = purchases.iter().map(|p| &p["Id"]).collect();
    assert_eq!(ids, vec![&json!("1"), &json!("3")]);
    assert_eq!(
        transport.statements(),
        vec!["SELECT * FROM Purchase WHERE MetaData.CreateTime > '2023-06-01T09:00:00-07:00' MAXRESULTS 500"]
    );
}

#[tokio::test]
async fn report_and_download_link_pass_through() {
    let transport = ScriptedTransport::new(|request| {
        if request.url.contains("/download/") {
            Ok(RawResponse::new(200, "https://files.test/a/9?token=t"))
        } else {
            ok(json!({"Header": {"ReportName": "ProfitAndLoss"}, "Rows": {}}))
        }
    });
    let service = service(&transport);

    let params = vec![("start_date".to_string(), "2024-01-01".to_string())];
    let report = service.report("ProfitAndLoss", &params).await.unwrap();
    assert_eq!(report["Header"]["ReportName"], "ProfitAndLoss");

    let link = service.download_link("9").await.unwrap();
    assert_eq!(link, "https://files.test/a/9?token=t");

    let requests = transport.requests();
    assert_eq!(requests[0].url, format!("{BASE_URL}/company/{REALM}/reports/ProfitAndLoss"));
    assert_eq!(requests[0].query, params);
    assert_eq!(requests[1].header_value("Accept"), None);
}
