//! Tests for the resource client

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig, QuotaGovernor};
use crate::streams::Resource;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resource_client(base_url: &str) -> ResourceClient {
    let config = HttpClientConfig::builder()
        .base_url(base_url)
        .basic_auth("key_abc", "")
        .backoff(Duration::from_millis(5), Duration::from_millis(20))
        .build();
    ResourceClient::new(
        HttpClient::with_config(config).unwrap(),
        QuotaGovernor::default(),
        "acme",
    )
}

fn list(records: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "has_more": false,
        "next": null,
        "data": records
    }))
}

#[test]
fn test_site_id() {
    let client = resource_client("http://localhost");
    assert_eq!(client.site_id(), "subdomain-acme");
}

#[test]
fn test_collection_path_escapes_begin_time() {
    let client = resource_client("http://localhost");

    assert_eq!(
        client.collection_path("accounts", "updated_at", Some("2019-01-01T00:00:00+00:00")),
        "sites/subdomain-acme/accounts?limit=200&sort=updated_at&begin_time=2019-01-01T00%3A00%3A00%2B00%3A00&order=asc"
    );
}

#[test]
fn test_collection_path_without_begin_time() {
    let client = resource_client("http://localhost");

    assert_eq!(
        client.collection_path("plans/p1/add_ons", "updated_at", None),
        "sites/subdomain-acme/plans/p1/add_ons?limit=200&sort=updated_at&order=asc"
    );
}

#[test_case(Resource::Accounts, "accounts" ; "accounts")]
#[test_case(Resource::Adjustments, "line_items" ; "adjustments")]
#[test_case(Resource::Coupons, "coupons" ; "coupons")]
#[test_case(Resource::Invoices, "invoices" ; "invoices")]
#[test_case(Resource::Plans, "plans" ; "plans")]
#[test_case(Resource::Subscriptions, "subscriptions" ; "subscriptions")]
#[test_case(Resource::Transactions, "transactions" ; "transactions")]
fn test_root_dispatch(resource: Resource, endpoint: &str) {
    let client = resource_client("http://localhost");
    let pager = client
        .records(resource, "updated_at", "2019-01-01T00:00:00Z")
        .unwrap();

    let printed = format!("{pager:?}");
    assert!(printed.contains(&format!("sites/subdomain-acme/{endpoint}?")));
}

#[test_case(Resource::BillingInfo ; "billing info")]
#[test_case(Resource::CouponRedemptions ; "coupon redemptions")]
#[test_case(Resource::PlanAddOns ; "plan add-ons")]
fn test_nested_resources_not_root(resource: Resource) {
    let client = resource_client("http://localhost");
    let result = client.records(resource, "updated_at", "2019-01-01T00:00:00Z");
    assert!(matches!(result, Err(Error::Config { .. })));
}

#[test]
fn test_nested_rejects_wrong_parent() {
    let client = resource_client("http://localhost");

    assert!(client
        .nested(Resource::BillingInfo, Resource::Plans, "p1", "updated_at")
        .is_err());
    assert!(client
        .coupon_redemptions(Resource::Plans, "p1", "created_at")
        .is_err());
    assert!(client
        .substream(
            Resource::PlanAddOns,
            Resource::Accounts,
            "updated_at",
            "2019-01-01T00:00:00Z"
        )
        .is_err());
}

#[tokio::test]
async fn test_root_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/subdomain-acme/transactions"))
        .and(query_param("limit", "200"))
        .and(query_param("sort", "collected_at"))
        .and(query_param("begin_time", "2019-02-01T00:00:00Z"))
        .and(query_param("order", "asc"))
        .respond_with(list(json!([{"id": "t1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = resource_client(&server.uri());
    let records = client
        .transactions("collected_at", "2019-02-01T00:00:00Z")
        .collect_all()
        .await
        .unwrap();

    assert_eq!(records, vec![json!({"id": "t1"})]);
}

#[tokio::test]
async fn test_billing_info_is_single_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/subdomain-acme/accounts/a1/billing_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "b1",
            "account_id": "a1",
            "updated_at": "2019-02-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = resource_client(&server.uri());
    let records = client
        .billing_info("a1", "updated_at")
        .collect_all()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["account_id"], "a1");
}

#[tokio::test]
async fn test_substream_pairs_parents_with_children() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/subdomain-acme/plans"))
        .and(query_param("begin_time", "2019-01-01T00:00:00Z"))
        .respond_with(list(json!([
            {"id": "p1", "updated_at": "2019-01-05T00:00:00Z"},
            {"code": "no-id"},
            {"id": "p2", "updated_at": "2019-01-06T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites/subdomain-acme/plans/p1/add_ons"))
        .respond_with(list(json!([{"id": "ao1"}, {"id": "ao2"}])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites/subdomain-acme/plans/p2/add_ons"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = resource_client(&server.uri());
    let mut substream = client
        .substream(
            Resource::PlanAddOns,
            Resource::Plans,
            "updated_at",
            "2019-01-01T00:00:00Z",
        )
        .unwrap();
    assert_eq!(substream.parent(), Resource::Plans);

    let mut seen = Vec::new();
    while let Some((parent, children)) = substream.next_parent().await.unwrap() {
        let children = children.collect_all().await.unwrap();
        seen.push((parent["id"].as_str().unwrap().to_string(), children.len()));
    }

    assert_eq!(seen, vec![("p1".to_string(), 2), ("p2".to_string(), 0)]);
}

#[tokio::test]
async fn test_coupon_redemptions_under_invoice() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sites/subdomain-acme/invoices/i1/coupon_redemptions"))
        .and(query_param("sort", "created_at"))
        .respond_with(list(json!([{"id": "r1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = resource_client(&server.uri());
    let records = client
        .coupon_redemptions(Resource::Invoices, "i1", "created_at")
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(records, vec![json!({"id": "r1"})]);
}
