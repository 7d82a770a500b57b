//! End-to-end tests against a local stub of the Snowflake REST endpoints.

use super::common::{runner_with, warehouse_config};
use pretty_assertions::assert_eq;
use serde_json::json;
use snowpane::config::WarehouseConfig;
use snowpane::db::{SnowflakeConnector, Value};
use snowpane::query::{read_context, QueryRequest};
use snowpane::smoke;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/session/v1/login-request";
const QUERY_PATH: &str = "/queries/v1/query-request";

fn stub_config(server: &MockServer) -> WarehouseConfig {
    WarehouseConfig {
        host: Some(server.uri()),
        ..warehouse_config()
    }
}

fn login_response(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "code": null,
        "message": null,
        "data": {
            "token": token,
            "sessionInfo": {
                "databaseName": "TASTY_BYTES",
                "schemaName": "RAW_POS",
                "warehouseName": "COMPUTE_WH",
                "roleName": "ANALYST"
            }
        }
    }))
}

fn bearer(token: &str) -> String {
    format!("Snowflake Token=\"{token}\"")
}

fn rows_response(names: &[&str], rows: serde_json::Value) -> ResponseTemplate {
    let rowtype: Vec<_> = names
        .iter()
        .map(|n| json!({ "name": n, "type": "text" }))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "code": null,
        "message": null,
        "data": {
            "rowtype": rowtype,
            "rowset": rows,
            "queryResultFormat": "json"
        }
    }))
}

fn expired_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": false,
        "code": "390114",
        "message": "Authentication token has expired.  The user must authenticate again.",
        "data": null
    }))
}

/// First login hands out `first-token`, every later one `second-token`.
async fn mount_logins(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_response("first-token"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_response("second-token"))
        .with_priority(2)
        .mount(server)
        .await;
}

async fn mount_close(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(query_param("delete", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_expired_token_reconnects_and_retries() {
    let server = MockServer::start().await;
    mount_logins(&server).await;
    mount_close(&server).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(header("authorization", bearer("first-token").as_str()))
        .respond_with(expired_response())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(header("authorization", bearer("second-token").as_str()))
        .respond_with(rows_response(
            &["TRUCK_BRAND_NAME", "ITEM_COUNT"],
            json!([["Freezing Point", "17"]]),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let runner = runner_with(Arc::new(SnowflakeConnector::new()), stub_config(&server));

    let outcome = runner
        .run(&QueryRequest::new("SELECT * FROM menu", true))
        .await
        .unwrap();

    assert!(outcome.reconnected);
    assert_eq!(
        outcome.result.rows,
        vec![vec![Value::from("Freezing Point"), Value::from("17")]]
    );

    let requests = server.received_requests().await.unwrap();
    let logins = requests
        .iter()
        .filter(|r| r.url.path() == LOGIN_PATH)
        .count();
    assert_eq!(logins, 2);

    let query_bodies: Vec<serde_json::Value> = requests
        .iter()
        .filter(|r| r.url.path() == QUERY_PATH)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(query_bodies.len(), 2);
    for body in &query_bodies {
        assert_eq!(body["sqlText"], "SELECT * FROM menu\nLIMIT 200;");
    }
}

#[tokio::test]
async fn test_expired_twice_surfaces_error() {
    let server = MockServer::start().await;
    mount_logins(&server).await;
    mount_close(&server).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(expired_response())
        .expect(2)
        .mount(&server)
        .await;

    let runner = runner_with(Arc::new(SnowflakeConnector::new()), stub_config(&server));

    let err = runner
        .run(&QueryRequest::new("SELECT 1", false))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(390114));
    assert!(err.to_string().contains("Authentication token has expired"));
}

#[tokio::test]
async fn test_context_over_http() {
    let server = MockServer::start().await;
    mount_logins(&server).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(rows_response(
            &["ROLE", "WAREHOUSE", "DATABASE", "SCHEMA"],
            json!([["ANALYST", "COMPUTE_WH", null, "RAW_POS"]]),
        ))
        .mount(&server)
        .await;

    let runner = runner_with(Arc::new(SnowflakeConnector::new()), stub_config(&server));
    let context = read_context(&runner).await.unwrap();

    assert_eq!(context.role(), "ANALYST");
    assert_eq!(context.database(), "unavailable");
    assert_eq!(context.schema(), "RAW_POS");
}

#[tokio::test]
async fn test_smoke_over_http() {
    let server = MockServer::start().await;
    mount_logins(&server).await;
    mount_close(&server).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(rows_response(
            &[
                "CURRENT_VERSION()",
                "CURRENT_USER()",
                "CURRENT_ROLE()",
                "CURRENT_WAREHOUSE()",
            ],
            json!([["8.40.1", "DEMO_USER", "ANALYST", "COMPUTE_WH"]]),
        ))
        .mount(&server)
        .await;

    let line = smoke::run(&SnowflakeConnector::new(), &stub_config(&server))
        .await
        .unwrap();

    assert_eq!(line, "('8.40.1', 'DEMO_USER', 'ANALYST', 'COMPUTE_WH')");
}
