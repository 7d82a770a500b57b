//! Query runner integration tests.
//!
//! Exercise the row cap, session reuse and expired-session recovery through
//! the public API.

use super::common::mock_runner;
use pretty_assertions::assert_eq;
use snowpane::db::{ColumnInfo, MockConnector, QueryResult, Value};
use snowpane::error::{QueryFailure, SnowpaneError};
use snowpane::query::QueryRequest;

fn expired() -> SnowpaneError {
    SnowpaneError::Query(
        QueryFailure::new("Authentication token has expired.  The user must authenticate again.")
            .with_code(390114),
    )
}

fn single_value(value: i64) -> QueryResult {
    QueryResult::with_data(
        vec![ColumnInfo::new("N", "fixed")],
        vec![vec![Value::Int(value)]],
    )
}

#[tokio::test]
async fn test_capped_query_sends_limit() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    let outcome = runner
        .run(&QueryRequest::new("  SELECT * FROM menu;  ", true))
        .await
        .unwrap();

    assert_eq!(outcome.sql, "SELECT * FROM menu\nLIMIT 200;");
    assert_eq!(connector.executed_sql(), vec!["SELECT * FROM menu\nLIMIT 200;"]);
    assert!(!outcome.reconnected);
}

#[tokio::test]
async fn test_uncapped_query_sent_trimmed() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    runner
        .run(&QueryRequest::new("\nSELECT 1;\n", false))
        .await
        .unwrap();

    assert_eq!(connector.executed_sql(), vec!["SELECT 1;"]);
}

#[tokio::test]
async fn test_existing_limit_left_alone() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    runner
        .run(&QueryRequest::new("select * from menu limit 5", true))
        .await
        .unwrap();

    assert_eq!(connector.executed_sql(), vec!["select * from menu limit 5"]);
}

#[tokio::test]
async fn test_session_reused_across_queries() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    runner.run(&QueryRequest::new("SELECT 1", false)).await.unwrap();
    runner.run(&QueryRequest::new("SELECT 2", false)).await.unwrap();

    assert_eq!(connector.connect_count(), 1);
    assert_eq!(connector.executed_sessions(), vec![1, 1]);
}

#[tokio::test]
async fn test_expired_session_reconnects_and_retries_once() {
    let connector = MockConnector::with_script(vec![Err(expired()), Ok(single_value(42))]);
    let runner = mock_runner(&connector);

    let outcome = runner
        .run(&QueryRequest::new("SELECT 42 AS n", false))
        .await
        .unwrap();

    assert!(outcome.reconnected);
    assert_eq!(outcome.result.rows, vec![vec![Value::Int(42)]]);
    assert_eq!(connector.connect_count(), 2);
    assert_eq!(connector.close_count(), 1);
    assert_eq!(
        connector.executed_sql(),
        vec!["SELECT 42 AS n", "SELECT 42 AS n"]
    );
    assert_eq!(connector.executed_sessions(), vec![1, 2]);
}

#[tokio::test]
async fn test_second_expiry_is_surfaced() {
    let connector = MockConnector::with_script(vec![Err(expired()), Err(expired())]);
    let runner = mock_runner(&connector);

    let err = runner
        .run(&QueryRequest::new("SELECT 1", false))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(390114));
    assert_eq!(connector.executed_sql().len(), 2);
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn test_other_errors_not_retried() {
    let syntax = SnowpaneError::Query(
        QueryFailure::new("SQL compilation error: syntax error line 1 at position 0")
            .with_code(1003)
            .with_sql_state("42000"),
    );
    let connector = MockConnector::with_script(vec![Err(syntax.clone())]);
    let runner = mock_runner(&connector);

    let err = runner
        .run(&QueryRequest::new("SELEC 1", false))
        .await
        .unwrap_err();

    assert_eq!(err, syntax);
    assert_eq!(connector.executed_sql().len(), 1);
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test]
async fn test_session_healthy_after_recovery() {
    let connector = MockConnector::with_script(vec![Err(expired())]);
    let runner = mock_runner(&connector);

    runner.run(&QueryRequest::new("SELECT 1", false)).await.unwrap();
    let outcome = runner.run(&QueryRequest::new("SELECT 2", false)).await.unwrap();

    assert!(!outcome.reconnected);
    assert_eq!(connector.connect_count(), 2);
    assert_eq!(connector.executed_sessions(), vec![1, 2, 2]);
}

#[tokio::test]
async fn test_empty_query_rejected_without_connecting() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    let err = runner
        .run(&QueryRequest::new("   \n ", true))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Query Error");
    assert_eq!(connector.connect_count(), 0);
}
