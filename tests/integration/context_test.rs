//! Session context integration tests.

use super::common::mock_runner;
use pretty_assertions::assert_eq;
use snowpane::db::{ColumnInfo, MockConnector, QueryResult, Value};
use snowpane::error::{QueryFailure, SnowpaneError};
use snowpane::query::{read_context, SessionContext, CONTEXT_SQL};

#[tokio::test]
async fn test_context_from_demo_warehouse() {
    let connector = MockConnector::new();
    let runner = mock_runner(&connector);

    let context = read_context(&runner).await.unwrap();

    assert_eq!(context.role(), "ANALYST");
    assert_eq!(context.warehouse(), "COMPUTE_WH");
    assert_eq!(context.database(), "TASTY_BYTES");
    assert_eq!(context.schema(), "RAW_POS");
    assert_eq!(connector.executed_sql(), vec![CONTEXT_SQL]);
}

#[tokio::test]
async fn test_context_lowercase_keys_and_nulls() {
    let result = QueryResult::with_data(
        vec![
            ColumnInfo::new("role", "text"),
            ColumnInfo::new("warehouse", "text"),
            ColumnInfo::new("database", "text"),
            ColumnInfo::new("schema", "text"),
        ],
        vec![vec![
            Value::from("PUBLIC"),
            Value::Null,
            Value::from("TASTY_BYTES"),
            Value::Null,
        ]],
    );
    let connector = MockConnector::with_script(vec![Ok(result)]);
    let runner = mock_runner(&connector);

    let context = read_context(&runner).await.unwrap();

    assert_eq!(
        context.metrics(),
        [
            ("Role", "PUBLIC"),
            ("Warehouse", "unavailable"),
            ("Database", "TASTY_BYTES"),
            ("Schema", "unavailable"),
        ]
    );
}

#[tokio::test]
async fn test_context_after_expired_session() {
    let expired = SnowpaneError::Query(QueryFailure::new("token expired").with_code(390114));
    let connector = MockConnector::with_script(vec![Err(expired)]);
    let runner = mock_runner(&connector);

    let context = read_context(&runner).await.unwrap();

    assert_eq!(context.role(), "ANALYST");
    assert_eq!(connector.connect_count(), 2);
}

#[tokio::test]
async fn test_context_failure_propagates() {
    let denied = SnowpaneError::Query(
        QueryFailure::new("Insufficient privileges").with_code(3001),
    );
    let connector = MockConnector::with_script(vec![Err(denied.clone())]);
    let runner = mock_runner(&connector);

    let err = read_context(&runner).await.unwrap_err();

    assert_eq!(err, denied);
}

#[test]
fn test_context_no_rows() {
    let context = SessionContext::from_result(&QueryResult::new());
    assert_eq!(context, SessionContext::default());
    assert_eq!(context.role(), "unavailable");
}
