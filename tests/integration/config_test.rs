//! Settings and credentials integration tests.

use super::common::warehouse_config;
use snowpane::config::{Config, WarehouseConfig, REQUIRED_ENV_VARS};
use snowpane::connection::SessionManager;
use snowpane::db::{MockConnector, QueryResult};
use snowpane::error::{QueryFailure, SnowpaneError};
use snowpane::query::{QueryRequest, QueryRunner};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn settings_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_credentials_reported_together() {
    let env: HashMap<&str, &str> = [
        ("SNOWFLAKE_ACCOUNT", "xy12345"),
        ("SNOWFLAKE_USER", "DEMO_USER"),
        ("SNOWFLAKE_WAREHOUSE", "COMPUTE_WH"),
        ("SNOWFLAKE_DATABASE", "TASTY_BYTES"),
        ("SNOWFLAKE_SCHEMA", ""),
    ]
    .into_iter()
    .collect();

    let err = WarehouseConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
        .unwrap_err();

    assert_eq!(err.category(), "Configuration Error");
    let message = err.to_string();
    assert!(message.contains("SNOWFLAKE_PASSWORD"));
    assert!(message.contains("SNOWFLAKE_SCHEMA"));
    assert!(message.contains("SNOWFLAKE_ROLE"));
    assert!(!message.contains("SNOWFLAKE_ACCOUNT"));
}

#[test]
fn test_all_credentials_present() {
    let config = WarehouseConfig::from_lookup(|key| {
        REQUIRED_ENV_VARS
            .contains(&key)
            .then(|| format!("{}_VALUE", key.trim_start_matches("SNOWFLAKE_")))
    })
    .unwrap();

    assert_eq!(config.role, "ROLE_VALUE");
    assert_eq!(config.warehouse, "WAREHOUSE_VALUE");
    assert_eq!(config.host, None);
}

#[tokio::test]
async fn test_settings_file_drives_row_cap() {
    let file = settings_file("[query]\nrow_limit = 25\n");
    let settings = Config::load_from_file(file.path()).unwrap();

    let connector = MockConnector::new();
    let sessions = Arc::new(SessionManager::new(
        Arc::new(connector.clone()),
        warehouse_config(),
    ));
    let runner = QueryRunner::from_config(sessions, &settings);

    let outcome = runner
        .run(&QueryRequest::new("SELECT * FROM menu", true))
        .await
        .unwrap();

    assert_eq!(outcome.sql, "SELECT * FROM menu\nLIMIT 25;");
}

#[tokio::test]
async fn test_settings_file_drives_expired_codes() {
    let file = settings_file("[session]\nexpired_codes = [390112]\n");
    let settings = Config::load_from_file(file.path()).unwrap();

    let expired = |code| SnowpaneError::Query(QueryFailure::new("expired").with_code(code));
    let connector = MockConnector::with_script(vec![
        Err(expired(390112)),
        Ok(QueryResult::new()),
        Err(expired(390114)),
    ]);
    let sessions = Arc::new(SessionManager::new(
        Arc::new(connector.clone()),
        warehouse_config(),
    ));
    let runner = QueryRunner::from_config(sessions, &settings);

    let recovered = runner
        .run(&QueryRequest::new("SELECT 1", false))
        .await
        .unwrap();
    assert!(recovered.reconnected);

    // 390114 is not in the configured list any more.
    let err = runner
        .run(&QueryRequest::new("SELECT 1", false))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(390114));
    assert_eq!(connector.connect_count(), 2);
}
