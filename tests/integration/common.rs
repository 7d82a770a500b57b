//! Shared helpers for the integration tests.

use snowpane::config::{Config, WarehouseConfig};
use snowpane::connection::SessionManager;
use snowpane::db::{Connector, MockConnector};
use snowpane::query::QueryRunner;
use std::sync::Arc;

pub fn warehouse_config() -> WarehouseConfig {
    WarehouseConfig {
        account: "xy12345.us-east-1".to_string(),
        user: "DEMO_USER".to_string(),
        password: "hunter2".to_string(),
        warehouse: "COMPUTE_WH".to_string(),
        database: "TASTY_BYTES".to_string(),
        schema: "RAW_POS".to_string(),
        role: "ANALYST".to_string(),
        host: None,
    }
}

/// Builds a runner with default settings on top of `connector`.
pub fn runner_with(connector: Arc<dyn Connector>, config: WarehouseConfig) -> QueryRunner {
    let sessions = Arc::new(SessionManager::new(connector, config));
    QueryRunner::from_config(sessions, &Config::default())
}

pub fn mock_runner(connector: &MockConnector) -> QueryRunner {
    runner_with(Arc::new(connector.clone()), warehouse_config())
}
