//! Mock warehouse for testing and demos.
//!
//! The connector hands out sessions that share one script of responses, so
//! a test can line up "expired, then success" across a reconnect and then
//! inspect how many sessions were opened and which statements ran. When the
//! script runs dry the sessions answer with built-in demo data.

use super::{ColumnInfo, Connector, QueryResult, SessionTarget, Value, WarehouseClient};
use crate::config::WarehouseConfig;
use crate::error::{Result, SnowpaneError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Food truck brands and their menu item counts used by the demo data.
const DEMO_MENU: [(&str, i64); 6] = [
    ("Freezing Point", 17),
    ("Kitakata Ramen Bar", 14),
    ("Plant Palace", 12),
    ("Smoky BBQ", 11),
    ("Guac n' Roll", 9),
    ("Tasty Tibs", 7),
];

#[derive(Default)]
struct MockState {
    script: VecDeque<Result<QueryResult>>,
    connect_failures: VecDeque<SnowpaneError>,
    connects: usize,
    closes: usize,
    executed: Vec<(usize, String)>,
}

/// A connector that opens in-memory sessions.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a connector whose sessions answer with demo data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector whose sessions answer with `responses` in order,
    /// then fall back to demo data.
    pub fn with_script(responses: impl IntoIterator<Item = Result<QueryResult>>) -> Self {
        let connector = Self::new();
        connector.state().script.extend(responses);
        connector
    }

    /// Makes the next connection attempt fail with `error`.
    pub fn fail_next_connect(&self, error: SnowpaneError) {
        self.state().connect_failures.push_back(error);
    }

    /// Number of successful connection attempts.
    pub fn connect_count(&self) -> usize {
        self.state().connects
    }

    /// Number of sessions closed.
    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    /// Statements executed so far, in order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.state()
            .executed
            .iter()
            .map(|(_, sql)| sql.clone())
            .collect()
    }

    /// Session number (1-based) each executed statement ran on.
    pub fn executed_sessions(&self) -> Vec<usize> {
        self.state().executed.iter().map(|(id, _)| *id).collect()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &WarehouseConfig) -> Result<Box<dyn WarehouseClient>> {
        let mut state = self.state();
        if let Some(error) = state.connect_failures.pop_front() {
            return Err(error);
        }
        state.connects += 1;

        Ok(Box::new(MockWarehouseClient {
            session: state.connects,
            target: SessionTarget::from_config(config),
            state: Arc::clone(&self.state),
        }))
    }
}

/// A session opened by [`MockConnector`].
pub struct MockWarehouseClient {
    session: usize,
    target: SessionTarget,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl WarehouseClient for MockWarehouseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let scripted = {
            let mut state = lock(&self.state);
            state.executed.push((self.session, sql.to_string()));
            state.script.pop_front()
        };

        match scripted {
            Some(response) => response,
            None => Ok(demo_response(sql, &self.target)),
        }
    }

    fn target(&self) -> &SessionTarget {
        &self.target
    }

    async fn close(&self) -> Result<()> {
        lock(&self.state).closes += 1;
        Ok(())
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Builds a plausible answer for the statements the application issues.
fn demo_response(sql: &str, target: &SessionTarget) -> QueryResult {
    let sql_upper = sql.to_uppercase();

    let result = if sql_upper.contains("CURRENT_VERSION()") {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("CURRENT_VERSION()", "text"),
                ColumnInfo::new("CURRENT_USER()", "text"),
                ColumnInfo::new("CURRENT_ROLE()", "text"),
                ColumnInfo::new("CURRENT_WAREHOUSE()", "text"),
            ],
            vec![vec![
                Value::from("8.40.1"),
                Value::from("MOCK_USER"),
                Value::from(target.role.as_str()),
                Value::from(target.warehouse.as_str()),
            ]],
        )
    } else if sql_upper.contains("CURRENT_ROLE()") {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("ROLE", "text"),
                ColumnInfo::new("WAREHOUSE", "text"),
                ColumnInfo::new("DATABASE", "text"),
                ColumnInfo::new("SCHEMA", "text"),
            ],
            vec![vec![
                Value::from(target.role.as_str()),
                Value::from(target.warehouse.as_str()),
                Value::from(target.database.as_str()),
                Value::from(target.schema.as_str()),
            ]],
        )
    } else if sql_upper.contains("TRUCK_BRAND_NAME") {
        QueryResult::with_data(
            vec![
                ColumnInfo::new("TRUCK_BRAND_NAME", "text"),
                ColumnInfo::new("ITEM_COUNT", "fixed"),
            ],
            DEMO_MENU
                .iter()
                .map(|(brand, count)| vec![Value::from(*brand), Value::Int(*count)])
                .collect(),
        )
    } else if sql_upper.trim_start().starts_with("SELECT") {
        QueryResult::with_data(
            vec![ColumnInfo::new("RESULT", "text")],
            vec![vec![Value::String(format!("Mock result for: {}", sql))]],
        )
    } else {
        QueryResult::new()
    };

    result.with_execution_time(Duration::from_millis(1))
}
