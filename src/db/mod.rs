//! Warehouse abstraction layer for Snowpane.
//!
//! Provides a trait-based interface for warehouse sessions so the query
//! runner can be driven by the real Snowflake client or by the in-memory
//! mock used in tests and demos.

mod mock;
mod snowflake;
mod types;

pub use mock::{MockConnector, MockWarehouseClient};
pub use snowflake::{SnowflakeClient, SnowflakeConnector};
pub use types::{ColumnInfo, QueryResult, Record, Row, Value};

use crate::config::WarehouseConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The (role, warehouse, database, schema) a session was opened against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTarget {
    pub role: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

impl SessionTarget {
    /// Returns the target requested by the configuration.
    pub fn from_config(config: &WarehouseConfig) -> Self {
        Self {
            role: config.role.clone(),
            warehouse: config.warehouse.clone(),
            database: config.database.clone(),
            schema: config.schema.clone(),
        }
    }
}

/// Opens warehouse sessions.
///
/// The session manager holds one of these and calls it whenever it needs a
/// fresh session, which is what lets tests substitute a scripted warehouse.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticates and returns a live session.
    async fn connect(&self, config: &WarehouseConfig) -> Result<Box<dyn WarehouseClient>>;
}

/// Trait defining the interface for an authenticated warehouse session.
///
/// All operations are async and return Results with SnowpaneError.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Executes a SQL statement and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Returns the context this session was opened against.
    fn target(&self) -> &SessionTarget;

    /// Closes the session on the warehouse side.
    async fn close(&self) -> Result<()>;
}
