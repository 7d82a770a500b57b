//! Connectivity smoke test.
//!
//! Opens one session with the environment's credentials, asks the warehouse
//! who it is talking to, and closes the session again. Independent of the
//! session manager and the retry policy.

use tracing::{info, warn};

use crate::config::WarehouseConfig;
use crate::db::{Connector, Value};
use crate::error::{Result, SnowpaneError};

/// Statement run by the smoke test.
pub const SMOKE_SQL: &str =
    "SELECT CURRENT_VERSION(), CURRENT_USER(), CURRENT_ROLE(), CURRENT_WAREHOUSE();";

/// Connects, runs [`SMOKE_SQL`] and returns its first row as a tuple string,
/// e.g. `('8.40.1', 'JDOE', 'ANALYST', 'COMPUTE_WH')`.
pub async fn run(connector: &dyn Connector, config: &WarehouseConfig) -> Result<String> {
    info!("Smoke test against {}", config.display_string());
    let client = connector.connect(config).await?;

    let outcome = client.execute_query(SMOKE_SQL).await;

    if let Err(e) = client.close().await {
        warn!("Error closing session: {}", e);
    }

    let result = outcome?;
    let row = result
        .rows
        .first()
        .ok_or_else(|| SnowpaneError::query("Smoke test query returned no rows"))?;

    Ok(format_tuple(row))
}

/// Formats values as a parenthesised tuple; text is single-quoted.
pub fn format_tuple(values: &[Value]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|value| match value {
            Value::Null => "None".to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_display_string(),
        })
        .collect();

    if items.len() == 1 {
        format!("({},)", items[0])
    } else {
        format!("({})", items.join(", "))
    }
}
