//! Session context reader.

use serde::Serialize;

use crate::db::{QueryResult, Value};
use crate::error::Result;

use super::executor::QueryRunner;

/// Statement reading back the session's role, warehouse, database and schema.
pub const CONTEXT_SQL: &str = "SELECT CURRENT_ROLE() AS role, CURRENT_WAREHOUSE() AS warehouse, \
CURRENT_DATABASE() AS database, CURRENT_SCHEMA() AS schema;";

/// Placeholder shown for a context field the warehouse did not report.
pub const UNAVAILABLE: &str = "unavailable";

/// What the current session runs as. Display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub role: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl SessionContext {
    /// Extracts the context from the first row of `result`.
    ///
    /// Drivers disagree on the casing of aliased columns, so each key is
    /// looked up lower-case first, then upper-case. NULL counts as missing.
    pub fn from_result(result: &QueryResult) -> Self {
        let Some(record) = result.record(0) else {
            return Self::default();
        };

        let field = |key: &str| {
            record
                .get(key)
                .or_else(|| record.get(&key.to_uppercase()))
                .filter(|value| !value.is_null())
                .map(Value::to_display_string)
        };

        Self {
            role: field("role"),
            warehouse: field("warehouse"),
            database: field("database"),
            schema: field("schema"),
        }
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(UNAVAILABLE)
    }

    pub fn warehouse(&self) -> &str {
        self.warehouse.as_deref().unwrap_or(UNAVAILABLE)
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or(UNAVAILABLE)
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(UNAVAILABLE)
    }

    /// `(label, value)` pairs in display order.
    pub fn metrics(&self) -> [(&'static str, &str); 4] {
        [
            ("Role", self.role()),
            ("Warehouse", self.warehouse()),
            ("Database", self.database()),
            ("Schema", self.schema()),
        ]
    }
}

/// Reads the session context, recovering from an expired session once.
pub async fn read_context(runner: &QueryRunner) -> Result<SessionContext> {
    let result = runner.execute(CONTEXT_SQL).await?;
    Ok(SessionContext::from_result(&result))
}
