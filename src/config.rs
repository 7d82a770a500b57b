//! Configuration management for Snowpane.
//!
//! Warehouse credentials come from `SNOWFLAKE_*` environment variables (a
//! `.env` file is read first when present). Everything else, such as the
//! row cap, the expired-session codes and the chart columns, lives in an
//! optional TOML settings file.

use crate::error::{Result, SnowpaneError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variables that must be set before a session can be opened.
pub const REQUIRED_ENV_VARS: [&str; 7] = [
    "SNOWFLAKE_ACCOUNT",
    "SNOWFLAKE_USER",
    "SNOWFLAKE_PASSWORD",
    "SNOWFLAKE_WAREHOUSE",
    "SNOWFLAKE_DATABASE",
    "SNOWFLAKE_SCHEMA",
    "SNOWFLAKE_ROLE",
];

/// Optional override for the warehouse endpoint.
pub const HOST_ENV_VAR: &str = "SNOWFLAKE_HOST";

/// Warehouse error code for "authentication token has expired".
pub const DEFAULT_EXPIRED_CODE: u32 = 390114;

/// Row cap applied when limiting is enabled.
pub const DEFAULT_ROW_LIMIT: usize = 200;

const DEFAULT_SQL: &str = "SELECT
    truck_brand_name,
    COUNT(*) AS item_count
FROM menu
GROUP BY truck_brand_name
ORDER BY item_count DESC;
";

/// Main settings structure for Snowpane.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Query editor and row-cap settings.
    #[serde(default)]
    pub query: QueryConfig,

    /// Session recovery settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Bar chart settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// Query editor and row-cap settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryConfig {
    /// Number of rows appended as `LIMIT n` when limiting is on.
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    /// Initial state of the "limit results" toggle.
    #[serde(default = "default_true")]
    pub limit_by_default: bool,

    /// SQL the editor starts with.
    #[serde(default = "default_sql")]
    pub default_sql: String,
}

fn default_row_limit() -> usize {
    DEFAULT_ROW_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_sql() -> String {
    DEFAULT_SQL.to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            row_limit: default_row_limit(),
            limit_by_default: true,
            default_sql: default_sql(),
        }
    }
}

/// Session recovery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Warehouse error codes that mean the session must be re-established.
    #[serde(default = "default_expired_codes")]
    pub expired_codes: Vec<u32>,
}

fn default_expired_codes() -> Vec<u32> {
    vec![DEFAULT_EXPIRED_CODE]
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expired_codes: default_expired_codes(),
        }
    }
}

/// Columns used to draw the bar chart, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartConfig {
    /// Column holding the bar labels.
    #[serde(default = "default_label_column")]
    pub label_column: String,

    /// Column holding the bar values.
    #[serde(default = "default_value_column")]
    pub value_column: String,
}

fn default_label_column() -> String {
    "TRUCK_BRAND_NAME".to_string()
}

fn default_value_column() -> String {
    "ITEM_COUNT".to_string()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            label_column: default_label_column(),
            value_column: default_value_column(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snowpane")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file, or defaults if it doesn't exist.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SnowpaneError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            SnowpaneError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;

        if config.query.row_limit == 0 {
            return Err(SnowpaneError::config(format!(
                "Configuration error in {}:\n  query.row_limit must be greater than 0",
                path.display()
            )));
        }

        Ok(config)
    }
}

/// Credentials and session target for the warehouse.
#[derive(Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    /// Account identifier (e.g. `xy12345.us-east-1`).
    pub account: String,
    /// Login name.
    pub user: String,
    /// Password, passed through to the login request.
    pub password: String,
    /// Virtual warehouse to run queries on.
    pub warehouse: String,
    /// Default database.
    pub database: String,
    /// Default schema.
    pub schema: String,
    /// Role to assume.
    pub role: String,
    /// Endpoint override; defaults to `https://<account>.snowflakecomputing.com`.
    pub host: Option<String>,
}

impl WarehouseConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Every required key that is absent or empty is collected and reported
    /// in a single configuration error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|key| value(*key).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(SnowpaneError::config(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| value(key).unwrap_or_default();

        Ok(Self {
            account: required("SNOWFLAKE_ACCOUNT"),
            user: required("SNOWFLAKE_USER"),
            password: required("SNOWFLAKE_PASSWORD"),
            warehouse: required("SNOWFLAKE_WAREHOUSE"),
            database: required("SNOWFLAKE_DATABASE"),
            schema: required("SNOWFLAKE_SCHEMA"),
            role: required("SNOWFLAKE_ROLE"),
            host: value(HOST_ENV_VAR),
        })
    }

    /// Returns the base URL of the warehouse REST endpoint.
    pub fn base_url(&self) -> Result<Url> {
        let raw = match &self.host {
            Some(host) if host.contains("://") => host.clone(),
            Some(host) => format!("https://{host}"),
            None => format!("https://{}.snowflakecomputing.com", self.account),
        };

        Url::parse(&raw)
            .map_err(|e| SnowpaneError::config(format!("Invalid warehouse endpoint '{raw}': {e}")))
    }

    /// Returns the account name as the login request expects it.
    ///
    /// Region and cloud suffixes (`xy12345.us-east-1`) are dropped.
    pub fn account_name(&self) -> &str {
        self.account
            .split('.')
            .next()
            .unwrap_or(self.account.as_str())
    }

    /// Returns a display-safe string (no password) for UI purposes.
    pub fn display_string(&self) -> String {
        format!(
            "{}@{} [{}/{}.{} as {}]",
            self.user, self.account, self.warehouse, self.database, self.schema, self.role
        )
    }
}

impl fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .field("host", &self.host)
            .finish()
    }
}
