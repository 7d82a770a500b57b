//! Snowflake warehouse client.
//!
//! Talks to the Snowflake REST endpoints the official connectors use:
//! password login, statement submission with JSON result sets, polling for
//! long-running statements, result chunk download, and session close.

use crate::config::WarehouseConfig;
use crate::db::{ColumnInfo, Connector, QueryResult, Row, SessionTarget, Value, WarehouseClient};
use crate::error::{QueryFailure, Result, SnowpaneError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

const LOGIN_PATH: &str = "session/v1/login-request";
const QUERY_PATH: &str = "queries/v1/query-request";
const SESSION_PATH: &str = "session";

/// Content type the query endpoints answer with.
const SNOWFLAKE_ACCEPT: &str = "application/snowflake";

const CLIENT_APP_ID: &str = "Snowpane";

/// Codes meaning the statement is still executing.
const QUERY_IN_PROGRESS_CODES: [&str; 2] = ["333333", "333334"];

/// Delay between polls of a still-running statement.
const POLL_INTERVAL_MS: u64 = 500;

/// Maximum length of a raw response body quoted in an error.
const MAX_BODY_IN_ERROR: usize = 200;

/// Opens [`SnowflakeClient`] sessions sharing one HTTP client.
#[derive(Debug, Clone, Default)]
pub struct SnowflakeConnector {
    http: reqwest::Client,
}

impl SnowflakeConnector {
    /// Creates a connector with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector around an existing HTTP client.
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Connector for SnowflakeConnector {
    async fn connect(&self, config: &WarehouseConfig) -> Result<Box<dyn WarehouseClient>> {
        let client = SnowflakeClient::connect(self.http.clone(), config).await?;
        Ok(Box::new(client))
    }
}

/// An authenticated Snowflake session.
pub struct SnowflakeClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    target: SessionTarget,
    sequence: AtomicU64,
}

impl fmt::Debug for SnowflakeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("target", &self.target)
            .finish()
    }
}

impl SnowflakeClient {
    /// Logs in with the configured user and password.
    pub async fn connect(http: reqwest::Client, config: &WarehouseConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let mut url = join(&base_url, LOGIN_PATH)?;
        url.query_pairs_mut()
            .append_pair("databaseName", &config.database)
            .append_pair("schemaName", &config.schema)
            .append_pair("warehouse", &config.warehouse)
            .append_pair("roleName", &config.role)
            .append_pair("requestId", &Uuid::new_v4().to_string());

        let body = json!({
            "data": {
                "CLIENT_APP_ID": CLIENT_APP_ID,
                "CLIENT_APP_VERSION": env!("CARGO_PKG_VERSION"),
                "ACCOUNT_NAME": config.account_name(),
                "LOGIN_NAME": config.user,
                "PASSWORD": config.password,
                "CLIENT_ENVIRONMENT": {
                    "APPLICATION": CLIENT_APP_ID,
                },
            }
        });

        debug!(
            "Logging in to {} as {}",
            base_url.host_str().unwrap_or("warehouse"),
            config.user
        );

        let response = http
            .post(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, user_agent())
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, &base_url))?;

        let status = response.status();
        let envelope: Envelope<LoginData> = read_envelope(response).await.map_err(|e| {
            SnowpaneError::connection(format!("Login failed (HTTP {status}): {}", reason(&e)))
        })?;

        if !envelope.success {
            return Err(SnowpaneError::connection(envelope.failure_text("Login failed")));
        }

        let data = envelope
            .data
            .ok_or_else(|| SnowpaneError::connection("Login response contained no session"))?;
        let token = data
            .token
            .ok_or_else(|| SnowpaneError::connection("Login response contained no token"))?;

        let target = match data.session_info {
            Some(info) => info.into_target(config),
            None => SessionTarget::from_config(config),
        };

        debug!("Session established for role {}", target.role);

        Ok(Self {
            http,
            base_url,
            token,
            target,
            sequence: AtomicU64::new(0),
        })
    }

    fn auth_header(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }

    async fn get_envelope(&self, url: Url) -> Result<Envelope<QueryData>> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .header(AUTHORIZATION, self.auth_header())
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(|e| map_transport_error(e, &self.base_url))?;

        read_envelope(response).await
    }

    /// Downloads one additional result chunk.
    ///
    /// Chunk bodies are a comma-separated sequence of JSON row arrays without
    /// the enclosing brackets.
    async fn fetch_chunk(&self, chunk: &ChunkInfo, headers: &HeaderMap) -> Result<Vec<RawRow>> {
        let response = self
            .http
            .get(&chunk.url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| map_transport_error(e, &self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnowpaneError::query(format!(
                "Failed to download result chunk (HTTP {status})"
            )));
        }

        let body = response.text().await.map_err(|e| {
            SnowpaneError::query(format!("Failed to read result chunk: {e}"))
        })?;

        serde_json::from_str(&format!("[{body}]"))
            .map_err(|e| SnowpaneError::query(format!("Malformed result chunk: {e}")))
    }
}

#[async_trait]
impl WarehouseClient for SnowflakeClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let mut url = join(&self.base_url, QUERY_PATH)?;
        url.query_pairs_mut()
            .append_pair("requestId", &Uuid::new_v4().to_string());

        let sequence_id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let body = json!({
            "sqlText": sql,
            "asyncExec": false,
            "sequenceId": sequence_id,
            "querySubmissionTime": unix_millis(),
        });

        let response = self
            .http
            .post(url)
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .header(AUTHORIZATION, self.auth_header())
            .header(USER_AGENT, user_agent())
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, &self.base_url))?;

        let mut envelope: Envelope<QueryData> = read_envelope(response).await?;

        while envelope.is_in_progress() {
            let result_path = envelope
                .data
                .as_ref()
                .and_then(|d| d.get_result_url.clone())
                .ok_or_else(|| {
                    SnowpaneError::query("Statement is still running but no result URL was given")
                })?;

            debug!("Statement still running, polling {}", result_path);
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            envelope = self.get_envelope(join(&self.base_url, &result_path)?).await?;
        }

        if !envelope.success {
            return Err(SnowpaneError::Query(envelope.into_failure()));
        }

        let mut data = envelope.data.unwrap_or_default();

        if let Some(format) = &data.query_result_format {
            if !format.eq_ignore_ascii_case("json") {
                return Err(SnowpaneError::query(format!(
                    "Unsupported result format '{format}'"
                )));
            }
        }

        let mut raw_rows = std::mem::take(&mut data.rowset);
        if !data.chunks.is_empty() {
            let headers = chunk_headers(&data)?;
            debug!("Downloading {} result chunks", data.chunks.len());
            for chunk in &data.chunks {
                raw_rows.extend(self.fetch_chunk(chunk, &headers).await?);
            }
        }

        let columns: Vec<ColumnInfo> = data
            .rowtype
            .iter()
            .map(|t| ColumnInfo::new(&t.name, &t.type_name))
            .collect();

        let rows: Vec<Row> = raw_rows
            .into_iter()
            .map(|raw| decode_row(&data.rowtype, raw))
            .collect();

        let row_count = rows.len();
        let total_rows = data.total.map(|t| t as usize).or(Some(row_count));

        Ok(QueryResult {
            columns,
            rows,
            execution_time: start.elapsed(),
            row_count,
            total_rows,
        })
    }

    fn target(&self) -> &SessionTarget {
        &self.target
    }

    async fn close(&self) -> Result<()> {
        let mut url = join(&self.base_url, SESSION_PATH)?;
        url.query_pairs_mut().append_pair("delete", "true");

        let response = self
            .http
            .post(url)
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .header(AUTHORIZATION, self.auth_header())
            .header(USER_AGENT, user_agent())
            .send()
            .await
            .map_err(|e| map_transport_error(e, &self.base_url))?;

        if !response.status().is_success() {
            warn!("Closing session returned HTTP {}", response.status());
        }

        Ok(())
    }
}

/// One row as it arrives on the wire: strings and nulls, occasionally
/// native JSON scalars.
type RawRow = Vec<serde_json::Value>;

/// Common response wrapper of every Snowflake REST endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    success: bool,
}

impl<T> Envelope<T> {
    fn code(&self) -> Option<u32> {
        self.code.as_deref().and_then(|c| c.trim().parse().ok())
    }

    fn failure_text(&self, fallback: &str) -> String {
        let message = self.message.as_deref().unwrap_or(fallback);
        match self.code() {
            Some(code) => format!("{code:06}: {message}"),
            None => message.to_string(),
        }
    }
}

impl Envelope<QueryData> {
    fn is_in_progress(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| QUERY_IN_PROGRESS_CODES.contains(&c))
    }

    fn into_failure(self) -> QueryFailure {
        let code = self.code().or_else(|| {
            self.data
                .as_ref()
                .and_then(|d| d.error_code.as_deref())
                .and_then(|c| c.trim().parse().ok())
        });

        let mut failure = QueryFailure::new(
            self.message
                .unwrap_or_else(|| "Statement failed without a message".to_string()),
        );
        failure.code = code;
        if let Some(data) = self.data {
            failure.sql_state = data.sql_state;
            failure.query_id = data.query_id;
        }
        failure
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    token: Option<String>,
    session_info: Option<SessionInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    database_name: Option<String>,
    schema_name: Option<String>,
    warehouse_name: Option<String>,
    role_name: Option<String>,
}

impl SessionInfo {
    /// Prefers what the warehouse granted, falling back to what was asked for.
    fn into_target(self, config: &WarehouseConfig) -> SessionTarget {
        SessionTarget {
            role: self.role_name.unwrap_or_else(|| config.role.clone()),
            warehouse: self
                .warehouse_name
                .unwrap_or_else(|| config.warehouse.clone()),
            database: self
                .database_name
                .unwrap_or_else(|| config.database.clone()),
            schema: self.schema_name.unwrap_or_else(|| config.schema.clone()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryData {
    rowtype: Vec<RowType>,
    rowset: Vec<RawRow>,
    total: Option<u64>,
    chunks: Vec<ChunkInfo>,
    qrmk: Option<String>,
    chunk_headers: Option<HashMap<String, String>>,
    query_id: Option<String>,
    get_result_url: Option<String>,
    sql_state: Option<String>,
    query_result_format: Option<String>,
    error_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RowType {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    scale: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChunkInfo {
    url: String,
}

/// Builds the headers needed to download result chunks.
///
/// Explicit chunk headers win; otherwise the query result master key is sent
/// as an SSE-C key.
fn chunk_headers(data: &QueryData) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(explicit) = &data.chunk_headers {
        for (name, value) in explicit {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SnowpaneError::query(format!("Invalid chunk header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SnowpaneError::query(format!("Invalid chunk header value: {e}")))?;
            headers.insert(name, value);
        }
    } else if let Some(qrmk) = &data.qrmk {
        let key = HeaderValue::from_str(qrmk)
            .map_err(|e| SnowpaneError::query(format!("Invalid result key: {e}")))?;
        headers.insert(
            HeaderName::from_static("x-amz-server-side-encryption-customer-algorithm"),
            HeaderValue::from_static("AES256"),
        );
        headers.insert(
            HeaderName::from_static("x-amz-server-side-encryption-customer-key"),
            key,
        );
    }

    Ok(headers)
}

/// Converts one wire row into typed values using the column types.
fn decode_row(row_types: &[RowType], raw: RawRow) -> Row {
    raw.into_iter()
        .enumerate()
        .map(|(i, cell)| decode_value(row_types.get(i), cell))
        .collect()
}

fn decode_value(row_type: Option<&RowType>, cell: serde_json::Value) -> Value {
    let text = match cell {
        serde_json::Value::Null => return Value::Null,
        serde_json::Value::Bool(b) => return Value::Bool(b),
        serde_json::Value::Number(n) => {
            return match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            }
        }
        serde_json::Value::String(s) => s,
        other => return Value::String(other.to_string()),
    };

    let Some(row_type) = row_type else {
        return Value::String(text);
    };

    match row_type.type_name.to_ascii_lowercase().as_str() {
        "fixed" if row_type.scale.unwrap_or(0) == 0 => match text.parse::<i64>() {
            Ok(i) => Value::Int(i),
            // NUMBER(38,0) can exceed i64
            Err(_) => text
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or(Value::String(text)),
        },
        "fixed" | "real" => text
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::String(text)),
        "boolean" => match text.to_ascii_lowercase().as_str() {
            "1" | "true" => Value::Bool(true),
            "0" | "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        _ => Value::String(text),
    }
}

/// Reads a response body as a Snowflake envelope.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<Envelope<T>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SnowpaneError::connection(format!("Failed to read warehouse response: {e}")))?;

    serde_json::from_str(&body).map_err(|e| {
        if status.is_success() {
            SnowpaneError::query(format!("Invalid warehouse response: {e}"))
        } else {
            SnowpaneError::query(format!(
                "Warehouse returned HTTP {status}: {}",
                truncate_body(&body)
            ))
        }
    })
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| SnowpaneError::internal(format!("Invalid endpoint path '{path}': {e}")))
}

fn map_transport_error(error: reqwest::Error, base_url: &Url) -> SnowpaneError {
    let host = base_url.host_str().unwrap_or("warehouse");

    if error.is_connect() {
        SnowpaneError::connection(format!(
            "Cannot reach {host}. Check SNOWFLAKE_ACCOUNT and your network connection."
        ))
    } else if error.is_timeout() {
        SnowpaneError::connection(format!("Request to {host} timed out."))
    } else {
        SnowpaneError::connection(error.to_string())
    }
}

/// Extracts the inner message of an error without its category prefix.
fn reason(error: &SnowpaneError) -> String {
    match error {
        SnowpaneError::Query(failure) => failure.to_string(),
        SnowpaneError::Config(msg)
        | SnowpaneError::Connection(msg)
        | SnowpaneError::Internal(msg) => msg.clone(),
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_IN_ERROR {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_BODY_IN_ERROR).collect();
        format!("{cut}...")
    }
}

fn user_agent() -> String {
    format!("{CLIENT_APP_ID}/{}", env!("CARGO_PKG_VERSION"))
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
