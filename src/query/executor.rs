//! Query execution with session recovery.
//!
//! Provides isolated query execution that can be tested independently
//! of the terminal UI.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_ROW_LIMIT};
use crate::connection::SessionManager;
use crate::db::QueryResult;
use crate::error::{Result, SnowpaneError};

use super::limit::apply_row_limit;
use super::retry::{should_reconnect, ExpiryPolicy};

/// SQL typed by the user plus the "limit rows" preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql: String,
    pub cap_rows: bool,
}

impl QueryRequest {
    /// Creates a request.
    pub fn new(sql: impl Into<String>, cap_rows: bool) -> Self {
        Self {
            sql: sql.into(),
            cap_rows,
        }
    }
}

/// Successful query execution outcome.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// The statement actually submitted (after trimming and row capping).
    pub sql: String,
    /// The query result, exactly as the warehouse returned it.
    pub result: QueryResult,
    /// Wall time including any reconnect.
    #[serde(skip)]
    pub execution_time: Duration,
    /// Whether the session expired and the statement was resubmitted.
    pub reconnected: bool,
}

/// Runs statements on the managed session, recovering once from an
/// expired session.
pub struct QueryRunner {
    sessions: Arc<SessionManager>,
    policy: ExpiryPolicy,
    row_limit: usize,
}

impl QueryRunner {
    /// Creates a runner with the default row cap.
    pub fn new(sessions: Arc<SessionManager>, policy: ExpiryPolicy) -> Self {
        Self {
            sessions,
            policy,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Creates a runner configured from the settings file.
    pub fn from_config(sessions: Arc<SessionManager>, config: &Config) -> Self {
        Self::new(sessions, ExpiryPolicy::from_config(&config.session))
            .with_row_limit(config.query.row_limit)
    }

    /// Sets the row cap applied to capped requests.
    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Returns the session manager this runner uses.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Returns the row cap applied to capped requests.
    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    /// Prepares and runs a user request.
    pub async fn run(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        self.run_observed(request, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_expired` with the expiry error
    /// before the session is re-established.
    pub async fn run_observed<F>(
        &self,
        request: &QueryRequest,
        on_expired: F,
    ) -> Result<QueryOutcome>
    where
        F: Fn(&SnowpaneError),
    {
        if request.sql.trim().is_empty() {
            return Err(SnowpaneError::query("Nothing to run: the query is empty"));
        }
        let sql = apply_row_limit(&request.sql, request.cap_rows, self.row_limit);

        let start = Instant::now();
        let (result, reconnected) = self.execute_with_recovery(&sql, on_expired).await?;

        Ok(QueryOutcome {
            sql,
            result,
            execution_time: start.elapsed(),
            reconnected,
        })
    }

    /// Runs `sql` as-is under the same recovery policy.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.execute_with_recovery(sql, |_| {})
            .await
            .map(|(result, _)| result)
    }

    /// Submits `sql`; on an expired session reconnects and resubmits once.
    ///
    /// Returns the result and whether a reconnect happened. A failure of the
    /// resubmission is returned as-is, never retried again.
    async fn execute_with_recovery<F>(
        &self,
        sql: &str,
        on_expired: F,
    ) -> Result<(QueryResult, bool)>
    where
        F: Fn(&SnowpaneError),
    {
        let session = self.sessions.session().await?;

        let error = match session.execute(sql).await {
            Ok(result) => return Ok((result, false)),
            Err(e) => e,
        };

        let kind = self.policy.classify(&error);
        if !should_reconnect(kind) {
            debug!("Statement failed ({:?}), not retrying: {}", kind, error);
            return Err(error);
        }

        warn!(
            "Session {} expired ({}), reconnecting and retrying once",
            session.id(),
            error
        );
        on_expired(&error);

        let fresh = self.sessions.reconnect(&session).await?;
        let result = fresh.execute(sql).await?;
        Ok((result, true))
    }
}
