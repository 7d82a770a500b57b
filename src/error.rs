//! Error types for Snowpane.
//!
//! Defines the main error enum used throughout the application, plus the
//! structured warehouse failure that query errors carry.

use std::fmt;
use thiserror::Error;

/// Main error type for Snowpane operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnowpaneError {
    /// Configuration errors (missing environment variables, invalid config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session establishment errors (host unreachable, bad credentials, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failures reported by the warehouse while running a statement.
    #[error("Query error: {0}")]
    Query(QueryFailure),

    /// Internal application errors (terminal setup, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SnowpaneError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with only a message (no warehouse code).
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(QueryFailure::new(msg))
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the warehouse error code, if the warehouse reported one.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Query(failure) => failure.code,
            _ => None,
        }
    }

    /// Raw diagnostic text to show alongside the message.
    ///
    /// Query failures render their code, SQL state and query id; every other
    /// kind has no extra detail beyond its message.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Query(failure) => failure.diagnostic(),
            _ => None,
        }
    }
}

/// A statement failure as reported by the warehouse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFailure {
    /// Numeric warehouse error code (e.g. 2003 for "object does not exist").
    pub code: Option<u32>,
    /// Human-readable message from the warehouse.
    pub message: String,
    /// ANSI SQL state, when provided.
    pub sql_state: Option<String>,
    /// Warehouse-side query identifier, when provided.
    pub query_id: Option<String>,
}

impl QueryFailure {
    /// Creates a failure with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets the warehouse error code.
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    /// Sets the SQL state.
    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    /// Sets the query id.
    pub fn with_query_id(mut self, query_id: impl Into<String>) -> Self {
        self.query_id = Some(query_id.into());
        self
    }

    /// Formats the structured fields as diagnostic text.
    ///
    /// Returns `None` when the warehouse supplied nothing beyond the message.
    pub fn diagnostic(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(code) = self.code {
            parts.push(format!("code: {code:06}"));
        }
        if let Some(state) = &self.sql_state {
            parts.push(format!("sqlState: {state}"));
        }
        if let Some(id) = &self.query_id {
            parts.push(format!("queryId: {id}"));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code:06}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result type alias using SnowpaneError.
pub type Result<T> = std::result::Result<T, SnowpaneError>;
