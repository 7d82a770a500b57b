//! Failure classification for session recovery.
//!
//! Whether a failed statement is retried depends only on its [`ErrorKind`];
//! which warehouse codes count as an expired session is configuration.

use crate::config::{SessionConfig, DEFAULT_EXPIRED_CODE};
use crate::error::SnowpaneError;

/// Kind of a failure, as far as recovery is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration.
    Config,
    /// The session could not be established.
    Connection,
    /// The session's authentication token is no longer valid.
    SessionExpired,
    /// Any other statement failure (syntax, permissions, ...).
    Query,
    /// Failures inside the application itself.
    Internal,
}

/// Returns true if a failure of this kind is recovered by reconnecting.
pub fn should_reconnect(kind: ErrorKind) -> bool {
    kind == ErrorKind::SessionExpired
}

/// Maps warehouse failures to [`ErrorKind`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryPolicy {
    expired_codes: Vec<u32>,
}

impl ExpiryPolicy {
    /// Creates a policy treating the given codes as an expired session.
    pub fn new(expired_codes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            expired_codes: expired_codes.into_iter().collect(),
        }
    }

    /// Creates a policy from the `[session]` settings.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.expired_codes.iter().copied())
    }

    /// Codes treated as an expired session.
    pub fn expired_codes(&self) -> &[u32] {
        &self.expired_codes
    }

    /// Classifies a failure.
    pub fn classify(&self, error: &SnowpaneError) -> ErrorKind {
        match error {
            SnowpaneError::Config(_) => ErrorKind::Config,
            SnowpaneError::Connection(_) => ErrorKind::Connection,
            SnowpaneError::Internal(_) => ErrorKind::Internal,
            SnowpaneError::Query(failure) => match failure.code {
                Some(code) if self.expired_codes.contains(&code) => ErrorKind::SessionExpired,
                _ => ErrorKind::Query,
            },
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new([DEFAULT_EXPIRED_CODE])
    }
}
