//! Session manager for the warehouse session lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::WarehouseConfig;
use crate::db::{Connector, QueryResult, SessionTarget, WarehouseClient};
use crate::error::Result;

/// An open warehouse session.
///
/// Sessions are handed out as `Arc<Session>`; a caller keeps using the same
/// session for its whole call even if another caller replaces it meanwhile.
pub struct Session {
    id: u64,
    client: Box<dyn WarehouseClient>,
}

impl Session {
    /// Process-unique number of this session, increasing with each reconnect.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The (role, warehouse, database, schema) the session was opened against.
    pub fn target(&self) -> &SessionTarget {
        self.client.target()
    }

    /// Runs a statement on this session.
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.client.execute_query(sql).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("target", self.target())
            .finish()
    }
}

/// Owns the single live warehouse session of the process.
///
/// The session is opened lazily on first use and kept until it is
/// explicitly replaced. The lock is held while a replacement connects, so
/// no caller ever sees a half-built session.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    config: WarehouseConfig,
    current: Mutex<Option<Arc<Session>>>,
    next_id: AtomicU64,
}

impl SessionManager {
    /// Creates a manager; no connection is made until the first request.
    pub fn new(connector: Arc<dyn Connector>, config: WarehouseConfig) -> Self {
        Self {
            connector,
            config,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the configuration sessions are opened with.
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Returns the cached session, connecting first if there is none.
    pub async fn session(&self) -> Result<Arc<Session>> {
        let mut current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            return Ok(Arc::clone(session));
        }

        let session = self.open().await?;
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Discards the cached session and opens a new one.
    pub async fn invalidate_and_reconnect(&self) -> Result<Arc<Session>> {
        let current = self.current.lock().await;
        self.replace(current).await
    }

    /// Replaces `stale` with a fresh session.
    ///
    /// If `stale` is no longer the cached session (another caller already
    /// reconnected), the current one is returned without connecting again.
    pub async fn reconnect(&self, stale: &Session) -> Result<Arc<Session>> {
        let current = self.current.lock().await;

        if let Some(session) = current.as_ref() {
            if session.id != stale.id {
                debug!(
                    "Session {} already replaced by {}",
                    stale.id, session.id
                );
                return Ok(Arc::clone(session));
            }
        }

        self.replace(current).await
    }

    /// Opens a new session in place of the cached one, then closes the old
    /// one outside the lock.
    async fn replace(
        &self,
        mut current: MutexGuard<'_, Option<Arc<Session>>>,
    ) -> Result<Arc<Session>> {
        let old = current.take();
        let session = self.open().await?;
        *current = Some(Arc::clone(&session));
        drop(current);

        if let Some(old) = old {
            close_quietly(&old).await;
        }

        Ok(session)
    }

    /// Returns true if a session is currently cached.
    pub async fn is_connected(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Closes the cached session, if any.
    pub async fn close(&self) -> Result<()> {
        let session = self.current.lock().await.take();
        if let Some(session) = session {
            session.client.close().await?;
            info!("Closed session {}", session.id);
        }
        Ok(())
    }

    async fn open(&self) -> Result<Arc<Session>> {
        let client = self.connector.connect(&self.config).await?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        info!("Opened session {} ({})", id, self.config.display_string());
        Ok(Arc::new(Session { id, client }))
    }
}

async fn close_quietly(session: &Session) {
    if let Err(e) = session.client.close().await {
        warn!("Error closing session {}: {}", session.id, e);
    }
}
