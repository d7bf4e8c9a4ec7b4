// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded SQLite connection pool.
//
// A fixed set of connections is opened up front. `get` waits on a
// semaphore for a free slot; the returned guard hands its connection back
// when dropped, whether the caller succeeded, failed or panicked.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pdfworks_core::error::{PdfworksError, Result};
use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument, warn};

/// How long SQLite waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Convert a `rusqlite::Error` into a `PdfworksError::Database`.
pub(crate) fn db_err(e: rusqlite::Error) -> PdfworksError {
    PdfworksError::Database(e.to_string())
}

struct PoolInner {
    path: PathBuf,
    size: usize,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

/// Shared handle to the pool. Cloning is cheap.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Open `size` connections (at least one) to the database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let size = size.max(1);

        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(&path).map_err(db_err)?;
            conn.busy_timeout(BUSY_TIMEOUT).map_err(db_err)?;
            // WAL lets readers proceed while a writer holds the lock.
            conn.execute_batch("PRAGMA journal_mode = WAL;").map_err(db_err)?;
            connections.push(conn);
        }

        debug!(size, "connection pool opened");
        Ok(Self {
            inner: Arc::new(PoolInner {
                path,
                size,
                idle: Mutex::new(connections),
                permits: Arc::new(Semaphore::new(size)),
            }),
        })
    }

    /// Wait for a free connection.
    pub async fn get(&self) -> Result<PooledConnection> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| PdfworksError::Internal("connection pool is closed".into()))?;
        self.checkout(permit)
    }

    /// Take a free connection without waiting, if there is one.
    pub fn try_get(&self) -> Option<PooledConnection> {
        let permit = Arc::clone(&self.inner.permits).try_acquire_owned().ok()?;
        self.checkout(permit).ok()
    }

    fn checkout(&self, permit: OwnedSemaphorePermit) -> Result<PooledConnection> {
        let conn = self
            .inner
            .idle
            .lock()
            .map_err(|_| PdfworksError::Internal("connection pool lock poisoned".into()))?
            .pop();

        // A permit guarantees an idle connection unless one was lost to a
        // panic while the lock was held; reopen in that case.
        let conn = match conn {
            Some(conn) => conn,
            None => {
                warn!("idle list empty despite free permit; reopening connection");
                let conn = Connection::open(&self.inner.path).map_err(db_err)?;
                conn.busy_timeout(BUSY_TIMEOUT).map_err(db_err)?;
                conn
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Configured number of connections.
    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Connections not currently checked out.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("path", &self.inner.path)
            .field("size", &self.inner.size)
            .field("available", &self.available())
            .finish()
    }
}

/// A checked-out connection. Returns to the pool on drop.
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    // Released after the connection is back on the idle list (fields drop
    // in declaration order, and `drop` runs first).
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `drop` takes the connection out.
        self.conn.as_ref().unwrap_or_else(|| unreachable!("connection taken before drop"))
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().unwrap_or_else(|| unreachable!("connection taken before drop"))
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match self.pool.idle.lock() {
                Ok(mut idle) => idle.push(conn),
                Err(_) => warn!("connection pool lock poisoned; dropping connection"),
            }
        }
    }
}
