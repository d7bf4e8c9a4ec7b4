// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP listener lifecycle: bind, serve in a background task, and stop
// gracefully so in-flight requests finish before the task exits.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use pdfworks_core::{PdfworksError, Result};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// The API server.
pub struct ApiServer {
    router: Router,
    bind_addr: String,
    local_addr: Option<SocketAddr>,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    task_handle: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(router: Router, bind_addr: impl Into<String>) -> Self {
        Self {
            router,
            bind_addr: bind_addr.into(),
            local_addr: None,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
        }
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Bind the listener and start serving in the background.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.local_addr.filter(|_| self.is_running()) {
            debug!(%addr, "API server already running");
            return Ok(addr);
        }

        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| PdfworksError::Internal(format!("bind {}: {e}", self.bind_addr)))?;
        let addr = listener.local_addr()?;
        info!(%addr, "API server listening");

        let shutdown = Arc::clone(&self.shutdown_signal);
        let router = self.router.clone();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await;
            if let Err(e) = served {
                error!(error = %e, "API server terminated with an error");
            }
        });

        self.local_addr = Some(addr);
        self.task_handle = Some(handle);
        Ok(addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };

        info!("stopping API server");
        self.shutdown_signal.notify_one();
        handle
            .await
            .map_err(|e| PdfworksError::Internal(format!("server task join: {e}")))?;
        info!("API server stopped");
        Ok(())
    }
}
