//! Registry and lifecycle driver for the application's services.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::services::Service;

/// Owns registered services, spawns them, and coordinates shutdown through
/// a shared broadcast channel.
pub struct ServiceManager {
    pending: Vec<(String, Box<dyn Service>)>,
    handles: Vec<(String, JoinHandle<()>)>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            pending: Vec::new(),
            handles: Vec::new(),
            shutdown_tx,
        }
    }

    /// Register a service under a name. Takes effect on the next
    /// [`spawn_all`](Self::spawn_all).
    pub fn register_service(&mut self, name: &str, service: Box<dyn Service>) {
        self.pending.push((name.to_owned(), service));
    }

    /// True when at least one service has been registered.
    pub fn has_services(&self) -> bool {
        !self.pending.is_empty() || !self.handles.is_empty()
    }

    /// Spawn every registered service on its own task.
    pub fn spawn_all(&mut self) {
        for (name, service) in self.pending.drain(..) {
            let shutdown_rx = self.shutdown_tx.subscribe();
            info!(service = %name, "Spawning service");
            let handle = tokio::spawn(service.run(shutdown_rx));
            self.handles.push((name, handle));
        }
    }

    /// Broadcast shutdown and wait up to `timeout` for services to drain.
    pub async fn shutdown(self, timeout: Duration) {
        info!(services = self.handles.len(), "Shutting down services");
        // Receivers may already be gone if every service exited on its own.
        let _ = self.shutdown_tx.send(());

        for (name, handle) in self.handles {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => info!(service = %name, "Service stopped"),
                Ok(Err(e)) => warn!(service = %name, error = ?e, "Service task panicked"),
                Err(_) => warn!(service = %name, "Service did not stop within timeout, abandoning"),
            }
        }
    }
}
