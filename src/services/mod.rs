//! Long-running service hosting: registration, spawning, and shutdown.

pub mod manager;
pub mod matcher;
pub mod signals;
pub mod web;

use async_trait::async_trait;
use tokio::sync::broadcast;

/// A long-running component with a graceful-shutdown-aware run loop.
#[async_trait]
pub trait Service: Send {
    /// Run until completion or until a shutdown signal is received.
    async fn run(self: Box<Self>, shutdown_rx: broadcast::Receiver<()>);
}
