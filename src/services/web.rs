//! The HTTP API hosted as a managed service.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::services::Service;
use crate::state::{AppState, ServiceStatus};
use crate::web;

pub struct WebService {
    port: u16,
    state: AppState,
}

impl WebService {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }
}

#[async_trait]
impl Service for WebService {
    async fn run(self: Box<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        let statuses = self.state.service_statuses.clone();
        statuses.set("web", ServiceStatus::Starting);

        let router = web::build_router(self.state);
        let addr = format!("0.0.0.0:{}", self.port);

        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(addr = %addr, error = ?e, "Failed to bind web listener");
                statuses.set("web", ServiceStatus::Error);
                return;
            }
        };

        info!(addr = %addr, "Web service listening");
        statuses.set("web", ServiceStatus::Active);

        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Web service received shutdown signal");
        });

        if let Err(e) = serve.await {
            error!(error = ?e, "Web server exited with error");
            statuses.set("web", ServiceStatus::Error);
            return;
        }

        info!("Web service exiting gracefully");
        statuses.set("web", ServiceStatus::Disabled);
    }
}
