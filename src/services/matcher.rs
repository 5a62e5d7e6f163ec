//! The scheduler hosted as a managed service.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::scheduler::Scheduler;
use crate::services::Service;
use crate::state::{ServiceStatus, ServiceStatusRegistry};

pub struct MatcherService {
    scheduler: Scheduler,
    statuses: ServiceStatusRegistry,
}

impl MatcherService {
    pub fn new(scheduler: Scheduler, statuses: ServiceStatusRegistry) -> Self {
        Self { scheduler, statuses }
    }
}

#[async_trait]
impl Service for MatcherService {
    async fn run(self: Box<Self>, shutdown_rx: broadcast::Receiver<()>) {
        self.statuses.set("matcher", ServiceStatus::Active);
        self.scheduler.run(shutdown_rx).await;
        self.statuses.set("matcher", ServiceStatus::Disabled);
    }
}
