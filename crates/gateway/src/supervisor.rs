use std::sync::Arc;

use airgate_audit::AuditLog;
use airgate_broker::Publisher;
use airgate_client::SensorApi;
use airgate_core::{Clock, JobDescriptor};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::runner::JobRunner;

/// Starts one [`JobRunner`] per enabled job and keeps them running until
/// shutdown. Jobs are fully independent; the only resource they share is
/// the audit log's storage layer, which serializes itself.
pub struct Supervisor {
    api: Arc<dyn SensorApi>,
    publisher: Arc<dyn Publisher>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
}

impl Supervisor {
    pub fn new(
        api: Arc<dyn SensorApi>,
        publisher: Arc<dyn Publisher>,
        audit: Arc<AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            publisher,
            audit,
            clock,
        }
    }

    /// Spawn one runner task per enabled job. Disabled jobs are skipped with
    /// a diagnostic. Zero enabled jobs leaves an idle gateway, not an error.
    pub fn start(&self, jobs: Vec<JobDescriptor>) -> GatewayHandle {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for job in jobs {
            if !job.enabled {
                info!(job = %job.name, "job disabled, skipping");
                continue;
            }
            info!(job = %job.name, interval_s = job.poll_interval.as_secs(), "starting job runner");
            let runner = JobRunner::new(
                job,
                Arc::clone(&self.api),
                Arc::clone(&self.publisher),
                Arc::clone(&self.audit),
                Arc::clone(&self.clock),
            );
            tasks.spawn(runner.run(cancel.child_token()));
        }

        if tasks.is_empty() {
            warn!("no enabled jobs; the gateway is idle");
        }

        GatewayHandle { cancel, tasks }
    }
}

/// Handle to a running gateway: cancel it, then drain the runner tasks.
pub struct GatewayHandle {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl GatewayHandle {
    /// Number of runner tasks still alive.
    pub fn job_count(&self) -> usize {
        self.tasks.len()
    }

    /// Ask every runner to stop at its next suspension point. In-flight
    /// publishes may complete or be abandoned; delivery is at-most-once
    /// either way.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for all runners to finish. Runners only finish after
    /// [`shutdown`](Self::shutdown) has been called.
    pub async fn wait(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result
                && e.is_panic()
            {
                error!(error = %e, "job runner panicked");
            }
        }
    }
}
