use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::{
    application::shutdown::{wait_for_shutdown, ShutdownReceiver},
    ports::application_service::{ApplicationService, JobOptions},
};

/// Fires the job once per day until shutdown is requested.
pub struct DailyScheduler {
    service: Arc<dyn ApplicationService>,
    shutdown: Option<ShutdownReceiver>,
}

impl DailyScheduler {
    pub fn new(service: Arc<dyn ApplicationService>) -> Self {
        Self {
            service,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownReceiver) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|receiver| *receiver.borrow())
            .unwrap_or(false)
    }

    /// Returns the number of jobs that ran. A failed job is logged and the next occurrence is
    /// still scheduled.
    #[instrument(skip(self))]
    pub async fn run(&self, options: JobOptions) -> usize {
        let mut runs = 0;

        while !self.shutdown_requested() {
            let schedule = self.service.schedule();
            let now = Utc::now();
            let wait = schedule.duration_until_next(now);
            info!(
                "⏰ Next run at {} (in {:?})",
                schedule.next_after(now).to_rfc3339(),
                wait
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = wait_for_shutdown(self.shutdown.clone()) => break,
            }

            runs += 1;
            match self.service.run_job(options).await {
                Ok(report) if report.is_success() => info!("{}", report),
                Ok(report) => warn!("{}", report),
                Err(report) => error!("❌ Scheduled job could not start: {:?}", report),
            }
        }

        info!("🛑 Scheduler stopped after {} runs", runs);
        runs
    }
}
