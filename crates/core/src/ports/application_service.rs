use thiserror::Error;

use crate::domain::{job::JobReport, schedule::DailySchedule};

#[derive(Error, Debug)]
pub enum ApplicationServiceError {
    #[error("Service initialization failed: {details}")]
    InitializationFailed { details: String },
    #[error("Unknown extractor: {name}")]
    UnknownExtractor { name: String },
    #[error("Health check failed: {details}")]
    Unhealthy { details: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOptions {
    pub skip_setup: bool,
}

#[async_trait::async_trait]
pub trait ApplicationService: Send + Sync {
    /// Runs the full pipeline once. Job-level failures are reported in the returned
    /// [`JobReport`]; an `Err` means the job could not be started at all.
    async fn run_job(
        &self,
        options: JobOptions,
    ) -> error_stack::Result<JobReport, ApplicationServiceError>;

    async fn run_extractor_by_name(
        &self,
        name: &str,
        options: JobOptions,
    ) -> error_stack::Result<JobReport, ApplicationServiceError>;

    async fn list_steps(&self) -> Vec<String>;

    async fn health_check(&self) -> error_stack::Result<String, ApplicationServiceError>;

    fn schedule(&self) -> DailySchedule;
}
