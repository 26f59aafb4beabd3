use balance_sync_core::{
    adapters::{
        config::app_config::AppConfig,
        process::{pkill_reaper::PkillReaper, tokio_process_runner::TokioProcessRunner},
        secrets::env_secret_source::EnvSecretSource,
    },
    application::{service::ExtractionJobService, shutdown::ShutdownReceiver},
    ports::application_service::{ApplicationService, ApplicationServiceError},
};

use std::sync::Arc;

pub struct ApplicationServiceFactory;

impl ApplicationServiceFactory {
    /// Wires the job service to real processes, `pkill` and the runner's own environment.
    pub fn create(
        config: &AppConfig,
        shutdown: ShutdownReceiver,
    ) -> error_stack::Result<Arc<dyn ApplicationService>, ApplicationServiceError> {
        let app_service = ExtractionJobService::new(
            config,
            Arc::new(TokioProcessRunner),
            Arc::new(PkillReaper::default()),
            Arc::new(EnvSecretSource),
        )?
        .with_shutdown(shutdown);

        Ok(Arc::new(app_service))
    }
}
