use std::{
    fmt,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use error_stack::{report, ResultExt};
use thiserror::Error;
use tracing::{error, info, instrument, Instrument};
use zeroize::Zeroizing;

use crate::{
    adapters::{
        config::{
            app_config::AppConfig,
            credentials_config::{CredentialsConfig, SecretsConfig},
        },
        credentials::credential_file::CredentialFile,
        sheets::auth::validate_service_account_key,
    },
    application::{
        cleanup::cleanup_routine::CleanupRoutine,
        extraction::extractor_routine::ExtractorRoutine,
        setup::dependency_setup::DependencySetupRoutine,
        shutdown::{wait_for_shutdown, ShutdownReceiver},
    },
    domain::{
        extractor::ExtractorSpec,
        job::{JobOutcome, JobReport, StepKind, StepReport, StepStatus},
        run_context::RunContext,
        schedule::DailySchedule,
    },
    ports::{
        application_service::{ApplicationService, ApplicationServiceError, JobOptions},
        process_reaper::ProcessReaper,
        process_runner::ProcessRunner,
        routine::Routine,
        secret_source::SecretSource,
    },
};

const CREDENTIAL_STEP: &str = "credential";

#[derive(Error, Debug)]
pub enum PreflightError {
    #[error("missing required secrets: {}", .names.join(", "))]
    MissingSecrets { names: Vec<String> },
}

/// Runs the extraction job: dependency setup, credential materialization, the extractors in
/// order (each gated on the previous one succeeding) and an unconditional cleanup.
pub struct ExtractionJobService {
    schedule: DailySchedule,
    timeout: Duration,
    working_dir: Option<PathBuf>,
    credentials: CredentialsConfig,
    secret_names: SecretsConfig,
    setup: DependencySetupRoutine,
    extractors: Vec<ExtractorSpec>,
    cleanup: CleanupRoutine,
    secrets: Arc<dyn SecretSource>,
    runner: Arc<dyn ProcessRunner>,
    shutdown: Option<ShutdownReceiver>,
}

impl fmt::Debug for ExtractionJobService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionJobService")
            .field("schedule", &self.schedule)
            .field("timeout", &self.timeout)
            .field("credentials", &self.credentials)
            .field(
                "extractors",
                &self
                    .extractors
                    .iter()
                    .map(|extractor| extractor.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Progress of one job, kept outside the pipeline future so a timeout or shutdown can still
/// report the interrupted step and hand the credential guard to cleanup.
#[derive(Default)]
struct PipelineState {
    steps: Vec<StepReport>,
    current: Option<(String, StepKind, Instant)>,
    credential: Option<CredentialFile>,
}

impl PipelineState {
    fn begin(&mut self, name: &str, kind: StepKind) {
        self.current = Some((name.to_string(), kind, Instant::now()));
    }

    fn finish(&mut self, status: StepStatus) {
        if let Some((name, kind, started)) = self.current.take() {
            self.steps.push(StepReport {
                name,
                kind,
                status,
                duration: started.elapsed(),
            });
        }
    }
}

impl ExtractionJobService {
    pub fn new(
        config: &AppConfig,
        runner: Arc<dyn ProcessRunner>,
        reaper: Arc<dyn ProcessReaper>,
        secrets: Arc<dyn SecretSource>,
    ) -> error_stack::Result<Self, ApplicationServiceError> {
        let schedule = config
            .schedule
            .schedule()
            .change_context(ApplicationServiceError::InitializationFailed {
                details: format!("invalid schedule '{}'", config.schedule.cron),
            })?;

        Ok(Self {
            schedule,
            timeout: Duration::from_secs(config.job.timeout_secs),
            working_dir: config.job.working_dir.clone(),
            credentials: config.credentials.clone(),
            secret_names: config.secrets.clone(),
            setup: DependencySetupRoutine::new(config.setup.commands.clone(), Arc::clone(&runner)),
            extractors: config.extractors.clone(),
            cleanup: CleanupRoutine::new(
                config.credentials.path.clone(),
                config.credentials.overwrite_passes,
                config.cleanup.process_patterns.clone(),
                reaper,
            ),
            secrets,
            runner,
            shutdown: None,
        })
    }

    /// A running job observing this receiver is cancelled (cleanup still runs) once it flips.
    pub fn with_shutdown(mut self, shutdown: ShutdownReceiver) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn missing_secrets(&self) -> Vec<String> {
        self.secret_names
            .required()
            .into_iter()
            .filter(|name| self.secrets.get_non_empty(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Resolves every secret the job needs before anything is spawned or written.
    fn preflight(
        &self,
    ) -> error_stack::Result<(RunContext, Zeroizing<String>), PreflightError> {
        let names = &self.secret_names;
        let credentials = self.secrets.get_non_empty(&names.credentials_env);
        let encryption_key = self.secrets.get_non_empty(&names.encryption_key_env);
        let sheet_id = self.secrets.get_non_empty(&names.sheet_id_env);

        match (credentials, encryption_key, sheet_id) {
            (Some(credentials), Some(encryption_key), Some(sheet_id)) => {
                let context = RunContext::new(
                    sheet_id.trim(),
                    Zeroizing::new(encryption_key.trim().to_string()),
                    self.credentials.path.clone(),
                )
                .with_proxies(
                    self.secrets
                        .get_non_empty(&names.proxy_http_env)
                        .map(|value| value.to_string()),
                    self.secrets
                        .get_non_empty(&names.proxy_https_env)
                        .map(|value| value.to_string()),
                );
                Ok((context, credentials))
            }
            _ => Err(report!(PreflightError::MissingSecrets {
                names: self.missing_secrets(),
            })),
        }
    }

    async fn run_step(
        &self,
        routine: &dyn Routine,
        kind: StepKind,
        state: &mut PipelineState,
    ) -> StepStatus {
        state.begin(routine.name(), kind);

        let result = routine
            .run()
            .instrument(tracing::info_span!("step", step = routine.name(), kind = %kind))
            .await;

        let status = match &result {
            Ok(()) => {
                info!("✅ {}: OK", routine.name());
                StepStatus::Succeeded
            }
            Err(report) => {
                error!("❌ {}: {:?}", routine.name(), report);
                StepStatus::Failed {
                    exit_code: report.current_context().exit_code(),
                }
            }
        };
        state.finish(status);
        status
    }

    async fn materialize_credential(&self, key: &[u8], state: &mut PipelineState) -> StepStatus {
        state.begin(CREDENTIAL_STEP, StepKind::Credential);
        let path = self.credentials.path.as_path();

        let status = match CredentialFile::materialize(path, key, self.credentials.overwrite_passes)
        {
            Ok(file) => {
                state.credential = Some(file);
                if self.credentials.validate {
                    match validate_service_account_key(path).await {
                        Ok(()) => StepStatus::Succeeded,
                        Err(report) => {
                            error!("❌ {}: {:?}", CREDENTIAL_STEP, report);
                            StepStatus::Failed { exit_code: None }
                        }
                    }
                } else {
                    StepStatus::Succeeded
                }
            }
            Err(report) => {
                error!("❌ {}: {:?}", CREDENTIAL_STEP, report);
                StepStatus::Failed { exit_code: None }
            }
        };

        if status.is_success() {
            info!("🔑 Credential materialized at {}", path.display());
        }
        state.finish(status);
        status
    }

    async fn run_pipeline(
        &self,
        context: &RunContext,
        key: &[u8],
        extractors: &[ExtractorSpec],
        options: JobOptions,
        state: &mut PipelineState,
    ) -> JobOutcome {
        if options.skip_setup {
            info!("⏭️  Skipping dependency setup");
        } else if !self
            .run_step(&self.setup, StepKind::Setup, state)
            .await
            .is_success()
        {
            return JobOutcome::SetupFailed;
        }

        if !self.materialize_credential(key, state).await.is_success() {
            return JobOutcome::CredentialFailed;
        }

        for extractor in extractors {
            let routine = ExtractorRoutine::new(extractor.clone(), context, Arc::clone(&self.runner))
                .with_default_working_dir(self.working_dir.clone())
                .with_scrubbed_env(vec![self.secret_names.credentials_env.clone()]);

            if !self
                .run_step(&routine, StepKind::Extractor, state)
                .await
                .is_success()
            {
                return JobOutcome::ExtractionFailed {
                    step: extractor.name.clone(),
                };
            }
        }

        JobOutcome::Succeeded
    }

    #[instrument(skip(self, extractors), fields(count = extractors.len()))]
    async fn execute(&self, extractors: &[ExtractorSpec], options: JobOptions) -> JobReport {
        let started_at = Utc::now();
        let mut state = PipelineState::default();

        let outcome = match self.preflight() {
            Err(report) => {
                error!("❌ Preflight: {:?}", report);
                JobOutcome::PreflightFailed {
                    details: report.current_context().to_string(),
                }
            }
            Ok((context, key)) => {
                let pipeline =
                    self.run_pipeline(&context, key.as_bytes(), extractors, options, &mut state);

                let interrupted = tokio::select! {
                    result = tokio::time::timeout(self.timeout, pipeline) => match result {
                        Ok(outcome) => Ok(outcome),
                        Err(_) => Err(StepStatus::TimedOut),
                    },
                    _ = wait_for_shutdown(self.shutdown.clone()) => Err(StepStatus::Cancelled),
                };

                match interrupted {
                    Ok(outcome) => outcome,
                    Err(status) => {
                        state.finish(status);
                        if status == StepStatus::TimedOut {
                            error!("⏰ Job exceeded its {:?} ceiling", self.timeout);
                            JobOutcome::TimedOut
                        } else {
                            error!("🛑 Job cancelled by shutdown request");
                            JobOutcome::Cancelled
                        }
                    }
                }
            }
        };

        for extractor in extractors {
            let reported = state
                .steps
                .iter()
                .any(|step| step.kind == StepKind::Extractor && step.name == extractor.name);
            if !reported {
                info!("⏭️  {}: skipped", extractor.name);
                state
                    .steps
                    .push(StepReport::skipped(extractor.name.clone(), StepKind::Extractor));
            }
        }

        let cleanup = self.cleanup.run(state.credential.take()).await;

        let report = JobReport {
            started_at,
            finished_at: Utc::now(),
            steps: state.steps,
            outcome,
            cleanup,
        };

        if report.is_success() {
            info!("✅ Job finished: {}", report.outcome);
        } else {
            error!("❌ Job finished: {}", report.outcome);
        }
        report
    }
}

#[async_trait::async_trait]
impl ApplicationService for ExtractionJobService {
    #[instrument(skip(self))]
    async fn run_job(
        &self,
        options: JobOptions,
    ) -> error_stack::Result<JobReport, ApplicationServiceError> {
        info!("Running {} extractors sequentially", self.extractors.len());
        Ok(self.execute(&self.extractors, options).await)
    }

    #[instrument(skip(self))]
    async fn run_extractor_by_name(
        &self,
        name: &str,
        options: JobOptions,
    ) -> error_stack::Result<JobReport, ApplicationServiceError> {
        let extractor = self
            .extractors
            .iter()
            .find(|extractor| extractor.name == name)
            .ok_or_else(|| {
                report!(ApplicationServiceError::UnknownExtractor {
                    name: name.to_string(),
                })
            })?;

        Ok(self
            .execute(std::slice::from_ref(extractor), options)
            .await)
    }

    async fn list_steps(&self) -> Vec<String> {
        let mut steps: Vec<String> = self
            .setup
            .commands()
            .iter()
            .map(|command| format!("setup: {}", command))
            .collect();
        steps.push(format!(
            "{}: {}",
            CREDENTIAL_STEP,
            self.credentials.path.display()
        ));
        steps.extend(self.extractors.iter().map(|extractor| {
            format!(
                "extractor: {} ({}) -> {}",
                extractor.name, extractor.command, extractor.sheet_name
            )
        }));
        steps.push("cleanup: shred credential, pkill lingering extractors".to_string());
        steps
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> error_stack::Result<String, ApplicationServiceError> {
        let missing = self.missing_secrets();
        if !missing.is_empty() {
            return Err(report!(ApplicationServiceError::Unhealthy {
                details: format!("missing required secrets: {}", missing.join(", ")),
            }));
        }

        Ok(format!(
            "🟢 Balance Sync Runner - Healthy\n\
             Schedule: {}\n\
             Next run: {}\n\
             Credential path: {}\n\
             Extractors: {}",
            self.schedule,
            self.schedule.next_after(Utc::now()).to_rfc3339(),
            self.credentials.path.display(),
            self.extractors
                .iter()
                .map(|extractor| extractor.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn schedule(&self) -> DailySchedule {
        self.schedule
    }
}
