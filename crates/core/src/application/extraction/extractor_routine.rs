use std::{fmt, path::PathBuf, sync::Arc};

use error_stack::{report, ResultExt};
use tracing::instrument;

use crate::{
    domain::{extractor::ExtractorSpec, run_context::RunContext},
    ports::{
        process_runner::{ProcessInvocation, ProcessRunner},
        routine::{Routine, RoutineError},
    },
};

/// One extractor run: the external program, the run context rendered for its worksheet, and
/// the runner that executes it. Only the exit status is observed.
pub struct ExtractorRoutine<'c> {
    spec: ExtractorSpec,
    context: &'c RunContext,
    default_working_dir: Option<PathBuf>,
    scrubbed_env: Vec<String>,
    runner: Arc<dyn ProcessRunner>,
}

impl<'c> fmt::Debug for ExtractorRoutine<'c> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRoutine")
            .field("name", &self.spec.name)
            .field("sheet_name", &self.spec.sheet_name)
            .finish()
    }
}

impl<'c> ExtractorRoutine<'c> {
    pub fn new(spec: ExtractorSpec, context: &'c RunContext, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            spec,
            context,
            default_working_dir: None,
            scrubbed_env: Vec::new(),
            runner,
        }
    }

    pub fn with_default_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.default_working_dir = dir;
        self
    }

    /// Names of runner variables (e.g. the raw service-account key) the extractor must not inherit.
    pub fn with_scrubbed_env(mut self, names: Vec<String>) -> Self {
        self.scrubbed_env = names;
        self
    }

    fn invocation(&self) -> ProcessInvocation {
        ProcessInvocation::new(self.spec.command.clone())
            .with_env(self.context.environment_for(&self.spec.sheet_name))
            .with_env_removed(self.scrubbed_env.clone())
            .with_working_dir(
                self.spec
                    .working_dir
                    .clone()
                    .or_else(|| self.default_working_dir.clone()),
            )
    }
}

#[async_trait::async_trait]
impl<'c> Routine for ExtractorRoutine<'c> {
    fn name(&self) -> &str {
        self.spec.name.as_str()
    }

    #[instrument(skip(self), name = "ExtractorRoutine::run", fields(extractor = %self.spec.name))]
    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        tracing::info!(
            "☁️  {}: extracting balances into '{}'",
            self.name(),
            self.spec.sheet_name
        );

        let exit = self
            .runner
            .run(&self.invocation())
            .await
            .change_context_lazy(|| {
                RoutineError::routine_failure(format!("could not run extractor '{}'", self.name()))
            })?;

        if !exit.success() {
            tracing::error!("❌ {}: exited with {:?}", self.name(), exit.code);
            return Err(report!(RoutineError::ProcessExited {
                exit_code: exit.code,
            })
            .attach_printable(format!("extractor: {}", self.name())));
        }

        tracing::info!("✅ {}: balances written to '{}'", self.name(), self.spec.sheet_name);
        Ok(())
    }
}
