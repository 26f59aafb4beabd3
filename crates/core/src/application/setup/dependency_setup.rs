use std::{fmt, sync::Arc};

use error_stack::{report, ResultExt};
use tracing::instrument;

use crate::{
    domain::extractor::CommandSpec,
    ports::{
        process_runner::{ProcessInvocation, ProcessRunner},
        routine::{Routine, RoutineError},
    },
};

/// Installs the extractors' third-party libraries. Runs before any secret touches the disk.
pub struct DependencySetupRoutine {
    commands: Vec<CommandSpec>,
    runner: Arc<dyn ProcessRunner>,
}

impl fmt::Debug for DependencySetupRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencySetupRoutine")
            .field("commands", &self.commands)
            .finish()
    }
}

impl DependencySetupRoutine {
    pub fn new(commands: Vec<CommandSpec>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { commands, runner }
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }
}

#[async_trait::async_trait]
impl Routine for DependencySetupRoutine {
    fn name(&self) -> &str {
        "dependencies"
    }

    #[instrument(skip(self), name = "DependencySetupRoutine::run")]
    async fn run(&self) -> error_stack::Result<(), RoutineError> {
        for (index, command) in self.commands.iter().enumerate() {
            tracing::info!(
                "📦 [{}/{}] {}",
                index + 1,
                self.commands.len(),
                command
            );

            let exit = self
                .runner
                .run(&ProcessInvocation::new(command.clone()))
                .await
                .change_context_lazy(|| {
                    RoutineError::routine_failure(format!("could not run '{}'", command))
                })?;

            if !exit.success() {
                tracing::error!("❌ '{}' exited with {:?}", command, exit.code);
                return Err(report!(RoutineError::ProcessExited {
                    exit_code: exit.code,
                })
                .attach_printable(format!("command: {}", command)));
            }
        }

        Ok(())
    }
}
