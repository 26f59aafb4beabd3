use balance_sync_core::application::scheduler::DailyScheduler;
use balance_sync_core::application::shutdown::ShutdownReceiver;
use balance_sync_core::domain::job::JobReport;
use balance_sync_core::ports::application_service::{ApplicationService, JobOptions};
use balance_sync_core::ports::command_handler::{
    Command, CommandError, CommandHandler, CommandOutput,
};
use error_stack::{report, ResultExt};
use std::sync::Arc;
use tracing::{error, info, instrument};

pub const USAGE: &str = "usage: balance-sync [run|run-extractor <name>|daemon] [--skip-setup]\n       \
                         balance-sync [list|health|next-run]";

pub struct CliAdapter {
    application_service: Arc<dyn ApplicationService>,
    shutdown: ShutdownReceiver,
}

impl std::fmt::Debug for CliAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliAdapter")
            .field("application_service", &"<ApplicationService>")
            .finish()
    }
}

impl CliAdapter {
    pub fn new(application_service: Arc<dyn ApplicationService>, shutdown: ShutdownReceiver) -> Self {
        Self {
            application_service,
            shutdown,
        }
    }

    #[instrument(skip(args))]
    pub async fn run(&self, args: Vec<String>) -> error_stack::Result<CommandOutput, CommandError> {
        let command = parse_args(&args).map_err(|e| report!(e).attach_printable(USAGE))?;

        match self.handle(command).await {
            Ok(output) => {
                if output.success {
                    info!("{}", output.message);
                } else {
                    error!("{}", output.message);
                }
                Ok(output)
            }
            Err(report) => {
                error!("Command failed: {:?}", report);
                Err(report)
            }
        }
    }

    fn job_output(report: JobReport) -> CommandOutput {
        if report.is_success() {
            CommandOutput::ok(report.to_string())
        } else {
            CommandOutput::failed(report.to_string())
        }
    }
}

pub fn parse_args(args: &[String]) -> Result<Command, CommandError> {
    let skip_setup = args.iter().skip(1).any(|arg| arg == "--skip-setup");
    let mut positional = args
        .iter()
        .skip(1)
        .filter(|arg| !arg.starts_with("--"))
        .map(String::as_str);

    if let Some(flag) = args
        .iter()
        .skip(1)
        .find(|arg| arg.starts_with("--") && arg.as_str() != "--skip-setup")
    {
        return Err(CommandError::InvalidCommand {
            details: format!("unknown flag '{}'", flag),
        });
    }

    match positional.next() {
        None | Some("run") => Ok(Command::RunJob { skip_setup }),
        Some("run-extractor") => {
            let name = positional
                .next()
                .ok_or_else(|| CommandError::InvalidCommand {
                    details: "Extractor name required".to_string(),
                })?
                .to_string();
            Ok(Command::RunExtractor { name, skip_setup })
        }
        Some("daemon") => Ok(Command::Daemon { skip_setup }),
        Some("list") => Ok(Command::ListSteps),
        Some("health") => Ok(Command::HealthCheck),
        Some("next-run") => Ok(Command::NextRun),
        Some(other) => Err(CommandError::InvalidCommand {
            details: format!("unknown command '{}'", other),
        }),
    }
}

#[async_trait::async_trait]
impl CommandHandler for CliAdapter {
    #[instrument]
    async fn handle(&self, command: Command) -> error_stack::Result<CommandOutput, CommandError> {
        match command {
            Command::RunJob { skip_setup } => {
                let report = self
                    .application_service
                    .run_job(JobOptions { skip_setup })
                    .await
                    .change_context(CommandError::ExecutionFailed {
                        details: "Failed to run job".to_string(),
                    })?;

                Ok(Self::job_output(report))
            }
            Command::RunExtractor { name, skip_setup } => {
                let report = self
                    .application_service
                    .run_extractor_by_name(&name, JobOptions { skip_setup })
                    .await
                    .change_context_lazy(|| CommandError::ExecutionFailed {
                        details: format!("Failed to run extractor {}", name),
                    })?;

                Ok(Self::job_output(report))
            }
            Command::Daemon { skip_setup } => {
                let runs = DailyScheduler::new(Arc::clone(&self.application_service))
                    .with_shutdown(self.shutdown.clone())
                    .run(JobOptions { skip_setup })
                    .await;

                Ok(CommandOutput::ok(format!(
                    "🛑 Daemon stopped after {} scheduled runs",
                    runs
                )))
            }
            Command::ListSteps => {
                let steps = self.application_service.list_steps().await;
                Ok(CommandOutput::ok(format!("Job steps:\n{}", steps.join("\n"))))
            }
            Command::HealthCheck => match self.application_service.health_check().await {
                Ok(health) => Ok(CommandOutput::ok(health)),
                Err(report) => Ok(CommandOutput::failed(format!(
                    "🔴 Balance Sync Runner - Unhealthy: {}",
                    report.current_context()
                ))),
            },
            Command::NextRun => {
                let next = self.application_service.schedule().next_after(chrono::Utc::now());
                Ok(CommandOutput::ok(next.to_rfc3339()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("balance-sync")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_defaults_to_run_job() {
        assert_eq!(
            parse_args(&args(&[])).unwrap(),
            Command::RunJob { skip_setup: false }
        );
        assert_eq!(
            parse_args(&args(&["run", "--skip-setup"])).unwrap(),
            Command::RunJob { skip_setup: true }
        );
    }

    #[test]
    fn test_run_extractor_requires_name() {
        assert_eq!(
            parse_args(&args(&["run-extractor", "bybit"])).unwrap(),
            Command::RunExtractor {
                name: "bybit".to_string(),
                skip_setup: false
            }
        );
        assert_eq!(
            parse_args(&args(&["run-extractor", "--skip-setup", "binance"])).unwrap(),
            Command::RunExtractor {
                name: "binance".to_string(),
                skip_setup: true
            }
        );
        assert!(matches!(
            parse_args(&args(&["run-extractor"])),
            Err(CommandError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(
            parse_args(&args(&["daemon"])).unwrap(),
            Command::Daemon { skip_setup: false }
        );
        assert_eq!(parse_args(&args(&["list"])).unwrap(), Command::ListSteps);
        assert_eq!(parse_args(&args(&["health"])).unwrap(), Command::HealthCheck);
        assert_eq!(parse_args(&args(&["next-run"])).unwrap(), Command::NextRun);
    }

    #[test]
    fn test_rejects_unknown_input() {
        assert!(matches!(
            parse_args(&args(&["deploy"])),
            Err(CommandError::InvalidCommand { .. })
        ));
        assert!(matches!(
            parse_args(&args(&["run", "--parallel"])),
            Err(CommandError::InvalidCommand { .. })
        ));
    }
}
