use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid command: {details}")]
    InvalidCommand { details: String },
    #[error("Command execution failed: {details}")]
    ExecutionFailed { details: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RunJob { skip_setup: bool },
    RunExtractor { name: String, skip_setup: bool },
    Daemon { skip_setup: bool },
    ListSteps,
    HealthCheck,
    NextRun,
}

/// What the binary should report once a command has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub message: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn ok<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: Command) -> error_stack::Result<CommandOutput, CommandError>;
}
